use super::*;
use kurbo::Point;

#[test]
fn identity_keeps_size() {
    let o = normalize_orientation(Affine::IDENTITY, Size::new(6, 4));
    assert!(o.is_identity());
    assert_eq!(o.size, Size::new(6, 4));
}

#[test]
fn quarter_turn_swaps_dimensions() {
    // Typical portrait phone capture: rotate 90 degrees then shift right by the height.
    let preferred = Affine::new([0.0, 1.0, -1.0, 0.0, 4.0, 0.0]);
    let o = normalize_orientation(preferred, Size::new(6, 4));
    assert_eq!(o.size, Size::new(4, 6));
    // Top-left of the stored frame lands in the top-right corner.
    let p = o.to_output * Point::new(0.0, 0.0);
    assert!((p.x - 4.0).abs() < 1e-9 && p.y.abs() < 1e-9);
}

#[test]
fn translation_is_recomputed_from_the_bounding_box() {
    // Same rotation with a bogus translation still lands inside the output.
    let preferred = Affine::new([0.0, 1.0, -1.0, 0.0, 123.0, -7.0]);
    let o = normalize_orientation(preferred, Size::new(6, 4));
    let corner = o.to_output * Point::new(6.0, 4.0);
    assert!(corner.x.abs() < 1e-9 && (corner.y - 6.0).abs() < 1e-9);
}

#[test]
fn half_turn_keeps_dimensions_and_flips() {
    let preferred = Affine::new([-1.0, 0.0, 0.0, -1.0, 6.0, 4.0]);
    let o = normalize_orientation(preferred, Size::new(6, 4));
    assert_eq!(o.size, Size::new(6, 4));
    let p = o.to_natural() * Point::new(0.5, 0.5);
    assert!((p.x - 5.5).abs() < 1e-9 && (p.y - 3.5).abs() < 1e-9);
}

#[test]
fn near_axis_values_snap() {
    let preferred = Affine::new([1e-9, 0.999_999, -1.000_001, 0.0, 0.0, 0.0]);
    let o = normalize_orientation(preferred, Size::new(2, 8));
    assert_eq!(o.size, Size::new(8, 2));
}

#[test]
fn singular_transform_falls_back_to_identity() {
    let o = normalize_orientation(Affine::scale(0.0), Size::new(3, 5));
    assert!(o.is_identity());
    assert_eq!(o.size, Size::new(3, 5));
}
