use super::*;
use crate::render::texture::PixelFormat;

#[test]
fn radius_0_copies_source() {
    let src = Texture::from_bytes(1, 2, PixelFormat::Rgba8Premul, vec![1, 2, 3, 4, 5, 6, 7, 8])
        .unwrap();
    let mut dst = Texture::new(1, 2, PixelFormat::Rgba8Premul).unwrap();
    gaussian_blur(&src, &mut dst, 0, 1.0).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn constant_image_is_unchanged() {
    let src = Texture::solid(4, 3, [10, 20, 30, 40]).unwrap();
    let mut dst = Texture::new(4, 3, PixelFormat::Rgba8Premul).unwrap();
    gaussian_blur(&src, &mut dst, 3, 2.0).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn single_pixel_energy_spreads_symmetrically() {
    let mut src = Texture::new(5, 5, PixelFormat::Rgba8Premul).unwrap();
    let center = (2 * 5 + 2) * 4;
    src.data_mut()[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    let mut dst = Texture::new(5, 5, PixelFormat::Rgba8Premul).unwrap();
    gaussian_blur(&src, &mut dst, 2, 1.0).unwrap();

    assert!(dst.pixel(2, 2)[3] < 255);
    assert!(dst.pixel(1, 2)[3] > 0);
    assert_eq!(dst.pixel(1, 2), dst.pixel(3, 2));
    assert_eq!(dst.pixel(2, 1), dst.pixel(2, 3));
}

#[test]
fn kernel_sums_to_one() {
    let k = gaussian_kernel_q16(7, 3.0).unwrap();
    assert_eq!(k.len(), 15);
    assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
}

#[test]
fn invalid_sigma_is_rejected() {
    assert!(gaussian_kernel_q16(2, 0.0).is_err());
    assert!(gaussian_kernel_q16(2, f32::NAN).is_err());
}

#[test]
fn mismatched_sizes_are_rejected() {
    let src = Texture::solid(2, 2, [0, 0, 0, 0]).unwrap();
    let mut dst = Texture::solid(3, 2, [0, 0, 0, 0]).unwrap();
    assert!(gaussian_blur(&src, &mut dst, 1, 1.0).is_err());
}
