use super::*;
use crate::animation::keyframe::Keyframe;
use crate::transform::layer::KEY_SCALE;

fn secs(s: i64) -> MediaTime {
    MediaTime::from_secs(s)
}

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::from_start_end(secs(start), secs(end)).unwrap()
}

fn ramp(key: &str, from: f64, to: f64) -> KeyframeAnimation {
    KeyframeAnimation::new(
        key,
        vec![Keyframe::new(secs(0), from), Keyframe::new(secs(4), to)],
    )
    .unwrap()
}

#[test]
fn state_at_resolves_opacity_transform_and_operations() {
    let layer = RenderLayer::effect(range(0, 4))
        .opacity(0.5)
        .animation(ramp(KEY_BLEND_OPACITY, 0.0, 1.0))
        .animation(ramp(KEY_SCALE, 1.0, 3.0))
        .operation(Operation::brightness(0.1));
    let st = layer.state_at(secs(1));
    assert!((st.blend_opacity - 0.25).abs() < 1e-6);
    assert!((st.transform.scale - 1.5).abs() < 1e-9);
    assert_eq!(st.operations, vec![OperationKind::Brightness { amount: 0.1 }]);
}

#[test]
fn state_at_clamps_animated_opacity() {
    let layer = RenderLayer::effect(range(0, 4)).animation(ramp(KEY_BLEND_OPACITY, 0.0, 4.0));
    assert_eq!(layer.state_at(secs(3)).blend_opacity, 1.0);
}

#[test]
fn state_is_a_pure_function_of_time() {
    let layer = RenderLayer::effect(range(0, 4)).animation(ramp(KEY_BLEND_OPACITY, 0.0, 1.0));
    let late = layer.state_at(secs(3));
    let early = layer.state_at(secs(1));
    assert_eq!(layer.state_at(secs(3)), late);
    assert_ne!(early, late);
}

#[test]
fn validate_rejects_bad_layers() {
    assert!(RenderLayer::effect(TimeRange::EMPTY).validate().is_err());
    assert!(RenderLayer::effect(range(0, 1)).opacity(1.5).validate().is_err());
    let unknown = RenderLayer::effect(range(0, 1)).animation(ramp("volume", 0.0, 1.0));
    assert!(unknown.validate().is_err());
}

#[test]
fn validate_recurses_into_groups() {
    let bad_member = RenderLayer::effect(range(0, 1)).opacity(-1.0).shared();
    let group = RenderLayer::group(range(0, 2), vec![bad_member]);
    assert!(group.validate().is_err());
}

#[test]
fn composition_duration_is_latest_end() {
    let mut comp = Composition::new(Size::new(4, 4), Fps::new(30, 1).unwrap());
    assert_eq!(comp.duration(), MediaTime::ZERO);
    comp.layers.push(RenderLayer::effect(range(2, 9)).shared());
    comp.layers.push(RenderLayer::effect(range(0, 5)).shared());
    assert_eq!(comp.duration(), secs(9));
    assert!(comp.validate().is_ok());
}

#[test]
fn composition_rejects_negative_start_and_empty_size() {
    let mut comp = Composition::new(Size::new(4, 4), Fps::new(30, 1).unwrap());
    comp.layers.push(
        RenderLayer::effect(TimeRange::new(secs(-1), secs(2)).unwrap()).shared(),
    );
    assert!(comp.validate().is_err());
    assert!(Composition::new(Size::new(0, 4), Fps::new(30, 1).unwrap())
        .validate()
        .is_err());
}
