//! Keyframed scalar curves keyed by property path.

pub(crate) mod ease;
pub(crate) mod keyframe;
