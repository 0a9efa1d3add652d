//! Layer placement math.
//!
//! Layer transforms are expressed as model/view/projection matrices over a source quad; the blend
//! stage inverts the combined matrix to map destination pixels back to source texels.

pub(crate) mod layer;
pub(crate) mod orientation;
