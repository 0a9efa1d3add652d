//! CPU render core.
//!
//! Frames are composed by [`compositor::render_frame`] from pooled RGBA8 premultiplied textures;
//! [`pipeline`] drives whole frame ranges, optionally on a rayon pool.

pub(crate) mod blend;
pub(crate) mod color;
pub(crate) mod compositor;
pub(crate) mod context;
pub(crate) mod pipeline;
pub(crate) mod pool;
pub(crate) mod texture;
