//! Timeline model: layers, sources and the composition that owns them.

pub(crate) mod dsl;
pub(crate) mod model;
pub(crate) mod source;
