//! Per-layer effect operations and the chain runner that applies them in order.

pub(crate) mod blur;
pub(crate) mod chain;
pub(crate) mod ops;
