//! Timeline compilation: layer projection, track allocation and instruction building.

pub(crate) mod instructions;
pub(crate) mod tracks;
