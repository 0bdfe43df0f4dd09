//! GPU driver contract and an in-process software implementation of it.

pub(crate) mod driver;
pub(crate) mod soft;
