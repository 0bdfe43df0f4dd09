//! Opacity masks sampled per scanline and combined by multiplication.

pub(crate) mod angle;
pub(crate) mod engine;
pub(crate) mod radius;
pub(crate) mod simple;
