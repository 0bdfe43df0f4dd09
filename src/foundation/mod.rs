//! Shared primitives: areas, colors, errors, configuration and small integer math.

pub(crate) mod area;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
