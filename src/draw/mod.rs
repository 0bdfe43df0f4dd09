//! Draw descriptors, the software and GPU compositors, and the deferred task queue.

pub(crate) mod blur;
pub(crate) mod context;
pub(crate) mod dsc;
pub(crate) mod gpu_renderer;
pub(crate) mod label;
pub(crate) mod ninepatch;
pub(crate) mod renderer;
pub(crate) mod shape;
pub(crate) mod surface;
pub(crate) mod task;
pub(crate) mod transform;
