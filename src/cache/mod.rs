//! Decoded-image and texture caches.
//!
//! Both caches keep entries in a generational arena and index them by a value key, so a
//! handle that outlives its entry resolves to nothing rather than to a recycled slot.

pub(crate) mod arena;
pub(crate) mod image_cache;
pub(crate) mod texture_cache;
