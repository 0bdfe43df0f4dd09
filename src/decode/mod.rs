//! Image sources and the decoder registry.
//!
//! Decoders are tried in registration order. The built-in decoder handles pixel buffers and
//! `.bin` files; the codec decoder handles encoded formats through the `image` crate.

pub(crate) mod builtin;
pub(crate) mod codec;
pub(crate) mod registry;
pub(crate) mod source;
