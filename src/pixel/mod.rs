//! Pixel encodings, blend math and the packed GPU blend word.

pub(crate) mod blend;
pub(crate) mod blend_word;
pub(crate) mod format;
