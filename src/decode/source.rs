use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::math::Fnv1a64;
use crate::pixel::format::PixelBuffer;

/// Where an image comes from.
///
/// In-memory buffers are shared through `Arc`; the library never frees them, it only
/// drops its own clones. Identity of a memory source is the buffer's address, which
/// stays unique for as long as any clone (for example a cache entry) is alive.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Image file on disk.
    File(PathBuf),
    /// Caller-constructed pixel buffer.
    Memory(Arc<PixelBuffer>),
    /// Symbolic glyph reference (icon font symbol).
    Symbol(String),
}

impl ImageSource {
    /// File source.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Memory source; wraps the buffer in a fresh `Arc`.
    pub fn memory(buf: PixelBuffer) -> Self {
        Self::Memory(Arc::new(buf))
    }

    /// Symbol source.
    pub fn symbol(text: impl Into<String>) -> Self {
        Self::Symbol(text.into())
    }

    /// Content-addressed identity used by the caches.
    pub fn id(&self) -> SourceId {
        let mut h = Fnv1a64::new_default();
        match self {
            Self::File(p) => {
                h.write_u8(b'F');
                h.write_bytes(p.as_os_str().as_encoded_bytes());
            }
            Self::Memory(buf) => {
                h.write_u8(b'M');
                h.write_u64(Arc::as_ptr(buf) as usize as u64);
            }
            Self::Symbol(s) => {
                h.write_u8(b'S');
                h.write_bytes(s.as_bytes());
            }
        }
        SourceId(h.finish())
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) => write!(f, "file '{}'", p.display()),
            Self::Memory(buf) => write!(
                f,
                "memory {}x{} {:?}",
                buf.width, buf.height, buf.color_format
            ),
            Self::Symbol(s) => write!(f, "symbol '{s}'"),
        }
    }
}

/// Stable identity of an [`ImageSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

#[cfg(test)]
#[path = "../../tests/unit/decode/source.rs"]
mod tests;
