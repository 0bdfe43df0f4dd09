use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::decode::source::ImageSource;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult};
use crate::pixel::format::{ImageHeader, PixelBuffer};

/// A pluggable image decoder.
///
/// `info` must be cheap and side-effect free. Returning [`BlitError::NoDecoder`] from
/// `info` means "not mine"; any other error means the source was recognized but is
/// unusable, which makes the registry report `DecodeOpenFailed` if nobody else opens it.
pub trait ImageDecoder: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Inspect the source and report its header.
    fn info(&self, src: &ImageSource) -> BlitResult<ImageHeader>;

    /// Prepare `session` for drawing. Either materialize `session.decoded` or leave it
    /// empty and serve rows through [`ImageDecoder::read_line`].
    fn open(&self, session: &mut DecoderSession) -> BlitResult<()>;

    /// Decode `len` pixels of row `y` starting at column `x` into RGBA8888 `out`.
    fn read_line(
        &self,
        _session: &mut DecoderSession,
        _x: u32,
        _y: u32,
        _len: u32,
        _out: &mut [u8],
    ) -> BlitResult<()> {
        Err(BlitError::read_line(format!(
            "decoder '{}' has no scanline reader",
            self.name()
        )))
    }

    /// Release decoder state held by `session`.
    fn close(&self, _session: &mut DecoderSession) {}
}

/// Headers with no pixels are unusable whatever the decoder claims.
fn non_empty(decoder: &str, header: ImageHeader) -> BlitResult<ImageHeader> {
    if header.width == 0 || header.height == 0 {
        return Err(BlitError::decode_open(format!(
            "decoder '{decoder}' reported an empty {}x{} image",
            header.width, header.height
        )));
    }
    Ok(header)
}

/// Index of a decoder in its registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecoderId(pub usize);

/// Pixels materialized by `open`.
#[derive(Clone, Debug)]
pub enum DecodedImage {
    /// The caller's buffer, used as-is.
    Shared(Arc<PixelBuffer>),
    /// A buffer produced by the decoder (palette expansion, YUV conversion, codec output).
    Owned(PixelBuffer),
}

impl DecodedImage {
    /// Borrow the pixels.
    pub fn buffer(&self) -> &PixelBuffer {
        match self {
            Self::Shared(b) => b,
            Self::Owned(b) => b,
        }
    }
}

/// State of one open image.
pub struct DecoderSession {
    /// Decoder that accepted the source; set by the registry.
    pub decoder: Option<DecoderId>,
    /// The source being decoded.
    pub src: ImageSource,
    /// Color used for alpha-only formats.
    pub color: Rgba8,
    /// Animation frame.
    pub frame_id: u32,
    /// Header reported by `info`.
    pub header: ImageHeader,
    /// Eagerly decoded pixels, if any.
    pub decoded: Option<DecodedImage>,
    /// Human-readable failure reason from the last failed attempt.
    pub error_msg: Option<String>,
    /// Time the decoder spent in `open`. Decoders may fill it in themselves.
    pub time_to_open: Option<Duration>,
    /// Decoder-private state (open file handle, codec context).
    pub user_data: Option<Box<dyn Any + Send>>,
}

impl DecoderSession {
    /// Fresh session with nothing decoded.
    pub fn new(src: ImageSource, color: Rgba8, frame_id: u32) -> Self {
        Self {
            decoder: None,
            src,
            color,
            frame_id,
            header: ImageHeader::default(),
            decoded: None,
            error_msg: None,
            time_to_open: None,
            user_data: None,
        }
    }

    /// Whether rows must be pulled through `read_line`.
    pub fn needs_read_line(&self) -> bool {
        self.decoded.is_none()
    }
}

impl std::fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderSession")
            .field("decoder", &self.decoder)
            .field("src", &self.src)
            .field("header", &self.header)
            .field("decoded", &self.decoded.is_some())
            .field("error_msg", &self.error_msg)
            .finish_non_exhaustive()
    }
}

/// Ordered list of decoders; the first one to recognize a source wins.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoders", &self.len())
            .finish()
    }
}

impl DecoderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in decoder followed by the codec decoder.
    pub fn with_builtin() -> Self {
        let mut r = Self::new();
        r.register(crate::decode::builtin::BuiltinDecoder);
        r.register(crate::decode::codec::CodecDecoder);
        r
    }

    /// Append a decoder. Later registrations have lower priority.
    pub fn register(&mut self, decoder: impl ImageDecoder + 'static) -> DecoderId {
        self.decoders.push(Box::new(decoder));
        DecoderId(self.decoders.len() - 1)
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no decoder is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Look up a decoder.
    pub fn decoder(&self, id: DecoderId) -> Option<&dyn ImageDecoder> {
        self.decoders.get(id.0).map(|d| d.as_ref())
    }

    /// Header from the first decoder that recognizes `src`.
    pub fn get_info(&self, src: &ImageSource) -> BlitResult<ImageHeader> {
        let mut last_err = None;
        for d in &self.decoders {
            match d.info(src).and_then(|h| non_empty(d.name(), h)) {
                Ok(h) => return Ok(h),
                Err(BlitError::NoDecoder(_)) => {}
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| BlitError::no_decoder(format!("{src}"))))
    }

    /// Open `src` with the first decoder that both recognizes and opens it.
    ///
    /// Every attempt starts from a fresh session so state from a failed decoder never
    /// reaches the next one.
    #[tracing::instrument(level = "debug", skip(self), fields(src = %src))]
    pub fn open(
        &self,
        src: &ImageSource,
        color: Rgba8,
        frame_id: u32,
    ) -> BlitResult<DecoderSession> {
        let mut failures: Vec<String> = Vec::new();
        for (idx, d) in self.decoders.iter().enumerate() {
            let header = match d.info(src).and_then(|h| non_empty(d.name(), h)) {
                Ok(h) => h,
                Err(BlitError::NoDecoder(_)) => continue,
                Err(e) => {
                    failures.push(format!("{}: {e}", d.name()));
                    continue;
                }
            };
            let mut session = DecoderSession::new(src.clone(), color, frame_id);
            session.header = header;
            match d.open(&mut session).and_then(|()| non_empty(d.name(), session.header)) {
                Ok(_) => {
                    session.decoder = Some(DecoderId(idx));
                    tracing::debug!(decoder = d.name(), "image opened");
                    return Ok(session);
                }
                Err(e) => {
                    d.close(&mut session);
                    tracing::debug!(decoder = d.name(), error = %e, "decoder rejected source");
                    failures.push(format!("{}: {e}", d.name()));
                }
            }
        }
        if failures.is_empty() {
            Err(BlitError::no_decoder(format!("{src}")))
        } else {
            Err(BlitError::decode_open(format!("{src}: {}", failures.join("; "))))
        }
    }

    /// Pull one row of a session that was not eagerly decoded.
    pub fn read_line(
        &self,
        session: &mut DecoderSession,
        x: u32,
        y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        if !session.needs_read_line() {
            return Err(BlitError::read_line("session is already decoded"));
        }
        let id = session
            .decoder
            .ok_or_else(|| BlitError::read_line("session is not open"))?;
        let d = self
            .decoder(id)
            .ok_or_else(|| BlitError::read_line(format!("unknown decoder {}", id.0)))?;
        let end = x.checked_add(len);
        if y >= u32::from(session.header.height)
            || end.is_none_or(|end| end > u32::from(session.header.width))
        {
            return Err(BlitError::read_line(format!(
                "span x={x} y={y} len={len} is outside {}x{}",
                session.header.width, session.header.height
            )));
        }
        d.read_line(session, x, y, len, out)
    }

    /// Tear down a session through its decoder.
    pub fn close(&self, session: &mut DecoderSession) {
        if let Some(id) = session.decoder.take()
            && let Some(d) = self.decoder(id)
        {
            d.close(session);
        }
        session.decoded = None;
        session.user_data = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/registry.rs"]
mod tests;
