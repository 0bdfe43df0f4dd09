use std::sync::Arc;

use crate::cache::arena::Handle;
use crate::cache::image_cache::ImageCache;
use crate::cache::texture_cache::{TextureCache, TextureFlags, TextureKey};
use crate::decode::registry::{DecoderId, DecoderRegistry, ImageDecoder};
use crate::decode::source::ImageSource;
use crate::foundation::config::RendererOpts;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult, ErrorCode};
use crate::mask::engine::MaskEngine;
use crate::pixel::blend::recolor_row;
use crate::pixel::format::{ImageHeader, try_alloc_bytes, unpack_row};

/// State shared by every draw call of one renderer: decoders, the image cache, fully
/// decoded pixels for transformed draws, active masks and the last recorded error.
///
/// Not synchronized; a renderer and its context belong to one thread at a time.
#[derive(Debug)]
pub struct DrawContext {
    decoders: DecoderRegistry,
    images: ImageCache,
    pixels: TextureCache<Arc<Vec<u8>>>,
    masks: MaskEngine,
    last_error: Option<ErrorCode>,
}

impl DrawContext {
    /// Context with the built-in and codec decoders registered.
    pub fn new(opts: &RendererOpts) -> Self {
        Self::with_registry(opts, DecoderRegistry::with_builtin())
    }

    /// Context using a caller-assembled decoder registry.
    pub fn with_registry(opts: &RendererOpts, decoders: DecoderRegistry) -> Self {
        Self {
            decoders,
            images: ImageCache::new(opts.image_cache_size),
            pixels: TextureCache::new(opts.image_cache_size, opts.max_tile_size),
            masks: MaskEngine::new(),
            last_error: None,
        }
    }

    /// Registered decoders.
    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Append a decoder; it is tried after those already registered.
    pub fn register_decoder(&mut self, decoder: impl ImageDecoder + 'static) -> DecoderId {
        self.decoders.register(decoder)
    }

    /// The image cache.
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Resize the image cache and the decoded pixel cache with it.
    pub fn set_image_cache_size(&mut self, capacity: usize) {
        self.images.set_size(&self.decoders, capacity);
        self.pixels.set_capacity(capacity);
    }

    /// Forget every cached decode of `src`. Call this after mutating an in-memory buffer.
    ///
    /// Returns the number of decoder sessions dropped.
    pub fn invalidate_src(&mut self, src: &ImageSource) -> usize {
        let id = src.id();
        self.pixels
            .remove_where(|k| matches!(k, TextureKey::Image { source, .. } if *source == id));
        self.images.invalidate_src(&self.decoders, src)
    }

    /// Drop every cached decode.
    pub fn clear_images(&mut self) {
        self.pixels.clear();
        self.images.clear(&self.decoders);
    }

    /// Number of images held fully decoded for transformed draws.
    pub fn decoded_images(&self) -> usize {
        self.pixels.len()
    }

    /// Active masks.
    pub fn masks(&self) -> &MaskEngine {
        &self.masks
    }

    /// Active masks, for adding and removing.
    pub fn masks_mut(&mut self) -> &mut MaskEngine {
        &mut self.masks
    }

    /// Code of the most recent failure, if any.
    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Return and clear the last error.
    pub fn take_last_error(&mut self) -> Option<ErrorCode> {
        self.last_error.take()
    }

    pub(crate) fn record(&mut self, err: &BlitError) -> ErrorCode {
        let code = err.code();
        self.last_error = Some(code);
        code
    }

    pub(crate) fn open_image(
        &mut self,
        src: &ImageSource,
        color: Rgba8,
        frame_id: u32,
    ) -> BlitResult<Handle> {
        self.images.open(&self.decoders, src, color, frame_id)
    }

    pub(crate) fn header(&self, h: Handle) -> BlitResult<ImageHeader> {
        self.images
            .get(h)
            .map(|s| s.header)
            .ok_or_else(|| BlitError::validation("image session is gone"))
    }

    /// Decode `len` pixels of row `y` from column `x` into RGBA8888, from the eager buffer
    /// when there is one and through the decoder otherwise.
    pub(crate) fn fetch_row(
        &mut self,
        h: Handle,
        x: u32,
        y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        let session = self
            .images
            .get(h)
            .ok_or_else(|| BlitError::read_line("image session is gone"))?;
        if let Some(decoded) = &session.decoded {
            let buf = decoded.buffer();
            return unpack_row(
                buf.color_format,
                buf.row(y)?,
                x,
                len,
                buf.palette(),
                session.color,
                out,
            );
        }
        self.images.read_line(&self.decoders, h, x, y, len, out)
    }

    /// Whole image as tightly packed RGBA8888, recolored when `recolor_opa > 0`.
    pub(crate) fn load_rgba(
        &mut self,
        h: Handle,
        recolor: Rgba8,
        recolor_opa: u8,
    ) -> BlitResult<Vec<u8>> {
        let header = self.header(h)?;
        if header.width == 0 || header.height == 0 {
            return Err(BlitError::validation("image has no pixels"));
        }
        let w = u32::from(header.width);
        let row_bytes = w as usize * 4;
        let mut data = try_alloc_bytes(row_bytes * usize::from(header.height))?;
        for (y, row) in data.chunks_exact_mut(row_bytes).enumerate() {
            self.fetch_row(h, 0, y as u32, w, row)?;
        }
        recolor_row(&mut data, recolor, recolor_opa);
        Ok(data)
    }

    /// Like [`DrawContext::load_rgba`], keeping the result for later draws of the same
    /// source, color, recolor and frame while the image cache is enabled.
    pub(crate) fn shared_rgba(
        &mut self,
        h: Handle,
        recolor: Rgba8,
        recolor_opa: u8,
    ) -> BlitResult<Arc<Vec<u8>>> {
        // The key has one color slot; it is the session color, so a different recolor
        // target bypasses the cache.
        let image = self
            .images
            .key_of(h)
            .filter(|k| self.pixels.capacity() > 0 && (recolor_opa == 0 || k.color == recolor));
        let Some(image) = image else {
            return self.load_rgba(h, recolor, recolor_opa).map(Arc::new);
        };
        let key = TextureKey::Image {
            source: image.source,
            color: image.color,
            recolor_opa,
            frame_id: image.frame_id,
        };
        if let Some(data) = self.pixels.get(&key) {
            return Ok(data);
        }
        let data = Arc::new(self.load_rgba(h, recolor, recolor_opa)?);
        self.pixels.put(key, data.clone(), TextureFlags::MANAGED);
        Ok(data)
    }

    /// Release a session that the cache did not keep.
    pub(crate) fn finish_image(&mut self, h: Handle) {
        if self.images.capacity() == 0 {
            self.images.release(&self.decoders, h);
        }
    }
}
