//! blitkit is a cache-backed 2D image blitting and compositing engine.
//!
//! Images are resolved through a [`DecoderRegistry`], kept open in an [`ImageCache`] and
//! composited onto a [`Surface`] by the software [`Renderer`], or onto a GPU target by a
//! [`GpuRenderer`] driving any [`GpuDriver`] implementation:
//!
//! - Build [`RendererOpts`] (or load them from JSON / the environment)
//! - Push masks into the [`MaskEngine`] to shape coverage
//! - Draw images and rectangles directly, or queue them on a [`Layer`]
//!
//! [`SoftGpu`] implements the driver contract in-process and is what the GPU path is tested
//! against.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub(crate) mod cache;
pub(crate) mod decode;
pub(crate) mod draw;
pub(crate) mod foundation;
pub(crate) mod gpu;
pub(crate) mod mask;
pub(crate) mod pixel;

pub use crate::foundation::area::Area;
pub use crate::foundation::config::RendererOpts;
pub use crate::foundation::core::{
    OPA_COVER, OPA_MAX, OPA_MIN, OPA_TRANSP, Opa, Point, RADIUS_CIRCLE, Rgba8, Rgba8Premul,
};
pub use crate::foundation::error::{BlitError, BlitResult, ErrorCode};

pub use crate::pixel::blend::{
    BlendMode, apply_mask_to_alpha, blend_pixel, blend_row, fill_row, recolor, recolor_row,
};
pub use crate::pixel::blend_word::{BlendEquation, BlendFactor, BlendWord};
pub use crate::pixel::format::{
    ColorFormat, ImageHeader, PixelBuffer, Sampling, unpack_row, yuv_to_rgba,
};

pub use crate::mask::angle::AngleMask;
pub use crate::mask::engine::{MASK_SLOTS, Mask, MaskEngine, MaskId, MaskResult, OpaMap};
pub use crate::mask::radius::RadiusMask;
pub use crate::mask::simple::{FadeMask, MapMask, RectMask};

pub use crate::decode::builtin::{
    BIN_HEADER_LEN, BIN_MAX_DIM, BuiltinDecoder, encode_bin_image, pack_bin_header,
    unpack_bin_header,
};
pub use crate::decode::codec::CodecDecoder;
pub use crate::decode::registry::{
    DecodedImage, DecoderId, DecoderRegistry, DecoderSession, ImageDecoder,
};
pub use crate::decode::source::{ImageSource, SourceId};

pub use crate::cache::arena::Handle;
pub use crate::cache::image_cache::{ImageCache, ImageCacheStats, ImageKey};
pub use crate::cache::texture_cache::{
    Evicted, FreeFn, ScratchTexture, TextureCache, TextureCacheStats, TextureFlags, TextureKey,
};

pub use crate::gpu::driver::{
    BlitParams, Fence, Flip, GpuDriver, RenderTargetGuard, TextureFormat, TextureId,
};
pub use crate::gpu::soft::{SoftGpu, SoftGpuStats};

pub use crate::draw::context::DrawContext;
pub use crate::draw::dsc::{BorderSide, DrawOutcome, ImageDrawDsc, RectDrawDsc, ZOOM_NONE};
pub use crate::draw::gpu_renderer::GpuRenderer;
pub use crate::draw::renderer::Renderer;
pub use crate::draw::surface::Surface;
pub use crate::draw::task::{DrawTask, Layer};
