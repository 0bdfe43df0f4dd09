use std::ops::{Deref, DerefMut};

use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, Opa, Rgba8};
use crate::foundation::error::BlitResult;
use crate::pixel::blend_word::BlendWord;

/// Opaque texture handle issued by a [`GpuDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Texel layouts every driver must accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Straight-alpha `R, G, B, A`.
    Rgba8888,
    /// Alpha only; sampled as white with that alpha.
    A8,
}

impl TextureFormat {
    /// Bytes per texel in uploads.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 => 4,
            Self::A8 => 1,
        }
    }
}

/// Mirroring applied while sampling the source rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flip {
    /// Mirror left-right.
    pub horizontal: bool,
    /// Mirror top-bottom.
    pub vertical: bool,
}

impl Flip {
    /// No mirroring.
    pub const NONE: Self = Self {
        horizontal: false,
        vertical: false,
    };
    /// Left-right.
    pub const H: Self = Self {
        horizontal: true,
        vertical: false,
    };
    /// Top-bottom.
    pub const V: Self = Self {
        horizontal: false,
        vertical: true,
    };
    /// Both axes.
    pub const HV: Self = Self {
        horizontal: true,
        vertical: true,
    };
}

/// Per-blit state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitParams {
    /// Factors, equation and extra ops.
    pub blend: BlendWord,
    /// Constant color for `MODULATE_RGB` and `RECOLOR`; its alpha is the recolor strength.
    pub color: Rgba8,
    /// Constant alpha for `MODULATE_A` and `FORCE_A`.
    pub alpha: Opa,
    /// Mirroring.
    pub flip: Flip,
    /// Key color for `SRC_CKEY` / `DST_CKEY`.
    pub color_key: Rgba8,
}

impl Default for BlitParams {
    fn default() -> Self {
        Self {
            blend: BlendWord::src_over(),
            color: Rgba8::WHITE,
            alpha: OPA_COVER,
            flip: Flip::NONE,
            color_key: Rgba8::TRANSPARENT,
        }
    }
}

/// Completion marker for submitted command batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fence(pub u64);

/// Function-call boundary to a hardware (or emulated) blitter.
///
/// Textures start out fully transparent. `None` as a render target means the screen.
pub trait GpuDriver {
    /// Allocate a texture; fails with `AllocationFailed` when out of memory.
    fn create_texture(&mut self, width: u32, height: u32, format: TextureFormat)
    -> BlitResult<TextureId>;

    /// Copy `data` (rows `stride` bytes apart, in the texture's format) into `region`.
    fn upload(&mut self, texture: TextureId, region: Area, data: &[u8], stride: usize)
    -> BlitResult<()>;

    /// Release a texture. Unknown ids are ignored.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Size of a live texture.
    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)>;

    /// Current render target.
    fn render_target(&self) -> Option<TextureId>;

    /// Redirect drawing; `None` selects the screen.
    fn set_render_target(&mut self, target: Option<TextureId>) -> BlitResult<()>;

    /// Restrict drawing to `clip` on the current target; `None` removes the clip.
    fn set_clip(&mut self, clip: Option<Area>);

    /// Overwrite the whole current target (ignoring the clip) with `color`.
    fn clear(&mut self, color: Rgba8);

    /// Blend a solid rectangle into the current target.
    fn fill(&mut self, area: Area, color: Rgba8, blend: BlendWord) -> BlitResult<()>;

    /// Blit `src` (texture coordinates) onto `dst` (target coordinates), scaling when the
    /// sizes differ.
    fn blit(&mut self, texture: TextureId, src: Area, dst: Area, params: &BlitParams)
    -> BlitResult<()>;

    /// Blit the whole texture through `matrix` (texture space to target space).
    fn blit_transformed(
        &mut self,
        texture: TextureId,
        matrix: kurbo::Affine,
        params: &BlitParams,
    ) -> BlitResult<()>;

    /// Close the current command batch.
    fn submit(&mut self) -> Fence;

    /// `true` once the batch behind `fence` has completed.
    fn poll(&mut self, fence: Fence) -> bool;

    /// Block until the batch behind `fence` has completed.
    fn wait(&mut self, fence: Fence);
}

/// Scoped render-target switch; the previous target is restored on drop.
pub struct RenderTargetGuard<'a, D: GpuDriver + ?Sized> {
    driver: &'a mut D,
    previous: Option<TextureId>,
}

impl<'a, D: GpuDriver + ?Sized> RenderTargetGuard<'a, D> {
    /// Switch to `target`, remembering the current one.
    pub fn acquire(driver: &'a mut D, target: Option<TextureId>) -> BlitResult<Self> {
        let previous = driver.render_target();
        driver.set_render_target(target)?;
        Ok(Self { driver, previous })
    }
}

impl<D: GpuDriver + ?Sized> Deref for RenderTargetGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.driver
    }
}

impl<D: GpuDriver + ?Sized> DerefMut for RenderTargetGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.driver
    }
}

impl<D: GpuDriver + ?Sized> Drop for RenderTargetGuard<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.driver.set_render_target(self.previous) {
            tracing::warn!(error = %err, "failed to restore render target");
        }
    }
}
