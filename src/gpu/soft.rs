use std::collections::HashMap;

use crate::draw::surface::Surface;
use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, Rgba8};
use crate::foundation::error::{BlitError, BlitResult};
use crate::foundation::math::{lerp_u8, mul_div255_u8};
use crate::gpu::driver::{BlitParams, Fence, Flip, GpuDriver, TextureFormat, TextureId};
use crate::pixel::blend::blend_pixel;
use crate::pixel::blend_word::{BlendEquation, BlendFactor, BlendWord};

/// Counters kept by [`SoftGpu`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftGpuStats {
    /// Textures allocated.
    pub textures_created: u64,
    /// Textures released.
    pub textures_destroyed: u64,
    /// Upload calls.
    pub uploads: u64,
    /// Blit calls (plain and transformed).
    pub blits: u64,
    /// Fill calls.
    pub fills: u64,
}

struct SoftTexture {
    format: TextureFormat,
    pixels: Surface,
}

/// In-process implementation of [`GpuDriver`] that executes commands immediately.
///
/// `A8` textures are stored as white texels carrying the alpha. Stencil and LUT ops are
/// accepted and ignored.
pub struct SoftGpu {
    screen: Surface,
    textures: HashMap<TextureId, SoftTexture>,
    next_id: u64,
    target: Option<TextureId>,
    clip: Option<Area>,
    max_textures: Option<usize>,
    submitted: u64,
    stats: SoftGpuStats,
}

impl SoftGpu {
    /// Driver with a transparent `width x height` screen.
    pub fn new(width: u32, height: u32) -> BlitResult<Self> {
        Ok(Self {
            screen: Surface::new(width, height)?,
            textures: HashMap::new(),
            next_id: 1,
            target: None,
            clip: None,
            max_textures: None,
            submitted: 0,
            stats: SoftGpuStats::default(),
        })
    }

    /// Fail texture creation once `max` textures are alive.
    pub fn with_texture_limit(mut self, max: usize) -> Self {
        self.max_textures = Some(max);
        self
    }

    /// Screen pixels.
    pub fn screen(&self) -> &Surface {
        &self.screen
    }

    /// Pixels of a live texture.
    pub fn texture_pixels(&self, texture: TextureId) -> Option<&Surface> {
        self.textures.get(&texture).map(|t| &t.pixels)
    }

    /// Number of live textures.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Command counters.
    pub fn stats(&self) -> SoftGpuStats {
        self.stats
    }

    fn target_mut(&mut self) -> BlitResult<&mut Surface> {
        match self.target {
            None => Ok(&mut self.screen),
            Some(id) => self
                .textures
                .get_mut(&id)
                .map(|t| &mut t.pixels)
                .ok_or_else(|| BlitError::validation(format!("render target {id:?} is gone"))),
        }
    }

    /// Run `f` with the source texture and the current target borrowed together.
    fn with_source<R>(
        &mut self,
        texture: TextureId,
        f: impl FnOnce(Option<Area>, &Surface, &mut Surface) -> R,
    ) -> BlitResult<R> {
        if self.target == Some(texture) {
            return Err(BlitError::validation("cannot sample the current render target"));
        }
        let unknown = || BlitError::validation(format!("unknown texture {texture:?}"));
        let clip = self.clip;
        match self.target {
            None => {
                let src = self.textures.get(&texture).ok_or_else(unknown)?;
                Ok(f(clip, &src.pixels, &mut self.screen))
            }
            Some(id) => {
                let mut target = self.textures.remove(&id).ok_or_else(|| {
                    BlitError::validation(format!("render target {id:?} is gone"))
                })?;
                let out = match self.textures.get(&texture) {
                    Some(src) => Ok(f(clip, &src.pixels, &mut target.pixels)),
                    None => Err(unknown()),
                };
                self.textures.insert(id, target);
                out
            }
        }
    }
}

fn visible(clip: Option<Area>, target: &Surface, area: Area) -> Option<Area> {
    let vis = area.intersect(&target.area())?;
    match clip {
        Some(clip) => vis.intersect(&clip),
        None => Some(vis),
    }
}

impl GpuDriver for SoftGpu {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> BlitResult<TextureId> {
        if let Some(max) = self.max_textures
            && self.textures.len() >= max
        {
            return Err(BlitError::alloc(format!(
                "texture limit of {max} reached ({width}x{height})"
            )));
        }
        let pixels = Surface::new(width, height)?;
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(id, SoftTexture { format, pixels });
        self.stats.textures_created += 1;
        Ok(id)
    }

    fn upload(
        &mut self,
        texture: TextureId,
        region: Area,
        data: &[u8],
        stride: usize,
    ) -> BlitResult<()> {
        let tex = self
            .textures
            .get_mut(&texture)
            .ok_or_else(|| BlitError::validation(format!("unknown texture {texture:?}")))?;
        if !tex.pixels.area().contains(&region) {
            return Err(BlitError::validation("upload region exceeds the texture"));
        }
        let bpp = tex.format.bytes_per_pixel();
        let row_bytes = region.width() as usize * bpp;
        let rows = region.height() as usize;
        if stride < row_bytes || data.len() < stride * (rows - 1) + row_bytes {
            return Err(BlitError::validation("upload data is too short"));
        }
        for r in 0..rows {
            let src = &data[r * stride..r * stride + row_bytes];
            let y = region.y1 + r as i32;
            let dst = tex.pixels.span_mut(y, region.x1, region.x2);
            match tex.format {
                TextureFormat::Rgba8888 => dst.copy_from_slice(src),
                TextureFormat::A8 => {
                    for (d, &a) in dst.chunks_exact_mut(4).zip(src) {
                        d.copy_from_slice(&[255, 255, 255, a]);
                    }
                }
            }
        }
        self.stats.uploads += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            self.stats.textures_destroyed += 1;
            if self.target == Some(texture) {
                self.target = None;
            }
        }
    }

    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&texture)
            .map(|t| (t.pixels.width(), t.pixels.height()))
    }

    fn render_target(&self) -> Option<TextureId> {
        self.target
    }

    fn set_render_target(&mut self, target: Option<TextureId>) -> BlitResult<()> {
        if let Some(id) = target
            && !self.textures.contains_key(&id)
        {
            return Err(BlitError::validation(format!("unknown render target {id:?}")));
        }
        self.target = target;
        Ok(())
    }

    fn set_clip(&mut self, clip: Option<Area>) {
        self.clip = clip;
    }

    fn clear(&mut self, color: Rgba8) {
        if let Ok(t) = self.target_mut() {
            t.clear(color);
        }
    }

    fn fill(&mut self, area: Area, color: Rgba8, blend: BlendWord) -> BlitResult<()> {
        let clip = self.clip;
        let target = self.target_mut()?;
        if let Some(vis) = visible(clip, target, area) {
            for y in vis.y1..=vis.y2 {
                for px in target.span_mut(y, vis.x1, vis.x2).chunks_exact_mut(4) {
                    blend_texel(px, color, blend);
                }
            }
        }
        self.stats.fills += 1;
        Ok(())
    }

    fn blit(
        &mut self,
        texture: TextureId,
        src: Area,
        dst: Area,
        params: &BlitParams,
    ) -> BlitResult<()> {
        let params = *params;
        self.with_source(texture, |clip, tex, target| {
            let Some(vis) = visible(clip, target, dst) else {
                return;
            };
            let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));
            let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
            for y in vis.y1..=vis.y2 {
                let ry = ((2 * i64::from(y - dst.y1) + 1) * sh / (2 * dh)) as i32;
                let sy = if params.flip.vertical { src.y2 - ry } else { src.y1 + ry };
                for x in vis.x1..=vis.x2 {
                    let rx = ((2 * i64::from(x - dst.x1) + 1) * sw / (2 * dw)) as i32;
                    let sx = if params.flip.horizontal { src.x2 - rx } else { src.x1 + rx };
                    let texel = tex.pixel(sx, sy);
                    let px = target.span_mut(y, x, x);
                    shade_and_blend(px, texel, &params);
                }
            }
        })?;
        self.stats.blits += 1;
        Ok(())
    }

    fn blit_transformed(
        &mut self,
        texture: TextureId,
        matrix: kurbo::Affine,
        params: &BlitParams,
    ) -> BlitResult<()> {
        if matrix.determinant().abs() < 1e-9 {
            return Err(BlitError::NonInvertibleTransform);
        }
        let inv = matrix.inverse();
        let params = BlitParams {
            flip: Flip::NONE,
            ..*params
        };
        self.with_source(texture, |clip, tex, target| {
            let bounds =
                kurbo::Rect::new(0.0, 0.0, f64::from(tex.width()), f64::from(tex.height()));
            let bbox = matrix.transform_rect_bbox(bounds);
            let area = Area::new(
                bbox.x0.floor() as i32,
                bbox.y0.floor() as i32,
                bbox.x1.ceil() as i32 - 1,
                bbox.y1.ceil() as i32 - 1,
            );
            let Some(vis) = visible(clip, target, area) else {
                return;
            };
            for y in vis.y1..=vis.y2 {
                for x in vis.x1..=vis.x2 {
                    let p = inv * kurbo::Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                    let (sx, sy) = (p.x.floor(), p.y.floor());
                    if sx < 0.0
                        || sy < 0.0
                        || sx >= f64::from(tex.width())
                        || sy >= f64::from(tex.height())
                    {
                        continue;
                    }
                    let texel = tex.pixel(sx as i32, sy as i32);
                    shade_and_blend(target.span_mut(y, x, x), texel, &params);
                }
            }
        })?;
        self.stats.blits += 1;
        Ok(())
    }

    fn submit(&mut self) -> Fence {
        self.submitted += 1;
        Fence(self.submitted)
    }

    fn poll(&mut self, fence: Fence) -> bool {
        fence.0 <= self.submitted
    }

    fn wait(&mut self, _fence: Fence) {}
}

/// Apply the word's source-side ops to `texel`, then blend it into `dst`.
fn shade_and_blend(dst: &mut [u8], texel: Rgba8, params: &BlitParams) {
    let word = params.blend;
    let key = params.color_key;
    if word.has(BlendWord::SRC_CKEY) && same_rgb(texel, key) {
        return;
    }
    if word.has(BlendWord::DST_CKEY) {
        let hit = same_rgb(Rgba8::from_slice(dst), key);
        if hit == word.has(BlendWord::DST_CKEY_NEG) {
            return;
        }
    }

    let mut s = texel;
    if word.has(BlendWord::RECOLOR) {
        let k = params.color.a;
        s = Rgba8::new(
            lerp_u8(s.r, params.color.r, k),
            lerp_u8(s.g, params.color.g, k),
            lerp_u8(s.b, params.color.b, k),
            s.a,
        );
    }
    if word.has(BlendWord::MODULATE_RGB) {
        s.r = mul_div255_u8(u16::from(s.r), u16::from(params.color.r));
        s.g = mul_div255_u8(u16::from(s.g), u16::from(params.color.g));
        s.b = mul_div255_u8(u16::from(s.b), u16::from(params.color.b));
    }
    if word.has(BlendWord::FORCE_A) {
        s.a = params.alpha;
    } else if word.has(BlendWord::MODULATE_A) {
        s.a = mul_div255_u8(u16::from(s.a), u16::from(params.alpha));
    }
    if word.has(BlendWord::SRC_PREMULT) {
        let p = s.premultiply();
        s = Rgba8::new(p.r, p.g, p.b, p.a);
    }
    blend_texel(dst, s, word);
}

fn blend_texel(dst: &mut [u8], s: Rgba8, word: BlendWord) {
    let base =
        BlendWord::new(word.src_factor(), word.dst_factor(), 0).with_equation(word.equation());
    if let Some(mode) = base.mode() {
        blend_pixel(dst, s, OPA_COVER, mode);
        return;
    }
    if base == BlendWord::mask() {
        dst[3] = mul_div255_u8(u16::from(dst[3]), u16::from(s.a));
        return;
    }

    let d = Rgba8::from_slice(dst);
    let sv = s.to_array().map(|c| f32::from(c) / 255.0);
    let dv = d.to_array().map(|c| f32::from(c) / 255.0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let fs = factor(word.src_factor(), i, &sv, &dv);
        let fd = factor(word.dst_factor(), i, &sv, &dv);
        let v = match word.equation() {
            BlendEquation::Add => sv[i] * fs + dv[i] * fd,
            BlendEquation::ReverseSubtract => dv[i] * fd - sv[i] * fs,
        };
        out[i] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    dst.copy_from_slice(&out);
}

fn factor(f: BlendFactor, ch: usize, s: &[f32; 4], d: &[f32; 4]) -> f32 {
    match f {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::SrcColor => s[ch],
        BlendFactor::InvSrcColor => 1.0 - s[ch],
        BlendFactor::SrcAlpha => s[3],
        BlendFactor::InvSrcAlpha => 1.0 - s[3],
        BlendFactor::DstAlpha => d[3],
        BlendFactor::InvDstAlpha => 1.0 - d[3],
        BlendFactor::DstColor => d[ch],
        BlendFactor::InvDstColor => 1.0 - d[ch],
    }
}

fn same_rgb(a: Rgba8, b: Rgba8) -> bool {
    a.r == b.r && a.g == b.g && a.b == b.b
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/soft.rs"]
mod tests;
