use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cache::arena::Handle;
use crate::cache::texture_cache::{TextureCache, TextureCacheStats, TextureFlags};
use crate::decode::registry::DecoderRegistry;
use crate::decode::source::ImageSource;
use crate::draw::context::DrawContext;
use crate::draw::dsc::{DrawOutcome, ImageDrawDsc, RectDrawDsc};
use crate::draw::label::{FALLBACK_LABEL, LABEL_COLOR, label_runs};
use crate::draw::shape::{Coverage, PartLayer, ShapeSpec, rect_parts};
use crate::draw::surface::Surface;
use crate::draw::transform::{RgbaView, checked_inverse, image_matrix, transformed_area};
use crate::foundation::area::Area;
use crate::foundation::config::RendererOpts;
use crate::foundation::core::{OPA_COVER, OPA_MIN, Opa, Point, Rgba8};
use crate::foundation::error::{BlitResult, ErrorCode};
use crate::foundation::math::mul_div255_u8;
use crate::mask::engine::{MaskEngine, MaskResult, OpaMap, classify};
use crate::mask::radius::RadiusMask;
use crate::pixel::blend::{BlendMode, apply_mask_to_alpha, blend_row, fill_row, recolor_row};
use crate::pixel::format::{ImageHeader, Sampling, try_alloc_bytes};

/// Software compositor drawing into a [`Surface`].
///
/// Rounded shapes large enough for nine-patch decomposition share baked corner fragments
/// through a [`TextureCache`] of coverage maps.
#[derive(Debug)]
pub struct Renderer {
    ctx: DrawContext,
    opts: RendererOpts,
    fragments: TextureCache<Arc<OpaMap>>,
    clip: Option<Area>,
}

impl Renderer {
    /// Renderer with the built-in decoders.
    pub fn new(opts: RendererOpts) -> BlitResult<Self> {
        Self::with_registry(opts, DecoderRegistry::with_builtin())
    }

    /// Renderer with a caller-assembled decoder registry.
    pub fn with_registry(opts: RendererOpts, decoders: DecoderRegistry) -> BlitResult<Self> {
        opts.validate()?;
        Ok(Self {
            ctx: DrawContext::with_registry(&opts, decoders),
            fragments: TextureCache::new(opts.texture_cache_capacity, opts.max_tile_size),
            opts,
            clip: None,
        })
    }

    /// Options the renderer was built with.
    pub fn opts(&self) -> &RendererOpts {
        &self.opts
    }

    /// Shared decoder/cache/mask state.
    pub fn context(&self) -> &DrawContext {
        &self.ctx
    }

    /// Mutable shared state, for masks and cache control.
    pub fn context_mut(&mut self) -> &mut DrawContext {
        &mut self.ctx
    }

    /// Restrict drawing to `clip` (in target coordinates); `None` allows the whole target.
    pub fn set_clip(&mut self, clip: Option<Area>) {
        self.clip = clip;
    }

    /// Current clip.
    pub fn clip(&self) -> Option<Area> {
        self.clip
    }

    /// Counters of the corner fragment cache.
    pub fn fragment_stats(&self) -> TextureCacheStats {
        self.fragments.stats()
    }

    /// Drop every baked fragment.
    pub fn clear_fragments(&mut self) {
        self.fragments.clear();
    }

    fn view(&self, target: &Surface) -> Option<Area> {
        let full = target.area();
        match self.clip {
            Some(c) => full.intersect(&c),
            None => Some(full),
        }
    }

    /// Draw `src` with its top-left at `coords.x1, coords.y1`.
    ///
    /// Untransformed images keep their natural size and are clipped to `coords`. Rotated or
    /// zoomed images cover their transformed bounding box, clipped only by the renderer's
    /// clip. A source that cannot be opened is replaced by a white box labelled "No data".
    #[tracing::instrument(level = "trace", skip(self, target, src, dsc), fields(src = %src))]
    pub fn draw_image(
        &mut self,
        target: &mut Surface,
        coords: Area,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> DrawOutcome {
        if dsc.opa <= OPA_MIN || dsc.zoom == 0 {
            return DrawOutcome::Invisible;
        }
        let Some(view) = self.view(target) else {
            return DrawOutcome::Invisible;
        };
        if !dsc.has_transform() && coords.intersect(&view).is_none() {
            return DrawOutcome::Invisible;
        }

        let h = match self.ctx.open_image(src, dsc.recolor, dsc.frame_id) {
            Ok(h) => h,
            Err(err) => {
                self.ctx.record(&err);
                warn!(src = %src, error = %err, "image unavailable, drawing fallback box");
                if let Some(area) = coords.intersect(&view) {
                    self.fill_plain(target, area, Rgba8::WHITE, dsc.opa);
                    for run in label_runs(FALLBACK_LABEL, coords, area) {
                        self.fill_plain(target, run, LABEL_COLOR, dsc.opa);
                    }
                }
                return DrawOutcome::Fallback(err.to_string());
            }
        };

        let result = self.draw_opened(target, view, coords, h, dsc);
        self.ctx.finish_image(h);
        match result {
            Ok(true) => DrawOutcome::Drawn,
            Ok(false) => DrawOutcome::Invisible,
            Err(err) => {
                let code = self.ctx.record(&err);
                warn!(src = %src, error = %err, "image draw failed");
                if code == ErrorCode::ReadLineFailed {
                    DrawOutcome::Degraded(code)
                } else {
                    DrawOutcome::Abandoned(code)
                }
            }
        }
    }

    fn draw_opened(
        &mut self,
        target: &mut Surface,
        view: Area,
        coords: Area,
        h: Handle,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<bool> {
        let header = self.ctx.header(h)?;
        if dsc.has_transform() {
            return self.draw_transformed(target, view, coords, h, header, dsc);
        }

        let img_area = Area::from_size(
            coords.x1,
            coords.y1,
            i32::from(header.width),
            i32::from(header.height),
        );
        let Some(area) = img_area
            .intersect(&coords)
            .and_then(|a| a.intersect(&view))
        else {
            return Ok(false);
        };
        trace!(?area, "image area");

        let coverage = if dsc.radius > 0 {
            Some(self.coverage_for(&ShapeSpec::fill(img_area, dsc.radius))?)
        } else {
            None
        };

        let len = area.width() as usize;
        let mut mask = try_alloc_bytes(len)?;
        let mut scratch = try_alloc_bytes(len)?;
        let mut px = try_alloc_bytes(len * 4)?;
        let mut any = false;
        for y in area.y1..=area.y2 {
            let res = row_cover(
                self.ctx.masks(),
                coverage.as_ref(),
                &mut mask,
                &mut scratch,
                area.x1,
                y,
            );
            if res == MaskResult::Transparent {
                continue;
            }
            self.ctx.fetch_row(
                h,
                (area.x1 - img_area.x1) as u32,
                (y - img_area.y1) as u32,
                len as u32,
                &mut px,
            )?;
            recolor_row(&mut px, dsc.recolor, dsc.recolor_opa);
            let m = (res != MaskResult::FullCover).then_some(&mask[..]);
            blend_row(target.span_mut(y, area.x1, area.x2), &px, m, dsc.opa, dsc.blend_mode);
            any = true;
        }
        Ok(any)
    }

    fn draw_transformed(
        &mut self,
        target: &mut Surface,
        view: Area,
        coords: Area,
        h: Handle,
        header: ImageHeader,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<bool> {
        let w = u32::from(header.width);
        let ht = u32::from(header.height);
        let m = image_matrix(Point::new(coords.x1, coords.y1), w, ht, dsc);
        let Some(area) = transformed_area(m, w, ht).intersect(&view) else {
            return Ok(false);
        };
        let inv = checked_inverse(m)?;
        trace!(?area, angle = dsc.angle, zoom = dsc.zoom, "transformed image area");

        let pixels = self.ctx.shared_rgba(h, dsc.recolor, dsc.recolor_opa)?;
        let img = RgbaView {
            width: w,
            height: ht,
            data: &pixels,
        };
        let sampling = if dsc.antialias {
            Sampling::Bilinear
        } else {
            Sampling::Nearest
        };
        let corners = (dsc.radius > 0)
            .then(|| RadiusMask::new(Area::from_size(0, 0, w as i32, ht as i32), dsc.radius, true));

        let len = area.width() as usize;
        let mut mask = try_alloc_bytes(len)?;
        let mut px = try_alloc_bytes(len * 4)?;
        let mut any = false;
        for y in area.y1..=area.y2 {
            let res = self.ctx.masks().apply(&mut mask, area.x1, y);
            if res == MaskResult::Transparent {
                continue;
            }
            for (i, out) in px.chunks_exact_mut(4).enumerate() {
                let p = inv
                    * kurbo::Point::new(f64::from(area.x1 + i as i32) + 0.5, f64::from(y) + 0.5);
                let mut c = img.sample(p.x, p.y, sampling);
                if let Some(rm) = &corners {
                    let cov = rm.coverage(p.x.floor() as i32, p.y.floor() as i32);
                    c.a = mul_div255_u8(u16::from(c.a), u16::from(cov));
                }
                out.copy_from_slice(&c.to_array());
            }
            let m = (res != MaskResult::FullCover).then_some(&mask[..]);
            blend_row(target.span_mut(y, area.x1, area.x2), &px, m, dsc.opa, dsc.blend_mode);
            any = true;
        }
        Ok(any)
    }

    /// Draw a rectangle: shadow, then background, then border, then outline.
    ///
    /// A failed decorative part is skipped and reported as [`DrawOutcome::Degraded`]; a
    /// failed background abandons the draw.
    #[tracing::instrument(level = "trace", skip(self, target, dsc))]
    pub fn draw_rect(
        &mut self,
        target: &mut Surface,
        coords: Area,
        dsc: &RectDrawDsc,
    ) -> DrawOutcome {
        let Some(view) = self.view(target) else {
            return DrawOutcome::Invisible;
        };
        let mut outcome = DrawOutcome::Invisible;
        let mut degraded = None;
        for part in rect_parts(coords, dsc) {
            match self.fill_shape(target, view, &part.shape, part.color, part.opa, dsc.blend_mode) {
                Ok(true) => outcome = DrawOutcome::Drawn,
                Ok(false) => {}
                Err(err) => {
                    let code = self.ctx.record(&err);
                    if part.layer == PartLayer::Background {
                        warn!(error = %err, "rect background failed, abandoning draw");
                        return DrawOutcome::Abandoned(code);
                    }
                    warn!(layer = ?part.layer, error = %err, "skipping rect part");
                    degraded = Some(code);
                }
            }
        }
        match degraded {
            Some(code) => DrawOutcome::Degraded(code),
            None => outcome,
        }
    }

    /// Multiply the alpha of `target` by a rounded-rect coverage of `area` and clear every
    /// pixel outside it, within the clip.
    #[tracing::instrument(level = "trace", skip(self, target))]
    pub fn mask_rect(&mut self, target: &mut Surface, area: Area, radius: i32) -> DrawOutcome {
        let Some(view) = self.view(target) else {
            return DrawOutcome::Invisible;
        };
        match self.mask_rect_inner(target, view, area, radius) {
            Ok(()) => DrawOutcome::Drawn,
            Err(err) => {
                let code = self.ctx.record(&err);
                warn!(error = %err, "mask rect failed");
                DrawOutcome::Abandoned(code)
            }
        }
    }

    fn mask_rect_inner(
        &mut self,
        target: &mut Surface,
        view: Area,
        area: Area,
        radius: i32,
    ) -> BlitResult<()> {
        let coverage = self.coverage_for(&ShapeSpec::fill(area, radius))?;
        let len = view.width() as usize;
        let mut mask = try_alloc_bytes(len)?;
        let mut scratch = try_alloc_bytes(len)?;
        for y in view.y1..=view.y2 {
            mask.fill(OPA_COVER);
            coverage.mul_row(&mut mask, &mut scratch, view.x1, y);
            apply_mask_to_alpha(target.span_mut(y, view.x1, view.x2), &mask);
        }
        Ok(())
    }

    fn fill_shape(
        &mut self,
        target: &mut Surface,
        view: Area,
        shape: &ShapeSpec,
        color: Rgba8,
        opa: Opa,
        mode: BlendMode,
    ) -> BlitResult<bool> {
        let Some(area) = shape.bounds().intersect(&view) else {
            return Ok(false);
        };
        let coverage = self.coverage_for(shape)?;
        let len = area.width() as usize;
        let mut mask = try_alloc_bytes(len)?;
        let mut scratch = try_alloc_bytes(len)?;
        let mut any = false;
        for y in area.y1..=area.y2 {
            let res = row_cover(
                self.ctx.masks(),
                Some(&coverage),
                &mut mask,
                &mut scratch,
                area.x1,
                y,
            );
            if res == MaskResult::Transparent {
                continue;
            }
            let m = (res != MaskResult::FullCover).then_some(&mask[..]);
            fill_row(target.span_mut(y, area.x1, area.x2), color, m, opa, mode);
            any = true;
        }
        Ok(any)
    }

    /// Solid fill honouring the active masks, for the fallback box and its label.
    fn fill_plain(&self, target: &mut Surface, area: Area, color: Rgba8, opa: Opa) {
        let len = area.width() as usize;
        let (Ok(mut mask), Ok(mut scratch)) = (try_alloc_bytes(len), try_alloc_bytes(len)) else {
            return;
        };
        for y in area.y1..=area.y2 {
            let res = row_cover(self.ctx.masks(), None, &mut mask, &mut scratch, area.x1, y);
            if res == MaskResult::Transparent {
                continue;
            }
            let m = (res != MaskResult::FullCover).then_some(&mask[..]);
            fill_row(target.span_mut(y, area.x1, area.x2), color, m, opa, BlendMode::Normal);
        }
    }

    /// Cheapest exact coverage source for `shape`.
    fn coverage_for(&mut self, shape: &ShapeSpec) -> BlitResult<Coverage> {
        if let Some(rects) = shape.simple_rects() {
            return Ok(Coverage::Rects(rects));
        }
        if let Some(plan) = shape.nine_patch(self.opts.ninepatch_min_size) {
            let key = shape.fragment_key();
            let frag = match self.fragments.get(&key) {
                Some(frag) => frag,
                None => {
                    let frag = Arc::new(shape.render_fragment()?);
                    debug!(?key, "baked corner fragment");
                    self.fragments.put(key, Arc::clone(&frag), TextureFlags::MANAGED);
                    frag
                }
            };
            return Ok(Coverage::NinePatch { plan, frag });
        }
        if let ShapeSpec::Shadow { .. } = shape {
            return Ok(Coverage::Map {
                area: shape.bounds(),
                map: shape.render_full()?,
            });
        }
        Ok(Coverage::Masks(shape.mask_engine()?))
    }
}

/// Combined coverage of the active masks and `shape` for one row.
fn row_cover(
    masks: &MaskEngine,
    shape: Option<&Coverage>,
    buf: &mut [Opa],
    scratch: &mut [Opa],
    x: i32,
    y: i32,
) -> MaskResult {
    let res = masks.apply(buf, x, y);
    if res == MaskResult::Transparent {
        return res;
    }
    match shape {
        Some(c) => {
            c.mul_row(buf, scratch, x, y);
            classify(buf)
        }
        None => res,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/renderer.rs"]
mod tests;
