use kurbo::{Affine, Vec2};
use tracing::{debug, trace, warn};

use crate::cache::texture_cache::{
    Evicted, TextureCache, TextureCacheStats, TextureFlags, TextureKey,
};
use crate::decode::registry::DecoderRegistry;
use crate::decode::source::ImageSource;
use crate::draw::context::DrawContext;
use crate::draw::dsc::{DrawOutcome, ImageDrawDsc, RectDrawDsc};
use crate::draw::label::{FALLBACK_LABEL, LABEL_COLOR, label_runs};
use crate::draw::shape::{PartLayer, ShapeSpec, rect_parts};
use crate::draw::transform::{image_matrix, transformed_area};
use crate::foundation::area::Area;
use crate::foundation::config::RendererOpts;
use crate::foundation::core::{OPA_COVER, OPA_MIN, Opa, Point, Rgba8};
use crate::foundation::error::{BlitError, BlitResult};
use crate::foundation::math::mul_div255_u8;
use crate::gpu::driver::{
    BlitParams, Fence, Flip, GpuDriver, RenderTargetGuard, TextureFormat, TextureId,
};
use crate::mask::radius::RadiusMask;
use crate::pixel::blend::BlendMode;
use crate::pixel::blend_word::BlendWord;

const COMPOSE_SLOT: u8 = 0;
/// Stand-in for "the whole target" when the screen size is not known.
const UNBOUNDED: i32 = 1 << 20;

/// What a compositing step paints.
#[derive(Clone, Copy, Debug)]
enum Content {
    /// `src` of `texture` onto `dst`.
    Texture { texture: TextureId, src: Area, dst: Area },
    /// The whole texture through `matrix`.
    Transformed { texture: TextureId, matrix: Affine },
    /// Shape coverage tinted with `color`.
    Shape { shape: ShapeSpec, color: Rgba8 },
}

/// Compositor driving a [`GpuDriver`].
///
/// Decoded images are uploaded once per `(source, recolor, frame)` and rounded-corner
/// fragments once per geometry; both live in an LRU [`TextureCache`] that destroys what
/// it evicts. Draws that need masking are composed in a scratch texture first.
pub struct GpuRenderer<D: GpuDriver> {
    driver: D,
    ctx: DrawContext,
    textures: TextureCache<TextureId>,
    opts: RendererOpts,
    clip: Option<Area>,
}

impl<D: GpuDriver> GpuRenderer<D> {
    /// Renderer with the built-in decoders.
    pub fn new(driver: D, opts: RendererOpts) -> BlitResult<Self> {
        Self::with_registry(driver, opts, DecoderRegistry::with_builtin())
    }

    /// Renderer with a caller-assembled decoder registry.
    pub fn with_registry(
        driver: D,
        opts: RendererOpts,
        decoders: DecoderRegistry,
    ) -> BlitResult<Self> {
        opts.validate()?;
        Ok(Self {
            driver,
            ctx: DrawContext::with_registry(&opts, decoders),
            textures: TextureCache::new(opts.texture_cache_capacity, opts.max_tile_size),
            opts,
            clip: None,
        })
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, mutably (render target changes, direct commands).
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Destroy every cached texture and hand the driver back.
    pub fn into_driver(mut self) -> D {
        self.clear_textures();
        self.driver
    }

    /// Shared decoder/cache/mask state.
    pub fn context(&self) -> &DrawContext {
        &self.ctx
    }

    /// Mutable shared state.
    pub fn context_mut(&mut self) -> &mut DrawContext {
        &mut self.ctx
    }

    /// Texture cache counters.
    pub fn texture_stats(&self) -> TextureCacheStats {
        self.textures.stats()
    }

    /// Number of cached textures.
    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    /// Restrict drawing to `clip` on the current render target.
    pub fn set_clip(&mut self, clip: Option<Area>) {
        self.clip = clip;
    }

    /// Current clip.
    pub fn clip(&self) -> Option<Area> {
        self.clip
    }

    /// Forget decodes and uploaded textures of `src`.
    pub fn invalidate_src(&mut self, src: &ImageSource) -> usize {
        let id = src.id();
        let gone = self
            .textures
            .remove_where(|k| matches!(k, TextureKey::Image { source, .. } if *source == id));
        let n = gone.len();
        destroy_evicted(&mut self.driver, gone);
        n + self.ctx.invalidate_src(src)
    }

    /// Destroy every cached texture.
    pub fn clear_textures(&mut self) {
        let gone = self.textures.clear();
        destroy_evicted(&mut self.driver, gone);
    }

    /// Close the current command batch.
    pub fn submit(&mut self) -> Fence {
        self.driver.submit()
    }

    /// Submit and block until the batch completes.
    pub fn finish(&mut self) {
        let fence = self.driver.submit();
        self.driver.wait(fence);
    }

    fn visible(&self, area: Area) -> Option<Area> {
        match self.clip {
            Some(c) => area.intersect(&c),
            None => Some(area),
        }
    }

    /// Draw `src` with its top-left at `coords.x1, coords.y1`; see
    /// [`crate::Renderer::draw_image`] for placement rules.
    #[tracing::instrument(level = "trace", skip(self, src, dsc), fields(src = %src))]
    pub fn draw_image(
        &mut self,
        coords: Area,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> DrawOutcome {
        if dsc.opa <= OPA_MIN || dsc.zoom == 0 {
            return DrawOutcome::Invisible;
        }
        match self.draw_image_inner(coords, src, dsc) {
            Ok(true) => DrawOutcome::Drawn,
            Ok(false) => DrawOutcome::Invisible,
            Err(err @ (BlitError::NoDecoder(_) | BlitError::DecodeOpenFailed(_))) => {
                self.ctx.record(&err);
                warn!(src = %src, error = %err, "image unavailable, drawing fallback box");
                if let Some(area) = self.visible(coords)
                    && let Err(e) = self.fallback_box(coords, area, dsc.opa)
                {
                    warn!(error = %e, "fallback box failed");
                }
                DrawOutcome::Fallback(err.to_string())
            }
            Err(err) => {
                let code = self.ctx.record(&err);
                warn!(src = %src, error = %err, "image draw abandoned");
                DrawOutcome::Abandoned(code)
            }
        }
    }

    /// White box over `coords` with the placeholder label, cut to `area`.
    fn fallback_box(&mut self, coords: Area, area: Area, opa: Opa) -> BlitResult<()> {
        self.driver.set_clip(Some(area));
        self.driver.fill(area, Rgba8::WHITE.with_alpha(opa), BlendWord::src_over())?;
        let ink = LABEL_COLOR.with_alpha(opa);
        for run in label_runs(FALLBACK_LABEL, coords, area) {
            self.driver.fill(run, ink, BlendWord::src_over())?;
        }
        Ok(())
    }

    fn draw_image_inner(
        &mut self,
        coords: Area,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<bool> {
        if dsc.has_transform() && dsc.radius > 0 {
            let (texture, w, h) = self.rounded_image_texture(src, dsc)?;
            let result = self.compose_image(coords, texture, w, h, dsc);
            self.driver.destroy_texture(texture);
            return result;
        }
        let (key, texture, w, h) = self.image_texture(src, dsc)?;
        // Scratch and fragment inserts must not evict the image mid-draw.
        self.textures.set_pinned(&key, true);
        let result = self.compose_image(coords, texture, w, h, dsc);
        self.textures.set_pinned(&key, false);
        self.trim_textures();
        result
    }

    /// Drop entries that piled up over capacity while textures were pinned.
    fn trim_textures(&mut self) {
        let evicted = self.textures.trim();
        destroy_evicted(&mut self.driver, evicted);
    }

    fn compose_image(
        &mut self,
        coords: Area,
        texture: TextureId,
        w: u32,
        h: u32,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<bool> {
        let img_area = Area::from_size(coords.x1, coords.y1, w as i32, h as i32);
        let (content, bounds, round) = if dsc.has_transform() {
            let matrix = image_matrix(Point::new(coords.x1, coords.y1), w, h, dsc);
            let bounds = transformed_area(matrix, w, h);
            (Content::Transformed { texture, matrix }, Some(bounds), None)
        } else {
            let dst = img_area.intersect(&coords);
            let content = dst.map(|dst| Content::Texture {
                texture,
                src: dst.translate(-img_area.x1, -img_area.y1),
                dst,
            });
            let round = (dsc.radius > 0).then(|| ShapeSpec::fill(img_area, dsc.radius));
            match content {
                Some(c) => (c, dst, round),
                None => return Ok(false),
            }
        };
        let Some(area) = bounds.and_then(|b| self.visible(b)) else {
            return Ok(false);
        };
        trace!(?area, "image area");
        self.compose(content, round, area, dsc.blend_mode, dsc.opa)?;
        Ok(true)
    }

    /// Cached upload of the recolored image.
    fn image_texture(
        &mut self,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<(TextureKey, TextureId, u32, u32)> {
        let key = TextureKey::Image {
            source: src.id(),
            color: dsc.recolor,
            recolor_opa: dsc.recolor_opa,
            frame_id: dsc.frame_id,
        };
        if let Some(t) = self.textures.get(&key)
            && let Some((w, h)) = self.driver.texture_size(t)
        {
            return Ok((key, t, w, h));
        }
        let (rgba, w, h) = self.decode_rgba(src, dsc)?;
        let t = upload_texture(&mut self.driver, TextureFormat::Rgba8888, w, h, &rgba)?;
        debug!(src = %src, w, h, "uploaded image texture");
        let evicted = self.textures.put(key, t, TextureFlags::MANAGED);
        destroy_evicted(&mut self.driver, evicted);
        Ok((key, t, w, h))
    }

    /// One-off upload with the corner radius baked into alpha, for rotated or zoomed draws.
    fn rounded_image_texture(
        &mut self,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<(TextureId, u32, u32)> {
        let (mut rgba, w, h) = self.decode_rgba(src, dsc)?;
        let rm = RadiusMask::new(Area::from_size(0, 0, w as i32, h as i32), dsc.radius, true);
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            let cov = rm.coverage((i as u32 % w) as i32, (i as u32 / w) as i32);
            px[3] = mul_div255_u8(u16::from(px[3]), u16::from(cov));
        }
        let t = upload_texture(&mut self.driver, TextureFormat::Rgba8888, w, h, &rgba)?;
        Ok((t, w, h))
    }

    fn decode_rgba(
        &mut self,
        src: &ImageSource,
        dsc: &ImageDrawDsc,
    ) -> BlitResult<(Vec<u8>, u32, u32)> {
        let h = self.ctx.open_image(src, dsc.recolor, dsc.frame_id)?;
        let result = self.ctx.header(h).and_then(|header| {
            let rgba = self.ctx.load_rgba(h, dsc.recolor, dsc.recolor_opa)?;
            Ok((rgba, u32::from(header.width), u32::from(header.height)))
        });
        self.ctx.finish_image(h);
        result
    }

    /// Draw a rectangle: shadow, then background, then border, then outline.
    #[tracing::instrument(level = "trace", skip(self, dsc))]
    pub fn draw_rect(&mut self, coords: Area, dsc: &RectDrawDsc) -> DrawOutcome {
        let mut outcome = DrawOutcome::Invisible;
        let mut degraded = None;
        for part in rect_parts(coords, dsc) {
            let Some(area) = self.visible(part.shape.bounds()) else {
                continue;
            };
            let content = Content::Shape {
                shape: part.shape,
                color: part.color,
            };
            match self.compose(content, None, area, dsc.blend_mode, part.opa) {
                Ok(()) => outcome = DrawOutcome::Drawn,
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

    /// Multiply the current target's alpha by a rounded-rect coverage of `area` and clear
    /// it outside, within the clip.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn mask_rect(&mut self, area: Area, radius: i32) -> DrawOutcome {
        match self.mask_rect_inner(area, radius) {
            Ok(()) => DrawOutcome::Drawn,
            Err(err) => {
                let code = self.ctx.record(&err);
                warn!(error = %err, "mask rect failed");
                DrawOutcome::Abandoned(code)
            }
        }
    }

    fn mask_rect_inner(&mut self, area: Area, radius: i32) -> BlitResult<()> {
        let view = self
            .clip
            .unwrap_or(Area::new(-UNBOUNDED, -UNBOUNDED, UNBOUNDED, UNBOUNDED));
        self.driver.set_clip(Some(view));
        let clear = Rgba8::TRANSPARENT;
        let outside = [
            Area::new(view.x1, view.y1, view.x2, area.y1 - 1),
            Area::new(view.x1, area.y2 + 1, view.x2, view.y2),
            Area::new(view.x1, area.y1, area.x1 - 1, area.y2),
            Area::new(area.x2 + 1, area.y1, view.x2, area.y2),
        ];
        for a in outside.into_iter().filter(|a| a.x1 <= a.x2 && a.y1 <= a.y2) {
            self.driver.fill(a, clear, BlendWord::mask())?;
        }
        paint(
            &mut self.driver,
            &mut self.textures,
            &self.opts,
            Content::Shape {
                shape: ShapeSpec::fill(area, radius),
                color: Rgba8::WHITE,
            },
            Vec2::ZERO,
            BlendWord::mask(),
            OPA_COVER,
        )
    }

    /// Paint `content` over `area`, directly when nothing needs masking and through a
    /// scratch texture otherwise.
    fn compose(
        &mut self,
        content: Content,
        round: Option<ShapeSpec>,
        area: Area,
        mode: BlendMode,
        opa: Opa,
    ) -> BlitResult<()> {
        if self.ctx.masks().is_empty() && round.is_none() {
            self.driver.set_clip(Some(area));
            return paint(
                &mut self.driver,
                &mut self.textures,
                &self.opts,
                content,
                Vec2::ZERO,
                BlendWord::from_mode(mode),
                opa,
            );
        }
        let tile = self.opts.max_tile_size as i32;
        let mut y = area.y1;
        while y <= area.y2 {
            let mut x = area.x1;
            let y2 = (y + tile - 1).min(area.y2);
            while x <= area.x2 {
                let t = Area::new(x, y, (x + tile - 1).min(area.x2), y2);
                self.compose_tile(content, round, t, mode, opa)?;
                x += tile;
            }
            y += tile;
        }
        Ok(())
    }

    fn compose_tile(
        &mut self,
        content: Content,
        round: Option<ShapeSpec>,
        tile: Area,
        mode: BlendMode,
        opa: Opa,
    ) -> BlitResult<()> {
        let (w, h) = (tile.width() as u32, tile.height() as u32);
        let driver = &mut self.driver;
        let scratch = self.textures.get_scratch(COMPOSE_SLOT, w, h, |pw, ph| {
            driver.create_texture(pw, ph, TextureFormat::Rgba8888)
        })?;
        destroy_evicted(&mut self.driver, scratch.evicted);
        let key = TextureKey::Scratch {
            slot: COMPOSE_SLOT,
            width: scratch.width,
            height: scratch.height,
        };
        // Fragment uploads below must not evict the texture being drawn into.
        self.textures.set_pinned(&key, true);
        let result = self.fill_scratch(scratch.texture, content, round, tile);
        self.textures.set_pinned(&key, false);
        if let Err(err) = result {
            self.trim_textures();
            return Err(err);
        }

        self.driver.set_clip(Some(tile));
        let params = BlitParams {
            blend: BlendWord::from_mode(mode).with_ops(BlendWord::MODULATE_A),
            alpha: opa,
            ..Default::default()
        };
        let blitted = self.driver.blit(
            scratch.texture,
            Area::from_size(0, 0, w as i32, h as i32),
            tile,
            &params,
        );
        self.trim_textures();
        blitted
    }

    fn fill_scratch(
        &mut self,
        scratch: TextureId,
        content: Content,
        round: Option<ShapeSpec>,
        tile: Area,
    ) -> BlitResult<()> {
        let offset = Vec2::new(-f64::from(tile.x1), -f64::from(tile.y1));
        let local = Area::from_size(0, 0, tile.width(), tile.height());
        let mut guard = RenderTargetGuard::acquire(&mut self.driver, Some(scratch))?;
        guard.set_clip(Some(local));
        guard.clear(Rgba8::TRANSPARENT);
        paint(
            &mut *guard,
            &mut self.textures,
            &self.opts,
            content,
            offset,
            BlendWord::src_over(),
            OPA_COVER,
        )?;
        if let Some(shape) = round {
            let cover = Content::Shape {
                shape,
                color: Rgba8::WHITE,
            };
            paint(
                &mut *guard,
                &mut self.textures,
                &self.opts,
                cover,
                offset,
                BlendWord::mask(),
                OPA_COVER,
            )?;
        }
        if !self.ctx.masks().is_empty() {
            let mask = self.ctx.masks().dump_to_texture(&mut *guard, tile, None)?;
            let params = BlitParams {
                blend: BlendWord::mask(),
                ..Default::default()
            };
            let blitted = guard.blit(mask, local, local, &params);
            guard.destroy_texture(mask);
            blitted?;
        }
        guard.set_clip(None);
        Ok(())
    }
}

impl<D: GpuDriver> std::fmt::Debug for GpuRenderer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuRenderer")
            .field("ctx", &self.ctx)
            .field("textures", &self.textures)
            .field("clip", &self.clip)
            .finish_non_exhaustive()
    }
}

/// Issue the driver commands for `content`, shifted by `offset`.
fn paint<D: GpuDriver + ?Sized>(
    driver: &mut D,
    textures: &mut TextureCache<TextureId>,
    opts: &RendererOpts,
    content: Content,
    offset: Vec2,
    word: BlendWord,
    opa: Opa,
) -> BlitResult<()> {
    let (dx, dy) = (offset.x as i32, offset.y as i32);
    let params = BlitParams {
        blend: word.with_ops(BlendWord::MODULATE_A),
        alpha: opa,
        ..Default::default()
    };
    match content {
        Content::Texture { texture, src, dst } => {
            driver.blit(texture, src, dst.translate(dx, dy), &params)
        }
        Content::Transformed { texture, matrix } => {
            driver.blit_transformed(texture, Affine::translate(offset) * matrix, &params)
        }
        Content::Shape { shape, color } => {
            paint_shape(driver, textures, opts, &shape, color, (dx, dy), word, opa)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_shape<D: GpuDriver + ?Sized>(
    driver: &mut D,
    textures: &mut TextureCache<TextureId>,
    opts: &RendererOpts,
    shape: &ShapeSpec,
    color: Rgba8,
    (dx, dy): (i32, i32),
    word: BlendWord,
    opa: Opa,
) -> BlitResult<()> {
    if let Some(rects) = shape.simple_rects() {
        let c = color.with_alpha(mul_div255_u8(u16::from(color.a), u16::from(opa)));
        for r in rects {
            driver.fill(r.translate(dx, dy), c, word)?;
        }
        return Ok(());
    }

    let params = BlitParams {
        blend: word.with_ops(BlendWord::MODULATE_RGB | BlendWord::MODULATE_A),
        color,
        alpha: mul_div255_u8(u16::from(color.a), u16::from(opa)),
        ..Default::default()
    };

    if let Some(plan) = shape.nine_patch(opts.ninepatch_min_size) {
        let key = shape.fragment_key();
        let frag = match textures.get(&key) {
            Some(t) => t,
            None => {
                let map = shape.render_fragment()?;
                let (w, h) = (map.width(), map.height());
                let t = upload_texture(driver, TextureFormat::A8, w, h, map.as_bytes())?;
                debug!(?key, "uploaded corner fragment");
                let evicted = textures.put(key, t, TextureFlags::MANAGED);
                destroy_evicted(driver, evicted);
                t
            }
        };
        for piece in plan.pieces() {
            let p = BlitParams {
                flip: piece.flip,
                ..params
            };
            driver.blit(frag, piece.frag_src(plan.frag), piece.area.translate(dx, dy), &p)?;
        }
        return Ok(());
    }

    let bounds = shape.bounds();
    let map = shape.render_full()?;
    let t = upload_texture(driver, TextureFormat::A8, map.width(), map.height(), map.as_bytes())?;
    let src = Area::from_size(0, 0, bounds.width(), bounds.height());
    let p = BlitParams {
        flip: Flip::NONE,
        ..params
    };
    let blitted = driver.blit(t, src, bounds.translate(dx, dy), &p);
    driver.destroy_texture(t);
    blitted
}

/// Create a texture and fill it from tightly packed rows; nothing leaks on failure.
fn upload_texture<D: GpuDriver + ?Sized>(
    driver: &mut D,
    format: TextureFormat,
    w: u32,
    h: u32,
    data: &[u8],
) -> BlitResult<TextureId> {
    let t = driver.create_texture(w, h, format)?;
    let region = Area::from_size(0, 0, w as i32, h as i32);
    if let Err(err) = driver.upload(t, region, data, w as usize * format.bytes_per_pixel()) {
        driver.destroy_texture(t);
        return Err(err);
    }
    Ok(t)
}

fn destroy_evicted<D: GpuDriver + ?Sized>(driver: &mut D, evicted: Vec<Evicted<TextureId>>) {
    for e in evicted.into_iter().filter(|e| e.managed) {
        driver.destroy_texture(e.texture);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/gpu_renderer.rs"]
mod tests;
