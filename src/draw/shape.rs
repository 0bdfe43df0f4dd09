use std::sync::Arc;

use smallvec::SmallVec;

use crate::cache::texture_cache::TextureKey;
use crate::draw::blur::stack_blur_opa;
use crate::draw::dsc::{BorderSide, RectDrawDsc};
use crate::draw::ninepatch::NinePatch;
use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, OPA_MIN, Opa, Rgba8};
use crate::foundation::error::BlitResult;
use crate::foundation::math::mul_div255_u8;
use crate::mask::engine::{Mask, MaskEngine, OpaMap};
use crate::mask::radius::RadiusMask;

/// Coverage shape of one rectangle part.
///
/// Radii are stored already clamped to what the area allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShapeSpec {
    /// Filled rounded rectangle.
    Fill { area: Area, radius: i32 },
    /// `area` minus `area` shrunk by `thickness` on the sides in `side`.
    Ring {
        area: Area,
        rout: i32,
        thickness: i32,
        side: BorderSide,
    },
    /// Filled rounded `core`, blurred by `blur` pixels.
    Shadow { core: Area, radius: i32, blur: i32 },
}

fn clamp_radius(area: Area, radius: i32) -> i32 {
    RadiusMask::new(area, radius, true).effective_radius()
}

impl ShapeSpec {
    pub(crate) fn fill(area: Area, radius: i32) -> Self {
        Self::Fill {
            area,
            radius: clamp_radius(area, radius),
        }
    }

    pub(crate) fn ring(area: Area, radius: i32, thickness: i32, side: BorderSide) -> Self {
        Self::Ring {
            area,
            rout: clamp_radius(area, radius),
            thickness: thickness.max(0),
            side,
        }
    }

    pub(crate) fn shadow(core: Area, radius: i32, blur: i32) -> Self {
        Self::Shadow {
            core,
            radius: clamp_radius(core, radius),
            blur: blur.max(0),
        }
    }

    /// Every pixel the shape can touch.
    pub(crate) fn bounds(&self) -> Area {
        match *self {
            Self::Fill { area, .. } | Self::Ring { area, .. } => area,
            Self::Shadow { core, blur, .. } => Area::new(
                core.x1 - blur,
                core.y1 - blur,
                core.x2 + blur,
                core.y2 + blur,
            ),
        }
    }

    fn inner_radius(rout: i32, thickness: i32) -> i32 {
        (rout - thickness).max(0)
    }

    /// Hole of a ring: shrunk on drawn sides, pushed past the outer edge on open sides.
    fn ring_inner(area: Area, rout: i32, t: i32, side: BorderSide) -> Option<Area> {
        let open = rout + 1;
        let d = |s: BorderSide| if side.contains(s) { t } else { -open };
        let a = Area {
            x1: area.x1 + d(BorderSide::LEFT),
            y1: area.y1 + d(BorderSide::TOP),
            x2: area.x2 - d(BorderSide::RIGHT),
            y2: area.y2 - d(BorderSide::BOTTOM),
        };
        (a.x1 <= a.x2 && a.y1 <= a.y2).then_some(a)
    }

    /// Disjoint rectangles exactly covering a shape without curves.
    pub(crate) fn simple_rects(&self) -> Option<SmallVec<[Area; 4]>> {
        match *self {
            Self::Fill { area, radius: 0 } => Some(SmallVec::from_slice(&[area])),
            Self::Ring {
                area,
                rout: 0,
                thickness,
                side,
            } => {
                let t = thickness;
                let mut out = SmallVec::new();
                let mut y1 = area.y1;
                let mut y2 = area.y2;
                if side.contains(BorderSide::TOP) {
                    let y = (area.y1 + t - 1).min(area.y2);
                    out.push(Area::new(area.x1, area.y1, area.x2, y));
                    y1 = y + 1;
                }
                if side.contains(BorderSide::BOTTOM) && y1 <= y2 {
                    let y = (area.y2 - t + 1).max(y1);
                    out.push(Area::new(area.x1, y, area.x2, area.y2));
                    y2 = y - 1;
                }
                if y1 <= y2 {
                    if side.contains(BorderSide::LEFT) {
                        let x = (area.x1 + t - 1).min(area.x2);
                        out.push(Area::new(area.x1, y1, x, y2));
                    }
                    if side.contains(BorderSide::RIGHT) {
                        let lo = if side.contains(BorderSide::LEFT) {
                            area.x1 + t
                        } else {
                            area.x1
                        };
                        let x = (area.x2 - t + 1).max(lo);
                        if x <= area.x2 {
                            out.push(Area::new(x, y1, area.x2, y2));
                        }
                    }
                }
                Some(out)
            }
            _ => None,
        }
    }

    /// Edge length of the top-left fragment.
    pub(crate) fn frag_size(&self) -> i32 {
        match *self {
            Self::Fill { radius, .. } => radius + 1,
            Self::Ring { rout, thickness, .. } => rout.max(thickness) + 1,
            Self::Shadow { radius, blur, .. } => radius + 2 * blur + 1,
        }
    }

    /// Nine-patch plan, when the shape has four mirrored corners and is large enough.
    pub(crate) fn nine_patch(&self, min_size: i32) -> Option<NinePatch> {
        if let Self::Ring { side, .. } = self
            && *side != BorderSide::FULL
        {
            return None;
        }
        let b = self.bounds();
        if b.width().min(b.height()) < min_size {
            return None;
        }
        NinePatch::plan(b, self.frag_size())
    }

    /// Cache key of the fragment.
    pub(crate) fn fragment_key(&self) -> TextureKey {
        let size = self.frag_size() as u32;
        match *self {
            Self::Fill { radius, .. } => TextureKey::RectBg { radius, size },
            Self::Ring {
                rout, thickness, ..
            } => TextureKey::RectBorder {
                rout,
                rin: Self::inner_radius(rout, thickness),
                thickness,
                size,
            },
            Self::Shadow { radius, blur, .. } => TextureKey::RectShadow { radius, size, blur },
        }
    }

    /// Masks whose product is the unblurred shape coverage.
    pub(crate) fn mask_engine(&self) -> BlitResult<MaskEngine> {
        let mut e = MaskEngine::new();
        match *self {
            Self::Fill { area, radius } => {
                e.add(Mask::Radius(RadiusMask::new(area, radius, true)))?;
            }
            Self::Ring {
                area,
                rout,
                thickness,
                side,
            } => {
                e.add(Mask::Radius(RadiusMask::new(area, rout, true)))?;
                if let Some(inner) = Self::ring_inner(area, rout, thickness, side) {
                    let rin = Self::inner_radius(rout, thickness);
                    e.add(Mask::Radius(RadiusMask::new(inner, rin, false)))?;
                }
            }
            Self::Shadow { core, radius, .. } => {
                e.add(Mask::Radius(RadiusMask::new(core, radius, true)))?;
            }
        }
        Ok(e)
    }

    /// Coverage over [`ShapeSpec::bounds`].
    pub(crate) fn render_full(&self) -> BlitResult<OpaMap> {
        let mut map = self.mask_engine()?.dump(self.bounds(), None)?;
        if let Self::Shadow { blur, .. } = *self {
            stack_blur_opa(&mut map, blur as u32)?;
        }
        Ok(map)
    }

    /// Top-left fragment, rendered from a square stand-in large enough that its middle
    /// row and column are past every curve.
    pub(crate) fn render_fragment(&self) -> BlitResult<OpaMap> {
        let f = self.frag_size();
        let canvas = Area::new(0, 0, 2 * f, 2 * f);
        let stand_in = match *self {
            Self::Fill { radius, .. } => Self::Fill {
                area: canvas,
                radius,
            },
            Self::Ring {
                rout, thickness, ..
            } => Self::Ring {
                area: canvas,
                rout,
                thickness,
                side: BorderSide::FULL,
            },
            Self::Shadow { radius, blur, .. } => Self::Shadow {
                core: Area::new(blur, blur, 2 * f - blur, 2 * f - blur),
                radius,
                blur,
            },
        };
        let full = stand_in.render_full()?;
        let mut frag = OpaMap::new(f as u32, f as u32)?;
        for y in 0..f as u32 {
            frag.row_mut(y)
                .copy_from_slice(&full.row(y)[..f as usize]);
        }
        Ok(frag)
    }
}

/// Per-row coverage source used by the software renderer.
pub(crate) enum Coverage {
    /// Union of disjoint rectangles.
    Rects(SmallVec<[Area; 4]>),
    /// Exact per-pixel masks.
    Masks(MaskEngine),
    /// Cached corner fragment.
    NinePatch { plan: NinePatch, frag: Arc<OpaMap> },
    /// Precomputed map positioned at `area`.
    Map { area: Area, map: OpaMap },
}

impl Coverage {
    /// Multiply the coverage of row `y`, columns `x..x + buf.len()`, into `buf`.
    pub(crate) fn mul_row(&self, buf: &mut [Opa], scratch: &mut [Opa], x: i32, y: i32) {
        match self {
            Self::Rects(rects) => {
                for (i, v) in buf.iter_mut().enumerate() {
                    let px = x + i as i32;
                    let inside = rects
                        .iter()
                        .any(|r| y >= r.y1 && y <= r.y2 && px >= r.x1 && px <= r.x2);
                    if !inside {
                        *v = 0;
                    }
                }
            }
            Self::Masks(engine) => {
                let tmp = &mut scratch[..buf.len()];
                engine.apply(tmp, x, y);
                mul_into(buf, tmp);
            }
            Self::NinePatch { plan, frag } => {
                plan.mul_row(frag, buf, x, y);
            }
            Self::Map { area, map } => {
                for (i, v) in buf.iter_mut().enumerate() {
                    let px = x + i as i32;
                    let c = if y < area.y1 || y > area.y2 || px < area.x1 || px > area.x2 {
                        0
                    } else {
                        map.get((px - area.x1) as u32, (y - area.y1) as u32)
                    };
                    *v = mul_div255_u8(u16::from(*v), u16::from(c));
                }
            }
        }
    }
}

fn mul_into(buf: &mut [Opa], cov: &[Opa]) {
    for (v, &c) in buf.iter_mut().zip(cov) {
        if c != OPA_COVER {
            *v = mul_div255_u8(u16::from(*v), u16::from(c));
        }
    }
}

/// Which part of a rectangle a [`Part`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PartLayer {
    Shadow,
    Background,
    Border,
    Outline,
}

/// One colored shape of a rectangle draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Part {
    pub(crate) layer: PartLayer,
    pub(crate) shape: ShapeSpec,
    pub(crate) color: Rgba8,
    pub(crate) opa: Opa,
}

/// Decompose a rectangle draw into its visible parts, in painting order.
pub(crate) fn rect_parts(coords: Area, dsc: &RectDrawDsc) -> SmallVec<[Part; 4]> {
    let mut out = SmallVec::new();
    let r = clamp_radius(coords, dsc.radius);

    let shadow_hidden = dsc.shadow_width == 0
        && dsc.shadow_spread <= 0
        && dsc.shadow_ofs_x == 0
        && dsc.shadow_ofs_y == 0;
    if dsc.shadow_opa > OPA_MIN
        && !shadow_hidden
        && let Some(core) = coords
            .translate(dsc.shadow_ofs_x, dsc.shadow_ofs_y)
            .grow(dsc.shadow_spread, dsc.shadow_spread)
    {
        out.push(Part {
            layer: PartLayer::Shadow,
            shape: ShapeSpec::shadow(core, (r + dsc.shadow_spread).max(0), dsc.shadow_width / 2),
            color: dsc.shadow_color,
            opa: dsc.shadow_opa,
        });
    }

    if dsc.bg_opa > OPA_MIN {
        out.push(Part {
            layer: PartLayer::Background,
            shape: ShapeSpec::fill(coords, r),
            color: dsc.bg_color,
            opa: dsc.bg_opa,
        });
    }

    if dsc.border_width > 0 && dsc.border_opa > OPA_MIN && dsc.border_side != BorderSide::NONE {
        out.push(Part {
            layer: PartLayer::Border,
            shape: ShapeSpec::ring(coords, r, dsc.border_width, dsc.border_side),
            color: dsc.border_color,
            opa: dsc.border_opa,
        });
    }

    let pad = dsc.outline_pad;
    let ow = dsc.outline_width;
    if ow > 0
        && dsc.outline_opa > OPA_MIN
        && let Some(outer) = coords.grow(pad + ow, pad + ow)
    {
        let rout = if r > 0 { (r + pad).max(0) + ow } else { 0 };
        out.push(Part {
            layer: PartLayer::Outline,
            shape: ShapeSpec::ring(outer, rout, ow, BorderSide::FULL),
            color: dsc.outline_color,
            opa: dsc.outline_opa,
        });
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/draw/shape.rs"]
mod tests;
