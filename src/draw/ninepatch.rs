//! Nine-patch decomposition of rounded shapes.
//!
//! A shape whose four corners are mirror images of each other is described by one
//! `f x f` top-left fragment. Column `f - 1` and row `f - 1` of the fragment must already
//! be past every curve, so edges are that column/row stretched and the center is the
//! single texel `(f - 1, f - 1)`.

use smallvec::SmallVec;

use crate::foundation::area::Area;
use crate::foundation::core::Opa;
use crate::foundation::math::mul_div255_u8;
use crate::gpu::driver::Flip;
use crate::mask::engine::OpaMap;

/// Where a piece samples the fragment from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PieceKind {
    /// The whole fragment, mirrored by `flip`.
    Corner,
    /// Column `f - 1` stretched horizontally (top and bottom strips).
    EdgeH,
    /// Row `f - 1` stretched vertically (left and right strips).
    EdgeV,
    /// Texel `(f - 1, f - 1)` stretched over the middle.
    Center,
}

/// One rectangle of the decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Piece {
    pub(crate) area: Area,
    pub(crate) kind: PieceKind,
    pub(crate) flip: Flip,
}

impl Piece {
    /// Source rectangle inside an `f x f` fragment.
    pub(crate) fn frag_src(&self, f: i32) -> Area {
        let e = f - 1;
        match self.kind {
            PieceKind::Corner => Area::new(0, 0, e, e),
            PieceKind::EdgeH => Area::new(e, 0, e, e),
            PieceKind::EdgeV => Area::new(0, e, e, e),
            PieceKind::Center => Area::new(e, e, e, e),
        }
    }
}

/// Decomposition of `area` for fragment size `frag`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NinePatch {
    pub(crate) area: Area,
    pub(crate) frag: i32,
}

impl NinePatch {
    /// Plan `area`; `None` when it is too small to hold two fragments per axis.
    pub(crate) fn plan(area: Area, frag: i32) -> Option<Self> {
        (frag > 0 && area.width() >= 2 * frag && area.height() >= 2 * frag)
            .then_some(Self { area, frag })
    }

    /// Up to nine non-overlapping pieces covering the area, empty ones omitted.
    pub(crate) fn pieces(&self) -> SmallVec<[Piece; 9]> {
        let a = self.area;
        let f = self.frag;
        let cols = [
            (a.x1, a.x1 + f - 1, false),
            (a.x1 + f, a.x2 - f, false),
            (a.x2 - f + 1, a.x2, true),
        ];
        let rows = [
            (a.y1, a.y1 + f - 1, false),
            (a.y1 + f, a.y2 - f, false),
            (a.y2 - f + 1, a.y2, true),
        ];
        let mut out = SmallVec::new();
        for (ri, &(y1, y2, flip_v)) in rows.iter().enumerate() {
            for (ci, &(x1, x2, flip_h)) in cols.iter().enumerate() {
                if x2 < x1 || y2 < y1 {
                    continue;
                }
                let kind = match (ri == 1, ci == 1) {
                    (false, false) => PieceKind::Corner,
                    (false, true) => PieceKind::EdgeH,
                    (true, false) => PieceKind::EdgeV,
                    (true, true) => PieceKind::Center,
                };
                out.push(Piece {
                    area: Area::new(x1, y1, x2, y2),
                    kind,
                    flip: Flip {
                        horizontal: flip_h,
                        vertical: flip_v,
                    },
                });
            }
        }
        out
    }

    /// Fragment coordinate for one axis.
    fn axis(lo: i32, hi: i32, f: i32, v: i32) -> i32 {
        if v < lo + f {
            v - lo
        } else if v > hi - f {
            hi - v
        } else {
            f - 1
        }
    }

    /// Multiply the coverage of row `y`, columns `x..x + buf.len()`, into `buf`.
    ///
    /// Returns `false` when every multiplied value was fully opaque.
    pub(crate) fn mul_row(&self, frag: &OpaMap, buf: &mut [Opa], x: i32, y: i32) -> bool {
        let a = self.area;
        let f = self.frag;
        if y < a.y1 || y > a.y2 {
            buf.fill(0);
            return true;
        }
        let fy = Self::axis(a.y1, a.y2, f, y) as u32;
        let mut changed = false;
        for (i, v) in buf.iter_mut().enumerate() {
            let px = x + i as i32;
            let c = if px < a.x1 || px > a.x2 {
                0
            } else {
                frag.get(Self::axis(a.x1, a.x2, f, px) as u32, fy)
            };
            if c != 255 {
                changed = true;
                *v = mul_div255_u8(u16::from(*v), u16::from(c));
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/ninepatch.rs"]
mod tests;
