use std::sync::Arc;

use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, OPA_TRANSP, Opa};
use crate::mask::engine::{MaskResult, OpaMap, mul_row};

/// Rectangular clip: opaque inside `area`, transparent outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectMask {
    /// Visible region.
    pub area: Area,
}

impl RectMask {
    pub(crate) fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        let row = Area::new(abs_x, abs_y, abs_x + buf.len() as i32 - 1, abs_y);
        match self.area.intersect(&row) {
            None => {
                buf.fill(OPA_TRANSP);
                MaskResult::Transparent
            }
            Some(vis) if vis == row => MaskResult::FullCover,
            Some(vis) => {
                let lo = (vis.x1 - abs_x) as usize;
                let hi = (vis.x2 - abs_x) as usize;
                buf[..lo].fill(OPA_TRANSP);
                buf[hi + 1..].fill(OPA_TRANSP);
                MaskResult::Changed
            }
        }
    }
}

/// Vertical opacity ramp inside `area`. Pixels outside `area` are left untouched.
///
/// Rows at or above `y_top` get `opa_top`, rows at or below `y_bottom` get `opa_bottom`,
/// and rows in between are interpolated linearly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadeMask {
    /// Region the fade applies to.
    pub area: Area,
    /// Opacity at and above `y_top`.
    pub opa_top: Opa,
    /// Row where the ramp starts.
    pub y_top: i32,
    /// Opacity at and below `y_bottom`.
    pub opa_bottom: Opa,
    /// Row where the ramp ends.
    pub y_bottom: i32,
}

impl FadeMask {
    /// Opacity of row `y` inside the area.
    pub fn row_opa(&self, y: i32) -> Opa {
        if y <= self.y_top {
            return self.opa_top;
        }
        if y >= self.y_bottom {
            return self.opa_bottom;
        }
        let span = i64::from(self.y_bottom - self.y_top);
        let t = i64::from(y - self.y_top);
        let top = i64::from(self.opa_top);
        let bottom = i64::from(self.opa_bottom);
        (top + ((bottom - top) * t + span / 2) / span).clamp(0, 255) as Opa
    }

    pub(crate) fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        if abs_y < self.area.y1 || abs_y > self.area.y2 {
            return MaskResult::FullCover;
        }
        let opa = self.row_opa(abs_y);
        let a = self.area;
        mul_row(buf, |i| {
            let x = abs_x + i as i32;
            if x < a.x1 || x > a.x2 { OPA_COVER } else { opa }
        })
    }
}

/// Explicit coverage bitmap placed at `area`'s top-left corner. Outside the bitmap the
/// coverage is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapMask {
    /// Placement of the bitmap.
    pub area: Area,
    /// Coverage values, row-major.
    pub map: Arc<OpaMap>,
}

impl MapMask {
    pub(crate) fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        let a = self.area;
        let map = &self.map;
        let my = abs_y - a.y1;
        if abs_y < a.y1 || abs_y > a.y2 || my >= map.height() as i32 {
            buf.fill(OPA_TRANSP);
            return MaskResult::Transparent;
        }
        mul_row(buf, |i| {
            let x = abs_x + i as i32;
            let mx = x - a.x1;
            if x < a.x1 || x > a.x2 || mx >= map.width() as i32 {
                OPA_TRANSP
            } else {
                map.get(mx as u32, my as u32)
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/simple.rs"]
mod tests;
