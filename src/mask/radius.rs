use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, OPA_TRANSP, Opa, RADIUS_CIRCLE};
use crate::mask::engine::{MaskResult, mul_row};

/// Rounded-rectangle mask.
///
/// With `inner == true` coverage is opaque inside the rounded rectangle and transparent
/// outside; with `inner == false` it is the complement (used to cut rings).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadiusMask {
    /// Rectangle the rounded shape is inscribed in.
    pub area: Area,
    /// Corner radius, or [`RADIUS_CIRCLE`] for the largest radius the area allows.
    pub radius: i32,
    /// Opaque inside (`true`) or outside (`false`).
    pub inner: bool,
}

impl RadiusMask {
    /// Build a radius mask.
    pub fn new(area: Area, radius: i32, inner: bool) -> Self {
        Self {
            area,
            radius,
            inner,
        }
    }

    /// Radius after clamping to half of the short side.
    pub fn effective_radius(&self) -> i32 {
        let short = self.area.width().min(self.area.height());
        let r = if self.radius == RADIUS_CIRCLE {
            short / 2
        } else {
            self.radius
        };
        r.clamp(0, short / 2)
    }

    /// Coverage of pixel `(x, y)`.
    pub fn coverage(&self, x: i32, y: i32) -> Opa {
        let c = self.inner_coverage(self.effective_radius(), x, y);
        if self.inner { c } else { OPA_COVER - c }
    }

    fn inner_coverage(&self, r: i32, x: i32, y: i32) -> Opa {
        let a = &self.area;
        if x < a.x1 || x > a.x2 || y < a.y1 || y > a.y2 {
            return OPA_TRANSP;
        }
        let u0 = if x < a.x1 + r {
            a.x1 + r - x - 1
        } else if x > a.x2 - r {
            x - (a.x2 - r + 1)
        } else {
            return OPA_COVER;
        };
        let v0 = if y < a.y1 + r {
            a.y1 + r - y - 1
        } else if y > a.y2 - r {
            y - (a.y2 - r + 1)
        } else {
            return OPA_COVER;
        };
        circle_cell_coverage(u0, v0, r)
    }

    pub(crate) fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        let a = &self.area;
        let last_x = abs_x + buf.len() as i32 - 1;
        if abs_y < a.y1 || abs_y > a.y2 || last_x < a.x1 || abs_x > a.x2 {
            if self.inner {
                buf.fill(OPA_TRANSP);
                return MaskResult::Transparent;
            }
            return MaskResult::FullCover;
        }
        let r = self.effective_radius();
        mul_row(buf, |i| {
            let c = self.inner_coverage(r, abs_x + i as i32, abs_y);
            if self.inner { c } else { OPA_COVER - c }
        })
    }
}

/// Exact area of the unit cell `[u0, u0+1] x [v0, v0+1]` that lies inside the circle of
/// radius `r` centred at the origin, scaled to `0..=255`.
///
/// `u0` and `v0` are the cell's distances from the arc centre along each axis.
pub(crate) fn circle_cell_coverage(u0: i32, v0: i32, r: i32) -> Opa {
    if u0 >= r || v0 >= r {
        return OPA_TRANSP;
    }
    let r2 = i64::from(r) * i64::from(r);
    let far_u = i64::from(u0) + 1;
    let far_v = i64::from(v0) + 1;
    if far_u * far_u + far_v * far_v <= r2 {
        return OPA_COVER;
    }

    let r = f64::from(r);
    let r2 = r * r;
    let u0 = f64::from(u0);
    let v0 = f64::from(v0);
    let u1 = u0 + 1.0;

    // Below `ua` the arc stays above the cell top, beyond `ub` it is below the cell bottom.
    let ua = if v0 + 1.0 <= r {
        (r2 - (v0 + 1.0) * (v0 + 1.0)).sqrt()
    } else {
        0.0
    };
    let ub = (r2 - v0 * v0).max(0.0).sqrt();

    let full = (ua.min(u1) - u0).max(0.0);
    let lo = u0.max(ua);
    let hi = u1.min(ub);
    let partial = if hi > lo {
        arc_integral(hi, r) - arc_integral(lo, r) - v0 * (hi - lo)
    } else {
        0.0
    };
    let area = (full + partial).clamp(0.0, 1.0);
    (area * 255.0).round() as Opa
}

/// Antiderivative of `sqrt(r^2 - u^2)`.
fn arc_integral(u: f64, r: f64) -> f64 {
    let u = u.clamp(-r, r);
    0.5 * (u * (r * r - u * u).max(0.0).sqrt() + r * r * (u / r).asin())
}

#[cfg(test)]
#[path = "../../tests/unit/mask/radius.rs"]
mod tests;
