use crate::foundation::core::{OPA_COVER, OPA_TRANSP, Opa, Point};
use crate::mask::engine::{MaskResult, mul_row};

const SUBSAMPLES: i32 = 4;

/// Angular wedge around a center pixel.
///
/// Angles are in degrees, `0` pointing right and increasing clockwise (toward +y). The
/// wedge runs from `start` to `end` in the increasing direction, so `start = 350,
/// end = 10` is a 20 degree wedge across the positive x axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleMask {
    /// Apex pixel; angles are measured from its center.
    pub center: Point,
    /// Start angle in degrees.
    pub start: f32,
    /// End angle in degrees.
    pub end: f32,
}

impl AngleMask {
    /// Build an angle mask.
    pub fn new(center: Point, start: f32, end: f32) -> Self {
        Self { center, start, end }
    }

    fn span(&self) -> f64 {
        let raw = f64::from(self.end) - f64::from(self.start);
        if raw.abs() >= 360.0 {
            return 360.0;
        }
        raw.rem_euclid(360.0)
    }

    /// `true` when the direction `deg` lies inside the wedge (edges included).
    pub fn contains_angle(&self, deg: f64) -> bool {
        let span = self.span();
        if span >= 360.0 {
            return true;
        }
        let rel = (deg - f64::from(self.start)).rem_euclid(360.0);
        rel <= span
    }

    fn contains_offset(&self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return true;
        }
        self.contains_angle(dy.atan2(dx).to_degrees())
    }

    /// Coverage of pixel `(x, y)`: binary away from the rays, 4x4 supersampled near them.
    pub fn coverage(&self, x: i32, y: i32) -> Opa {
        let span = self.span();
        if span >= 360.0 {
            return OPA_COVER;
        }
        let dx = f64::from(x - self.center.x);
        let dy = f64::from(y - self.center.y);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 1.5 {
            let deg = dy.atan2(dx).to_degrees();
            let clearance = ray_distance(deg, f64::from(self.start), dist)
                .min(ray_distance(deg, f64::from(self.end), dist));
            if clearance > 1.0 {
                return if self.contains_angle(deg) {
                    OPA_COVER
                } else {
                    OPA_TRANSP
                };
            }
        }

        let mut hits = 0u32;
        for sy in 0..SUBSAMPLES {
            for sx in 0..SUBSAMPLES {
                let ox = (f64::from(sx) + 0.5) / f64::from(SUBSAMPLES) - 0.5;
                let oy = (f64::from(sy) + 0.5) / f64::from(SUBSAMPLES) - 0.5;
                if self.contains_offset(dx + ox, dy + oy) {
                    hits += 1;
                }
            }
        }
        let total = (SUBSAMPLES * SUBSAMPLES) as u32;
        ((hits * 255 + total / 2) / total) as Opa
    }

    pub(crate) fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        if self.span() >= 360.0 {
            return MaskResult::FullCover;
        }
        mul_row(buf, |i| self.coverage(abs_x + i as i32, abs_y))
    }
}

/// Distance from a point at angle `deg` and radius `dist` to the ray at angle `ray_deg`.
fn ray_distance(deg: f64, ray_deg: f64, dist: f64) -> f64 {
    let diff = (deg - ray_deg).rem_euclid(360.0);
    let diff = diff.min(360.0 - diff);
    if diff >= 90.0 {
        return dist;
    }
    dist * diff.to_radians().sin()
}

#[cfg(test)]
#[path = "../../tests/unit/mask/angle.rs"]
mod tests;
