use kurbo::{Affine, Rect, Vec2};

use crate::draw::dsc::{ImageDrawDsc, ZOOM_NONE};
use crate::foundation::area::Area;
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{BlitError, BlitResult};
use crate::pixel::format::Sampling;

/// Image space (`0..w`, `0..h`) to target space for an image whose top-left is `origin`.
///
/// Rotation is clockwise on screen, about `dsc.pivot` (or the image center).
pub(crate) fn image_matrix(origin: Point, width: u32, height: u32, dsc: &ImageDrawDsc) -> Affine {
    let pivot = match dsc.pivot {
        Some(p) => Vec2::new(f64::from(p.x), f64::from(p.y)),
        None => Vec2::new(f64::from(width) / 2.0, f64::from(height) / 2.0),
    };
    let angle = (f64::from(dsc.angle) / 10.0).to_radians();
    let scale = f64::from(dsc.zoom) / f64::from(ZOOM_NONE);
    let origin = Vec2::new(f64::from(origin.x), f64::from(origin.y));
    Affine::translate(origin + pivot)
        * Affine::rotate(angle)
        * Affine::scale(scale)
        * Affine::translate(-pivot)
}

/// Pixels touched by a `width x height` image drawn through `m`.
pub(crate) fn transformed_area(m: Affine, width: u32, height: u32) -> Area {
    let bbox = m.transform_rect_bbox(Rect::new(0.0, 0.0, f64::from(width), f64::from(height)));
    // Snap away trig noise so exact quarter turns land on whole pixels.
    let snap = |v: f64| (v * 1e6).round() / 1e6;
    Area::new(
        snap(bbox.x0).floor() as i32,
        snap(bbox.y0).floor() as i32,
        snap(bbox.x1).ceil() as i32 - 1,
        snap(bbox.y1).ceil() as i32 - 1,
    )
}

/// Inverse of `m`, or `NonInvertibleTransform` when it collapses the plane.
pub(crate) fn checked_inverse(m: Affine) -> BlitResult<Affine> {
    if !m.determinant().is_finite() || m.determinant().abs() < 1e-9 {
        return Err(BlitError::NonInvertibleTransform);
    }
    Ok(m.inverse())
}

/// Borrowed tightly packed straight-alpha RGBA8888 image.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RgbaView<'a> {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: &'a [u8],
}

impl RgbaView<'_> {
    fn texel(&self, x: i64, y: i64) -> Rgba8 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return Rgba8::TRANSPARENT;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba8::from_slice(&self.data[i..i + 4])
    }

    /// Sample at image-space position `(u, v)`; pixel centers sit at `i + 0.5`.
    pub(crate) fn sample(&self, u: f64, v: f64, sampling: Sampling) -> Rgba8 {
        match sampling {
            Sampling::Nearest => self.texel(u.floor() as i64, v.floor() as i64),
            Sampling::Bilinear => self.bilinear(u - 0.5, v - 0.5),
        }
    }

    fn bilinear(&self, x: f64, y: f64) -> Rgba8 {
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let taps = [
            (self.texel(x0, y0), (1.0 - fx) * (1.0 - fy)),
            (self.texel(x0 + 1, y0), fx * (1.0 - fy)),
            (self.texel(x0, y0 + 1), (1.0 - fx) * fy),
            (self.texel(x0 + 1, y0 + 1), fx * fy),
        ];
        // Interpolate premultiplied so transparent neighbours do not darken edges.
        let mut acc = [0.0f64; 4];
        for (t, w) in taps {
            let a = f64::from(t.a) * w;
            acc[0] += f64::from(t.r) * a;
            acc[1] += f64::from(t.g) * a;
            acc[2] += f64::from(t.b) * a;
            acc[3] += a;
        }
        if acc[3] < 0.5 {
            return Rgba8::TRANSPARENT;
        }
        let c = |v: f64| (v / acc[3]).round().clamp(0.0, 255.0) as u8;
        Rgba8::new(c(acc[0]), c(acc[1]), c(acc[2]), acc[3].round().clamp(0.0, 255.0) as u8)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/transform.rs"]
mod tests;
