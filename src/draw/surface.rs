use crate::foundation::area::Area;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult};
use crate::pixel::blend::premultiply_rgba8_in_place;
use crate::pixel::format::try_alloc_bytes;

/// Straight-alpha RGBA8 pixel storage with its origin at `(0, 0)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> BlitResult<Self> {
        if width == 0 || height == 0 {
            return Err(BlitError::validation("surface must be at least 1x1"));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BlitError::validation("surface size overflow"))?;
        Ok(Self {
            width,
            height,
            data: try_alloc_bytes(len)?,
        })
    }

    /// Surface filled with `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> BlitResult<Self> {
        let mut s = Self::new(width, height)?;
        s.clear(color);
        Ok(s)
    }

    /// Wrap existing straight RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> BlitResult<Self> {
        if data.len() as u64 != u64::from(width) * u64::from(height) * 4 || data.is_empty() {
            return Err(BlitError::validation(
                "surface data must hold width*height*4 bytes",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Full extent as an area.
    pub fn area(&self) -> Area {
        Area::from_size(0, 0, self.width as i32, self.height as i32)
    }

    /// Pixel at `(x, y)`; transparent outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Rgba8::TRANSPARENT;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba8::from_slice(&self.data[i..i + 4])
    }

    /// Overwrite the pixel at `(x, y)`; ignored outside the surface.
    pub fn set_pixel(&mut self, x: i32, y: i32, c: Rgba8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&c.to_array());
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        &self.data[y as usize * stride..(y as usize + 1) * stride]
    }

    /// Bytes of pixels `x1..=x2` of row `y`. The span must lie inside the surface.
    pub fn span_mut(&mut self, y: i32, x1: i32, x2: i32) -> &mut [u8] {
        let stride = self.width as usize * 4;
        let base = y as usize * stride;
        &mut self.data[base + x1 as usize * 4..base + (x2 as usize + 1) * 4]
    }

    /// Overwrite every pixel.
    pub fn clear(&mut self, color: Rgba8) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Raw straight RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Take the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Copy of the pixels in premultiplied form.
    pub fn to_premultiplied(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        premultiply_rgba8_in_place(&mut out);
        out
    }

    /// Export for saving or inspection with the `image` crate.
    pub fn to_image(&self) -> BlitResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| BlitError::validation("surface does not fit an RgbaImage"))
    }

    /// Import from the `image` crate.
    pub fn from_image(img: image::RgbaImage) -> BlitResult<Self> {
        let (w, h) = img.dimensions();
        Self::from_rgba(w, h, img.into_raw())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/surface.rs"]
mod tests;
