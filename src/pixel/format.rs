use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult};

/// Closed set of pixel encodings shared by callers and decoders.
///
/// The discriminants are the on-disk/wire values used by the `.bin` image header.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum ColorFormat {
    /// Not set; never decodable.
    #[default]
    Unknown = 0,
    /// 32-bit `R, G, B, A`, straight alpha.
    Rgba8888 = 1,
    /// 24-bit `R, G, B`, opaque.
    Rgb888 = 2,
    /// 16-bit little-endian `RRRRRGGG GGGBBBBB`, opaque.
    Rgb565 = 3,
    /// 1-bit palette index.
    I1 = 4,
    /// 2-bit palette index.
    I2 = 5,
    /// 4-bit palette index.
    I4 = 6,
    /// 8-bit palette index.
    I8 = 7,
    /// 1-bit alpha; color comes from the draw call.
    A1 = 8,
    /// 2-bit alpha.
    A2 = 9,
    /// 4-bit alpha.
    A4 = 10,
    /// 8-bit alpha.
    A8 = 11,
    /// Packed `Y0 U Y1 V`.
    Yuy2 = 12,
    /// Planar Y, then U, then V, chroma subsampled 2x2.
    I420 = 13,
    /// Planar Y, then interleaved `U V`, chroma subsampled 2x2.
    Nv12 = 14,
    /// Encoded bytes (PNG, JPEG, ...) for codec decoders.
    Raw = 15,
}

impl ColorFormat {
    /// Parse a wire value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Unknown,
            1 => Self::Rgba8888,
            2 => Self::Rgb888,
            3 => Self::Rgb565,
            4 => Self::I1,
            5 => Self::I2,
            6 => Self::I4,
            7 => Self::I8,
            8 => Self::A1,
            9 => Self::A2,
            10 => Self::A4,
            11 => Self::A8,
            12 => Self::Yuy2,
            13 => Self::I420,
            14 => Self::Nv12,
            15 => Self::Raw,
            _ => return None,
        })
    }

    /// Bits per pixel of the main plane (luma for planar formats, `0` for unknown/raw).
    pub fn bpp(self) -> u32 {
        match self {
            Self::Unknown | Self::Raw => 0,
            Self::Rgba8888 => 32,
            Self::Rgb888 => 24,
            Self::Rgb565 | Self::Yuy2 => 16,
            Self::I1 | Self::A1 => 1,
            Self::I2 | Self::A2 => 2,
            Self::I4 | Self::A4 => 4,
            Self::I8 | Self::A8 | Self::I420 | Self::Nv12 => 8,
        }
    }

    /// Palette-indexed format.
    pub fn is_indexed(self) -> bool {
        matches!(self, Self::I1 | Self::I2 | Self::I4 | Self::I8)
    }

    /// Alpha-only format.
    pub fn is_alpha_only(self) -> bool {
        matches!(self, Self::A1 | Self::A2 | Self::A4 | Self::A8)
    }

    /// Packed or planar video format.
    pub fn is_yuv(self) -> bool {
        matches!(self, Self::Yuy2 | Self::I420 | Self::Nv12)
    }

    /// RGB formats that can be blitted without conversion of the pixel layout.
    pub fn is_true_color(self) -> bool {
        matches!(self, Self::Rgba8888 | Self::Rgb888 | Self::Rgb565)
    }

    /// Rows can be read independently with [`unpack_row`].
    pub fn is_row_addressable(self) -> bool {
        self.is_true_color() || self.is_indexed() || self.is_alpha_only()
    }

    /// Number of palette entries stored in front of the index data.
    pub fn palette_len(self) -> usize {
        if self.is_indexed() {
            1usize << self.bpp()
        } else {
            0
        }
    }

    /// Bytes of one row at the tightest packing.
    pub fn min_stride(self, width: u32) -> u32 {
        match self {
            Self::Unknown | Self::Raw => 0,
            Self::I420 | Self::Nv12 => round_up_even(width),
            Self::Yuy2 => round_up_even(width) * 2,
            _ => (width * self.bpp()).div_ceil(8),
        }
    }

    /// Total buffer size (palette and every plane) for the given geometry.
    pub fn data_size(self, width: u32, height: u32, stride: u32) -> Option<usize> {
        let stride = stride as usize;
        let h = height as usize;
        let body = match self {
            Self::Unknown | Self::Raw => return None,
            Self::I420 | Self::Nv12 => {
                let chroma_rows = h.div_ceil(2);
                stride.checked_mul(h)?.checked_add(stride.checked_mul(chroma_rows)?)?
            }
            _ => stride.checked_mul(h)?,
        };
        body.checked_add(self.palette_len() * 4)
    }
}

fn round_up_even(v: u32) -> u32 {
    v + (v & 1)
}

/// Sampling used when the image is scaled or rotated.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum Sampling {
    /// Nearest neighbour.
    Nearest = 0,
    /// Bilinear with transparent outside.
    #[default]
    Bilinear = 1,
}

/// Geometry and encoding of an image, as reported by a decoder's `info`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageHeader {
    /// Pixel encoding.
    pub color_format: ColorFormat,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Bytes per row of the main plane.
    pub stride: u32,
}

/// Caller-constructed in-memory image.
///
/// `stride <= 0` means "auto": the tightest stride for the format is used. For indexed
/// formats `data` starts with `2^bpp` RGBA palette entries. For [`ColorFormat::Raw`]
/// `data` holds an encoded file and `width`/`height` may be zero until decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Bytes per row, `<= 0` for automatic.
    pub stride: i32,
    /// Pixel encoding.
    pub color_format: ColorFormat,
    /// Preferred sampling when transformed.
    pub sampling: Sampling,
    /// Backing bytes.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Build and validate a buffer with automatic stride.
    pub fn new(
        color_format: ColorFormat,
        width: u16,
        height: u16,
        data: Vec<u8>,
    ) -> BlitResult<Self> {
        let buf = Self {
            width,
            height,
            stride: 0,
            color_format,
            sampling: Sampling::default(),
            data,
        };
        buf.validate()?;
        Ok(buf)
    }

    /// A `width x height` RGBA8888 buffer filled with `color`.
    pub fn filled_rgba(width: u16, height: u16, color: Rgba8) -> Self {
        let px = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            stride: 0,
            color_format: ColorFormat::Rgba8888,
            sampling: Sampling::default(),
            data: color.to_array().repeat(px),
        }
    }

    /// Wrap encoded file bytes (PNG, JPEG, ...).
    pub fn encoded(bytes: Vec<u8>) -> Self {
        Self {
            width: 0,
            height: 0,
            stride: 0,
            color_format: ColorFormat::Raw,
            sampling: Sampling::default(),
            data: bytes,
        }
    }

    /// Effective bytes per row.
    pub fn stride_bytes(&self) -> u32 {
        if self.stride > 0 {
            self.stride as u32
        } else {
            self.color_format.min_stride(u32::from(self.width))
        }
    }

    /// Header as a decoder would report it.
    pub fn header(&self) -> ImageHeader {
        ImageHeader {
            color_format: self.color_format,
            width: self.width,
            height: self.height,
            stride: self.stride_bytes(),
        }
    }

    /// Check that the data is large enough for the declared geometry.
    pub fn validate(&self) -> BlitResult<()> {
        if self.color_format == ColorFormat::Raw {
            if self.data.is_empty() {
                return Err(BlitError::validation("encoded buffer is empty"));
            }
            return Ok(());
        }
        if self.color_format == ColorFormat::Unknown {
            return Err(BlitError::validation("pixel buffer has unknown color format"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(BlitError::validation("pixel buffer must be at least 1x1"));
        }
        let w = u32::from(self.width);
        let stride = self.stride_bytes();
        if stride < self.color_format.min_stride(w) {
            return Err(BlitError::validation(format!(
                "stride {stride} is smaller than the minimum {} for {:?}",
                self.color_format.min_stride(w),
                self.color_format
            )));
        }
        let need = self
            .color_format
            .data_size(w, u32::from(self.height), stride)
            .ok_or_else(|| BlitError::validation("pixel buffer size overflow"))?;
        if self.data.len() < need {
            return Err(BlitError::validation(format!(
                "pixel buffer holds {} bytes, {need} required",
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Palette bytes (RGBA entries) of an indexed buffer.
    pub fn palette(&self) -> Option<&[u8]> {
        let n = self.color_format.palette_len() * 4;
        (n > 0).then(|| &self.data[..n.min(self.data.len())])
    }

    /// Bytes of row `y` of the main plane.
    pub fn row(&self, y: u32) -> BlitResult<&[u8]> {
        let stride = self.stride_bytes() as usize;
        let start = self.color_format.palette_len() * 4 + stride * y as usize;
        self.data
            .get(start..start + stride)
            .ok_or_else(|| BlitError::read_line(format!("row {y} is outside the buffer")))
    }
}

/// Convert `len` pixels starting at `x` of one encoded row into RGBA8888.
///
/// `palette` is required for indexed formats; `color` supplies RGB for alpha-only formats.
pub fn unpack_row(
    color_format: ColorFormat,
    row: &[u8],
    x: u32,
    len: u32,
    palette: Option<&[u8]>,
    color: Rgba8,
    out: &mut [u8],
) -> BlitResult<()> {
    let len = len as usize;
    if out.len() < len * 4 {
        return Err(BlitError::validation("output row buffer is too small"));
    }
    let x = x as usize;
    let bpp = color_format.bpp() as usize;
    let last_bit = (x + len) * bpp;
    if !color_format.is_row_addressable() {
        return Err(BlitError::read_line(format!(
            "{color_format:?} rows cannot be read independently"
        )));
    }
    if row.len() * 8 < last_bit {
        return Err(BlitError::read_line("row is shorter than the requested span"));
    }

    match color_format {
        ColorFormat::Rgba8888 => out[..len * 4].copy_from_slice(&row[x * 4..(x + len) * 4]),
        ColorFormat::Rgb888 => {
            for (o, s) in out[..len * 4]
                .chunks_exact_mut(4)
                .zip(row[x * 3..(x + len) * 3].chunks_exact(3))
            {
                o.copy_from_slice(&[s[0], s[1], s[2], 255]);
            }
        }
        ColorFormat::Rgb565 => {
            for (o, s) in out[..len * 4]
                .chunks_exact_mut(4)
                .zip(row[x * 2..(x + len) * 2].chunks_exact(2))
            {
                let v = u16::from_le_bytes([s[0], s[1]]);
                let r = ((v >> 11) & 0x1f) as u8;
                let g = ((v >> 5) & 0x3f) as u8;
                let b = (v & 0x1f) as u8;
                let (r, g, b) = ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2));
                o.copy_from_slice(&[r, g, b, 255]);
            }
        }
        cf if cf.is_indexed() => {
            let palette =
                palette.ok_or_else(|| BlitError::read_line("indexed row without palette"))?;
            let entries = palette.len() / 4;
            for (i, o) in out[..len * 4].chunks_exact_mut(4).enumerate() {
                let idx = packed_value(row, x + i, bpp) as usize;
                if idx >= entries {
                    return Err(BlitError::read_line(format!("palette index {idx} out of range")));
                }
                o.copy_from_slice(&palette[idx * 4..idx * 4 + 4]);
            }
        }
        cf if cf.is_alpha_only() => {
            let scale: u8 = match bpp {
                1 => 255,
                2 => 85,
                4 => 17,
                _ => 1,
            };
            for (i, o) in out[..len * 4].chunks_exact_mut(4).enumerate() {
                let a = packed_value(row, x + i, bpp) * scale;
                o.copy_from_slice(&[color.r, color.g, color.b, a]);
            }
        }
        other => {
            return Err(BlitError::read_line(format!("unsupported row format {other:?}")));
        }
    }
    Ok(())
}

/// Read the `idx`-th `bpp`-bit value of a MSB-first packed row.
fn packed_value(row: &[u8], idx: usize, bpp: usize) -> u8 {
    let bit = idx * bpp;
    let byte = row[bit / 8];
    let shift = 8 - bpp - (bit % 8);
    let mask = ((1u16 << bpp) - 1) as u8;
    (byte >> shift) & mask
}

/// Convert a whole YUV buffer into tightly packed RGBA8888 (BT.601, limited range).
pub fn yuv_to_rgba(buf: &PixelBuffer) -> BlitResult<Vec<u8>> {
    buf.validate()?;
    let w = usize::from(buf.width);
    let h = usize::from(buf.height);
    let stride = buf.stride_bytes() as usize;
    let mut out = try_alloc_bytes(w * h * 4)?;
    let data = &buf.data;

    for y in 0..h {
        for x in 0..w {
            let (luma, u, v) = match buf.color_format {
                ColorFormat::Yuy2 => {
                    let base = y * stride + (x / 2) * 4;
                    let luma = data[base + (x % 2) * 2];
                    (luma, data[base + 1], data[base + 3])
                }
                ColorFormat::I420 => {
                    let y_plane = stride * h;
                    let c_stride = stride / 2;
                    let c_plane = c_stride * h.div_ceil(2);
                    let ci = (y / 2) * c_stride + x / 2;
                    (data[y * stride + x], data[y_plane + ci], data[y_plane + c_plane + ci])
                }
                ColorFormat::Nv12 => {
                    let y_plane = stride * h;
                    let ci = y_plane + (y / 2) * stride + (x / 2) * 2;
                    (data[y * stride + x], data[ci], data[ci + 1])
                }
                other => {
                    return Err(BlitError::validation(format!("{other:?} is not a YUV format")));
                }
            };
            let [r, g, b] = yuv_to_rgb(luma, u, v);
            out[(y * w + x) * 4..(y * w + x) * 4 + 4].copy_from_slice(&[r, g, b, 255]);
        }
    }
    Ok(out)
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = i32::from(y) - 16;
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(298 * c + 409 * e),
        clamp(298 * c - 100 * d - 208 * e),
        clamp(298 * c + 516 * d),
    ]
}

/// Zeroed byte buffer whose allocation failure is reported instead of aborting.
pub(crate) fn try_alloc_bytes(len: usize) -> BlitResult<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| BlitError::alloc(format!("{len} byte buffer: {e}")))?;
    v.resize(len, 0);
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/format.rs"]
mod tests;
