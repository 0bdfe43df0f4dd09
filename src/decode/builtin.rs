use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::decode::registry::{DecodedImage, DecoderSession, ImageDecoder};
use crate::decode::source::ImageSource;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult};
use crate::pixel::format::{
    ColorFormat, ImageHeader, PixelBuffer, try_alloc_bytes, unpack_row, yuv_to_rgba,
};

/// Size of the packed `.bin` header word.
pub const BIN_HEADER_LEN: usize = 4;
/// Largest width or height a `.bin` header can carry.
pub const BIN_MAX_DIM: u16 = (1 << 11) - 1;

/// Decoder for caller-constructed pixel buffers and `.bin` image files.
///
/// Memory sources: true-color buffers are used in place, indexed buffers are expanded to
/// RGBA8888 at open time, YUV buffers are converted at open time and alpha-only buffers
/// are colored row by row through `read_line`. Files always use `read_line`, except YUV
/// files which are converted whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinDecoder;

struct BinFile {
    file: File,
    color_format: ColorFormat,
    palette: Vec<u8>,
    data_offset: u64,
    stride: u32,
    row: Vec<u8>,
}

impl ImageDecoder for BuiltinDecoder {
    fn name(&self) -> &str {
        "builtin"
    }

    fn info(&self, src: &ImageSource) -> BlitResult<ImageHeader> {
        match src {
            ImageSource::Memory(buf) => {
                if matches!(buf.color_format, ColorFormat::Unknown | ColorFormat::Raw) {
                    return Err(BlitError::no_decoder("not a pixel buffer"));
                }
                buf.validate()
                    .map_err(|e| BlitError::decode_open(e.to_string()))?;
                Ok(buf.header())
            }
            ImageSource::File(path) => {
                if !is_bin_path(path) {
                    return Err(BlitError::no_decoder("not a .bin file"));
                }
                let mut f = File::open(path).map_err(|e| {
                    BlitError::decode_open(format!("open '{}': {e}", path.display()))
                })?;
                read_bin_header(&mut f)
            }
            ImageSource::Symbol(_) => Ok(ImageHeader {
                color_format: ColorFormat::A8,
                width: 1,
                height: 1,
                stride: 1,
            }),
        }
    }

    fn open(&self, session: &mut DecoderSession) -> BlitResult<()> {
        match session.src.clone() {
            ImageSource::Memory(buf) => {
                let cf = buf.color_format;
                if cf.is_true_color() {
                    session.decoded = Some(DecodedImage::Shared(buf));
                } else if cf.is_indexed() {
                    session.decoded = Some(DecodedImage::Owned(expand_indexed(&buf)?));
                } else if cf.is_yuv() {
                    let data = yuv_to_rgba(&buf)?;
                    let out = PixelBuffer::new(ColorFormat::Rgba8888, buf.width, buf.height, data)?;
                    session.decoded = Some(DecodedImage::Owned(out));
                } else if !cf.is_alpha_only() {
                    return Err(BlitError::decode_open(format!("unsupported format {cf:?}")));
                }
                Ok(())
            }
            ImageSource::File(path) => open_bin_file(&path, session),
            ImageSource::Symbol(text) => Err(BlitError::decode_open(format!(
                "symbol '{text}' has no bitmap"
            ))),
        }
    }

    fn read_line(
        &self,
        session: &mut DecoderSession,
        x: u32,
        y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        let color = session.color;
        if let ImageSource::Memory(buf) = &session.src {
            let row = buf.row(y)?;
            return unpack_row(buf.color_format, row, x, len, buf.palette(), color, out);
        }
        let state = session
            .user_data
            .as_mut()
            .and_then(|d| d.downcast_mut::<BinFile>())
            .ok_or_else(|| BlitError::read_line("no open .bin file"))?;
        let offset = state.data_offset + u64::from(y) * u64::from(state.stride);
        state
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| state.file.read_exact(&mut state.row))
            .map_err(|e| BlitError::read_line(format!("row {y}: {e}")))?;
        let palette = (!state.palette.is_empty()).then_some(state.palette.as_slice());
        unpack_row(state.color_format, &state.row, x, len, palette, color, out)
    }

    fn close(&self, session: &mut DecoderSession) {
        session.user_data = None;
        session.decoded = None;
    }
}

fn is_bin_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("bin"))
}

/// Pack a `.bin` header word: format in bits 0..5, width in bits 10..21, height in bits 21..32.
pub fn pack_bin_header(color_format: ColorFormat, width: u16, height: u16) -> u32 {
    (color_format as u32 & 0x1f)
        | ((u32::from(width) & 0x7ff) << 10)
        | ((u32::from(height) & 0x7ff) << 21)
}

/// Inverse of [`pack_bin_header`].
pub fn unpack_bin_header(word: u32) -> BlitResult<ImageHeader> {
    let cf = ColorFormat::from_u8((word & 0x1f) as u8)
        .filter(|cf| !matches!(cf, ColorFormat::Unknown | ColorFormat::Raw))
        .ok_or_else(|| BlitError::decode_open(format!("bad color format in header {word:#010x}")))?;
    let width = ((word >> 10) & 0x7ff) as u16;
    let height = ((word >> 21) & 0x7ff) as u16;
    if width == 0 || height == 0 {
        return Err(BlitError::decode_open("zero sized .bin image"));
    }
    Ok(ImageHeader {
        color_format: cf,
        width,
        height,
        stride: cf.min_stride(u32::from(width)),
    })
}

fn read_bin_header(f: &mut File) -> BlitResult<ImageHeader> {
    let mut word = [0u8; BIN_HEADER_LEN];
    f.read_exact(&mut word)
        .map_err(|e| BlitError::decode_open(format!("read .bin header: {e}")))?;
    unpack_bin_header(u32::from_le_bytes(word))
}

fn open_bin_file(path: &Path, session: &mut DecoderSession) -> BlitResult<()> {
    let mut file = File::open(path)
        .map_err(|e| BlitError::decode_open(format!("open '{}': {e}", path.display())))?;
    let header = read_bin_header(&mut file)?;
    let cf = header.color_format;
    session.header = header;

    if cf.is_yuv() {
        let size = cf
            .data_size(u32::from(header.width), u32::from(header.height), header.stride)
            .ok_or_else(|| BlitError::decode_open("image size overflow"))?;
        let mut data = try_alloc_bytes(size)?;
        file.read_exact(&mut data)
            .map_err(|e| BlitError::decode_open(format!("truncated YUV data: {e}")))?;
        let yuv = PixelBuffer::new(cf, header.width, header.height, data)?;
        let rgba = PixelBuffer::new(
            ColorFormat::Rgba8888,
            header.width,
            header.height,
            yuv_to_rgba(&yuv)?,
        )?;
        session.decoded = Some(DecodedImage::Owned(rgba));
        return Ok(());
    }

    let mut palette = vec![0u8; cf.palette_len() * 4];
    file.read_exact(&mut palette)
        .map_err(|e| BlitError::decode_open(format!("truncated palette: {e}")))?;
    let data_offset = (BIN_HEADER_LEN + palette.len()) as u64;
    session.user_data = Some(Box::new(BinFile {
        file,
        color_format: cf,
        palette,
        data_offset,
        stride: header.stride,
        row: try_alloc_bytes(header.stride as usize)?,
    }));
    Ok(())
}

fn expand_indexed(buf: &PixelBuffer) -> BlitResult<PixelBuffer> {
    if buf.width == 0 || buf.height == 0 {
        return Err(BlitError::decode_open("indexed image has no pixels"));
    }
    let w = u32::from(buf.width);
    let row_bytes = w as usize * 4;
    let mut data = try_alloc_bytes(row_bytes * usize::from(buf.height))?;
    let palette = buf.palette();
    for (y, out) in data.chunks_exact_mut(row_bytes).enumerate() {
        let row = buf.row(y as u32)?;
        unpack_row(buf.color_format, row, 0, w, palette, Rgba8::BLACK, out)
            .map_err(|e| BlitError::decode_open(format!("palette expansion: {e}")))?;
    }
    PixelBuffer::new(ColorFormat::Rgba8888, buf.width, buf.height, data)
}

/// Serialize a buffer into the `.bin` file layout read by [`BuiltinDecoder`].
pub fn encode_bin_image(buf: &PixelBuffer) -> BlitResult<Vec<u8>> {
    buf.validate()?;
    let cf = buf.color_format;
    if cf == ColorFormat::Raw {
        return Err(BlitError::validation("encoded buffers cannot be stored as .bin"));
    }
    if buf.width > BIN_MAX_DIM || buf.height > BIN_MAX_DIM {
        return Err(BlitError::validation(format!(
            "{}x{} exceeds the .bin limit of {BIN_MAX_DIM}",
            buf.width, buf.height
        )));
    }
    let w = u32::from(buf.width);
    let h = u32::from(buf.height);
    let min_stride = cf.min_stride(w);

    let mut out = Vec::with_capacity(BIN_HEADER_LEN + buf.data.len());
    out.extend_from_slice(&pack_bin_header(cf, buf.width, buf.height).to_le_bytes());
    if let Some(p) = buf.palette() {
        out.extend_from_slice(p);
    }
    if cf.is_row_addressable() {
        for y in 0..h {
            out.extend_from_slice(&buf.row(y)?[..min_stride as usize]);
        }
    } else {
        if buf.stride_bytes() != min_stride {
            return Err(BlitError::validation("YUV .bin images need a tight stride"));
        }
        let size = cf
            .data_size(w, h, min_stride)
            .ok_or_else(|| BlitError::validation("image size overflow"))?;
        out.extend_from_slice(&buf.data[..size]);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/decode/builtin.rs"]
mod tests;
