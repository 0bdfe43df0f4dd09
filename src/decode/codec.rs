use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::decode::registry::{DecodedImage, DecoderSession, ImageDecoder};
use crate::decode::source::ImageSource;
use crate::foundation::error::{BlitError, BlitResult};
use crate::pixel::format::{ColorFormat, ImageHeader, PixelBuffer};

/// Decoder for encoded image files (PNG, JPEG, BMP, ...) backed by the `image` crate.
///
/// Handles file sources whose extension names a known format and in-memory
/// [`ColorFormat::Raw`] buffers. Output is always RGBA8888 and decoded at open time.
#[derive(Clone, Copy, Debug, Default)]
pub struct CodecDecoder;

impl ImageDecoder for CodecDecoder {
    fn name(&self) -> &str {
        "codec"
    }

    fn info(&self, src: &ImageSource) -> BlitResult<ImageHeader> {
        let (w, h) = match src {
            ImageSource::File(path) => {
                if image::ImageFormat::from_path(path).is_err() {
                    return Err(BlitError::no_decoder("unknown image extension"));
                }
                image::ImageReader::open(path)
                    .with_context(|| format!("open image '{}'", path.display()))?
                    .with_guessed_format()
                    .context("guess image format")?
                    .into_dimensions()
                    .context("read image dimensions")?
            }
            ImageSource::Memory(buf) if buf.color_format == ColorFormat::Raw => {
                if image::guess_format(&buf.data).is_err() {
                    return Err(BlitError::no_decoder("unrecognized encoded bytes"));
                }
                image::ImageReader::new(Cursor::new(buf.data.as_slice()))
                    .with_guessed_format()
                    .context("guess image format")?
                    .into_dimensions()
                    .context("read image dimensions")?
            }
            _ => return Err(BlitError::no_decoder("not an encoded image")),
        };
        header_for(w, h)
    }

    fn open(&self, session: &mut DecoderSession) -> BlitResult<()> {
        if session.frame_id != 0 {
            return Err(BlitError::decode_open(format!(
                "frame {} requested from a still image",
                session.frame_id
            )));
        }
        let img = match &session.src {
            ImageSource::File(path) => load_file(path)?,
            ImageSource::Memory(buf) => {
                image::load_from_memory(&buf.data).context("decode image from memory")?
            }
            ImageSource::Symbol(_) => return Err(BlitError::no_decoder("not an encoded image")),
        };
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let header = header_for(w, h)?;
        let buf = PixelBuffer::new(
            ColorFormat::Rgba8888,
            header.width,
            header.height,
            rgba.into_raw(),
        )?;
        session.header = header;
        session.decoded = Some(DecodedImage::Owned(buf));
        Ok(())
    }
}

fn load_file(path: &Path) -> BlitResult<image::DynamicImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .context("guess image format")?
        .decode()
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img)
}

fn header_for(w: u32, h: u32) -> BlitResult<ImageHeader> {
    let (Ok(width), Ok(height)) = (u16::try_from(w), u16::try_from(h)) else {
        return Err(BlitError::decode_open(format!("{w}x{h} image is too large")));
    };
    Ok(ImageHeader {
        color_format: ColorFormat::Rgba8888,
        width,
        height,
        stride: w * 4,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/decode/codec.rs"]
mod tests;
