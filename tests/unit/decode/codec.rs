use super::*;
use crate::decode::registry::DecoderRegistry;
use crate::foundation::core::Rgba8;

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 128]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn encoded_memory_is_decoded_to_rgba() {
    let src = ImageSource::memory(PixelBuffer::encoded(png_bytes()));
    let r = DecoderRegistry::with_builtin();
    let h = r.get_info(&src).unwrap();
    assert_eq!((h.width, h.height, h.stride), (2, 1, 8));

    let s = r.open(&src, Rgba8::WHITE, 0).unwrap();
    let out = s.decoded.as_ref().unwrap().buffer();
    assert_eq!(out.data, vec![255, 0, 0, 255, 0, 255, 0, 128]);
}

#[test]
fn png_files_are_decoded() {
    let path = std::env::temp_dir().join(format!("blitkit-{}-codec.png", std::process::id()));
    std::fs::write(&path, png_bytes()).unwrap();
    let s = DecoderRegistry::with_builtin()
        .open(&ImageSource::file(&path), Rgba8::WHITE, 0)
        .unwrap();
    assert_eq!(s.header.width, 2);
    std::fs::remove_file(&path).ok();
}

#[test]
fn garbage_and_other_frames_are_rejected() {
    let d = CodecDecoder;
    let junk = ImageSource::memory(PixelBuffer::encoded(vec![1, 2, 3, 4]));
    assert!(matches!(d.info(&junk), Err(BlitError::NoDecoder(_))));

    let mut s = DecoderSession::new(
        ImageSource::memory(PixelBuffer::encoded(png_bytes())),
        Rgba8::WHITE,
        3,
    );
    assert!(d.open(&mut s).is_err());
}
