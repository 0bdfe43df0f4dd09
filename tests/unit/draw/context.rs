use super::*;
use crate::pixel::format::{ColorFormat, PixelBuffer};

fn ctx(cache: usize) -> DrawContext {
    DrawContext::new(&RendererOpts {
        image_cache_size: cache,
        ..Default::default()
    })
}

#[test]
fn fetch_row_reads_shared_true_color_buffers() {
    let mut c = ctx(4);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(3, 2, Rgba8::rgb(9, 8, 7)));
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    let mut row = [0u8; 8];
    c.fetch_row(h, 1, 1, 2, &mut row).unwrap();
    assert_eq!(row, [9, 8, 7, 255, 9, 8, 7, 255]);
    assert_eq!(c.header(h).unwrap().width, 3);
}

#[test]
fn alpha_only_rows_take_the_open_color() {
    let mut c = ctx(4);
    let buf = PixelBuffer::new(ColorFormat::A8, 2, 1, vec![0, 200]).unwrap();
    let src = ImageSource::memory(buf);
    let h = c.open_image(&src, Rgba8::rgb(1, 2, 3), 0).unwrap();
    let rgba = c.load_rgba(h, Rgba8::BLACK, 0).unwrap();
    assert_eq!(rgba, vec![1, 2, 3, 0, 1, 2, 3, 200]);
}

#[test]
fn load_rgba_applies_recolor() {
    let mut c = ctx(4);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::rgb(0, 0, 0)));
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    let rgba = c.load_rgba(h, Rgba8::rgb(255, 255, 255), 255).unwrap();
    assert_eq!(rgba, vec![255, 255, 255, 255]);
}

#[test]
fn uncached_sessions_are_released_after_use() {
    let mut c = ctx(0);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::WHITE));
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    assert_eq!(c.images().len(), 1);
    c.finish_image(h);
    assert!(c.images().is_empty());
}

#[test]
fn errors_are_recorded_until_taken() {
    let mut c = ctx(4);
    let err = c.open_image(&ImageSource::symbol("x"), Rgba8::BLACK, 0).unwrap_err();
    assert_eq!(c.record(&err), ErrorCode::DecodeOpenFailed);
    assert_eq!(c.last_error(), Some(ErrorCode::DecodeOpenFailed));
    assert_eq!(c.take_last_error(), Some(ErrorCode::DecodeOpenFailed));
    assert_eq!(c.last_error(), None);
}

#[test]
fn invalidate_drops_cached_decodes() {
    let mut c = ctx(4);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::WHITE));
    c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    c.open_image(&src, Rgba8::WHITE, 0).unwrap();
    assert_eq!(c.invalidate_src(&src), 2);
    assert!(c.images().is_empty());
}

#[test]
fn transformed_pixels_are_decoded_once_per_key() {
    let mut c = ctx(4);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(2, 2, Rgba8::rgb(4, 5, 6)));
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    let a = c.shared_rgba(h, Rgba8::BLACK, 0).unwrap();
    let b = c.shared_rgba(h, Rgba8::BLACK, 0).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(&a[..4], &[4, 5, 6, 255]);

    let tinted = c.shared_rgba(h, Rgba8::BLACK, 255).unwrap();
    assert!(!Arc::ptr_eq(&a, &tinted));
    assert_eq!(c.decoded_images(), 2);

    c.invalidate_src(&src);
    assert_eq!(c.decoded_images(), 0);
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    assert!(!Arc::ptr_eq(&a, &c.shared_rgba(h, Rgba8::BLACK, 0).unwrap()));
}

#[test]
fn disabled_cache_keeps_no_pixels() {
    let mut c = ctx(0);
    let src = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::WHITE));
    let h = c.open_image(&src, Rgba8::BLACK, 0).unwrap();
    let a = c.shared_rgba(h, Rgba8::BLACK, 0).unwrap();
    assert_eq!(a.len(), 4);
    assert_eq!(c.decoded_images(), 0);
}
