use super::*;
use crate::foundation::core::Rgba8;

#[test]
fn file_identity_follows_path_content() {
    assert_eq!(
        ImageSource::file("a/b.bin").id(),
        ImageSource::File(PathBuf::from("a/b.bin")).id()
    );
    assert_ne!(ImageSource::file("a/b.bin").id(), ImageSource::file("a/c.bin").id());
}

#[test]
fn memory_identity_follows_the_buffer_not_its_content() {
    let a = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::WHITE));
    let b = ImageSource::memory(PixelBuffer::filled_rgba(1, 1, Rgba8::WHITE));
    assert_ne!(a.id(), b.id());
    assert_eq!(a.id(), a.clone().id());
}

#[test]
fn kinds_do_not_collide() {
    assert_ne!(ImageSource::symbol("x").id(), ImageSource::file("x").id());
    assert!(ImageSource::symbol("ok").to_string().contains("symbol"));
}
