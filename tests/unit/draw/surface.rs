use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2).unwrap();
    assert_eq!(s.as_bytes().len(), 24);
    assert!(s.as_bytes().iter().all(|&b| b == 0));
    assert_eq!(s.area(), Area::new(0, 0, 2, 1));
}

#[test]
fn zero_sized_surface_is_rejected() {
    assert!(Surface::new(0, 4).is_err());
    assert!(Surface::from_rgba(2, 2, vec![0; 15]).is_err());
}

#[test]
fn pixel_access_ignores_out_of_bounds() {
    let mut s = Surface::new(2, 2).unwrap();
    s.set_pixel(1, 1, Rgba8::rgb(1, 2, 3));
    s.set_pixel(5, 5, Rgba8::WHITE);
    assert_eq!(s.pixel(1, 1), Rgba8::rgb(1, 2, 3));
    assert_eq!(s.pixel(-1, 0), Rgba8::TRANSPARENT);
    assert_eq!(s.span_mut(1, 1, 1), &[1, 2, 3, 255]);
}

#[test]
fn image_round_trip_and_premultiply() {
    let s = Surface::filled(2, 1, Rgba8::new(255, 0, 0, 128)).unwrap();
    let img = s.to_image().unwrap();
    assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 128]);
    assert_eq!(Surface::from_image(img).unwrap(), s);
    assert_eq!(&s.to_premultiplied()[..4], &[128, 0, 0, 128]);
}
