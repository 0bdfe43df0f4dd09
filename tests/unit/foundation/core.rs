use super::*;

#[test]
fn premultiply_scales_color_channels() {
    let p = Rgba8::new(255, 128, 0, 128).premultiply();
    assert_eq!(p.a, 128);
    assert_eq!(p.r, 128);
    assert_eq!(p.g, 64);
    assert_eq!(p.b, 0);
}

#[test]
fn premultiplied_round_trip_is_close_for_opaque_and_half() {
    for c in [Rgba8::rgb(10, 200, 255), Rgba8::new(255, 0, 0, 128)] {
        let back = c.premultiply().to_straight();
        assert_eq!(back.a, c.a);
        assert!((i32::from(back.r) - i32::from(c.r)).abs() <= 1);
        assert!((i32::from(back.g) - i32::from(c.g)).abs() <= 1);
    }
    assert_eq!(
        Rgba8Premul::default().to_straight(),
        Rgba8::TRANSPARENT
    );
}

#[test]
fn slice_helpers_keep_channel_order() {
    let c = Rgba8::from_slice(&[1, 2, 3, 4]);
    assert_eq!(c.to_array(), [1, 2, 3, 4]);
    assert_eq!(c.with_alpha(9).a, 9);
}
