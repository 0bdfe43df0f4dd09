use super::*;
use crate::decode::registry::{DecoderSession, ImageDecoder};
use crate::draw::dsc::BorderSide;
use crate::foundation::core::OPA_TRANSP;
use crate::foundation::error::BlitError;
use crate::mask::engine::Mask;
use crate::mask::simple::RectMask;
use crate::pixel::format::{ColorFormat, PixelBuffer};

const RED: Rgba8 = Rgba8::rgb(255, 0, 0);
const BLUE: Rgba8 = Rgba8::rgb(0, 0, 255);

fn renderer() -> Renderer {
    Renderer::new(RendererOpts::default()).unwrap()
}

fn solid(w: u16, h: u16, c: Rgba8) -> ImageSource {
    ImageSource::memory(PixelBuffer::filled_rgba(w, h, c))
}

#[test]
fn rounded_half_opaque_image_has_exact_interior() {
    let mut r = renderer();
    let mut s = Surface::new(64, 64).unwrap();
    let src = solid(64, 64, RED);
    let dsc = ImageDrawDsc {
        radius: 8,
        opa: 128,
        ..Default::default()
    };
    assert_eq!(r.draw_image(&mut s, Area::new(0, 0, 63, 63), &src, &dsc), DrawOutcome::Drawn);

    assert_eq!(s.pixel(32, 32), Rgba8::new(255, 0, 0, 128));
    assert_eq!(s.pixel(8, 0), Rgba8::new(255, 0, 0, 128));
    assert_eq!(s.pixel(0, 0).a, 0);
    assert_eq!(s.pixel(63, 63).a, 0);
    assert!(s.pixel(2, 2).a > 0 && s.pixel(2, 2).a < 128);
    assert_eq!(r.fragment_stats().inserts, 1);

    let mut s2 = Surface::new(64, 64).unwrap();
    r.draw_image(&mut s2, Area::new(0, 0, 63, 63), &src, &dsc);
    assert_eq!(s, s2);
    assert_eq!(r.fragment_stats().hits, 1);
}

#[test]
fn plain_image_is_clipped_to_coords() {
    let mut r = renderer();
    let mut s = Surface::new(10, 10).unwrap();
    let src = solid(8, 8, BLUE);
    r.draw_image(&mut s, Area::new(2, 2, 5, 9), &src, &ImageDrawDsc::default());
    assert_eq!(s.pixel(2, 2), BLUE);
    assert_eq!(s.pixel(5, 9), BLUE);
    assert_eq!(s.pixel(6, 2), Rgba8::TRANSPARENT);
    assert_eq!(s.pixel(1, 2), Rgba8::TRANSPARENT);
}

#[test]
fn recolor_pulls_toward_target() {
    let mut r = renderer();
    let mut s = Surface::new(2, 2).unwrap();
    let dsc = ImageDrawDsc {
        recolor: RED,
        recolor_opa: 255,
        ..Default::default()
    };
    r.draw_image(&mut s, Area::new(0, 0, 1, 1), &solid(2, 2, BLUE), &dsc);
    assert_eq!(s.pixel(1, 1), RED);
}

#[test]
fn unresolvable_source_draws_a_labelled_white_box() {
    let mut r = renderer();
    let mut s = Surface::new(40, 24).unwrap();
    let coords = Area::new(2, 2, 37, 21);
    let src = ImageSource::symbol("missing");
    let out = r.draw_image(&mut s, coords, &src, &ImageDrawDsc::default());
    assert!(matches!(out, DrawOutcome::Fallback(_)));
    assert_eq!(s.pixel(2, 2), Rgba8::WHITE);
    assert_eq!(s.pixel(37, 21), Rgba8::WHITE);
    assert_eq!(s.pixel(1, 1), Rgba8::TRANSPARENT);
    // Top-left stroke of the "N" in the centered label.
    assert_eq!(s.pixel(14, 4), Rgba8::rgb(0x30, 0x30, 0x30));
    let ink = (coords.y1..=coords.y2)
        .flat_map(|y| (coords.x1..=coords.x2).map(move |x| (x, y)))
        .filter(|&(x, y)| s.pixel(x, y) != Rgba8::WHITE)
        .count();
    assert!(ink > 20);
    assert_eq!(r.context().last_error(), Some(ErrorCode::DecodeOpenFailed));
}

#[test]
fn fallback_label_stays_inside_the_clip() {
    let mut r = renderer();
    let mut s = Surface::new(40, 24).unwrap();
    r.set_clip(Some(Area::new(0, 0, 15, 23)));
    r.draw_image(
        &mut s,
        Area::new(2, 2, 37, 21),
        &ImageSource::symbol("missing"),
        &ImageDrawDsc::default(),
    );
    assert_eq!(s.pixel(14, 4), Rgba8::rgb(0x30, 0x30, 0x30));
    assert!((16..40).all(|x| (0..24).all(|y| s.pixel(x, y) == Rgba8::TRANSPARENT)));
}

#[test]
fn zoom_scales_around_the_pivot() {
    let mut r = renderer();
    let mut s = Surface::new(8, 8).unwrap();
    let data = [RED, BLUE, BLUE, RED]
        .iter()
        .flat_map(|c| c.to_array())
        .collect::<Vec<_>>();
    let src = ImageSource::memory(PixelBuffer::new(ColorFormat::Rgba8888, 2, 2, data).unwrap());
    let dsc = ImageDrawDsc {
        zoom: 512,
        pivot: Some(Point::new(0, 0)),
        antialias: false,
        ..Default::default()
    };
    assert_eq!(r.draw_image(&mut s, Area::new(0, 0, 1, 1), &src, &dsc), DrawOutcome::Drawn);
    assert_eq!(s.pixel(0, 0), RED);
    assert_eq!(s.pixel(1, 1), RED);
    assert_eq!(s.pixel(2, 0), BLUE);
    assert_eq!(s.pixel(3, 3), RED);
    assert_eq!(s.pixel(4, 4), Rgba8::TRANSPARENT);
}

#[test]
fn quarter_turn_swaps_axes() {
    let mut r = renderer();
    let mut s = Surface::new(8, 8).unwrap();
    let data = [RED, BLUE].iter().flat_map(|c| c.to_array()).collect::<Vec<_>>();
    let src = ImageSource::memory(PixelBuffer::new(ColorFormat::Rgba8888, 2, 1, data).unwrap());
    let dsc = ImageDrawDsc {
        angle: 900,
        pivot: Some(Point::new(0, 0)),
        antialias: false,
        ..Default::default()
    };
    r.draw_image(&mut s, Area::new(4, 4, 5, 4), &src, &dsc);
    // Clockwise about (4, 4): +x maps to +y, so the row becomes a column left of x = 4.
    assert_eq!(s.pixel(3, 4), RED);
    assert_eq!(s.pixel(3, 5), BLUE);
    assert_eq!(s.pixel(4, 4), Rgba8::TRANSPARENT);
}

#[test]
fn repeated_transformed_draws_reuse_decoded_pixels() {
    let mut r = renderer();
    let src = solid(4, 4, BLUE);
    let dsc = ImageDrawDsc {
        zoom: 512,
        antialias: false,
        ..Default::default()
    };
    let mut first = Surface::new(16, 16).unwrap();
    r.draw_image(&mut first, Area::new(4, 4, 7, 7), &src, &dsc);
    let mut second = Surface::new(16, 16).unwrap();
    r.draw_image(&mut second, Area::new(4, 4, 7, 7), &src, &dsc);
    assert_eq!(r.context().decoded_images(), 1);
    assert_eq!(second.pixel(6, 6), BLUE);
    assert_eq!(first.pixel(6, 6), second.pixel(6, 6));

    r.context_mut().invalidate_src(&src);
    assert_eq!(r.context().decoded_images(), 0);
}

struct FlakyRows;

impl ImageDecoder for FlakyRows {
    fn name(&self) -> &str {
        "flaky"
    }

    fn info(&self, src: &ImageSource) -> BlitResult<crate::pixel::format::ImageHeader> {
        match src {
            ImageSource::Symbol(_) => Ok(crate::pixel::format::ImageHeader {
                color_format: ColorFormat::Rgba8888,
                width: 4,
                height: 4,
                stride: 16,
            }),
            _ => Err(BlitError::no_decoder("symbols only")),
        }
    }

    fn open(&self, _session: &mut DecoderSession) -> BlitResult<()> {
        Ok(())
    }

    fn read_line(
        &self,
        _session: &mut DecoderSession,
        _x: u32,
        y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        if y >= 2 {
            return Err(BlitError::read_line("truncated"));
        }
        for px in out[..len as usize * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&RED.to_array());
        }
        Ok(())
    }
}

#[test]
fn failed_scanline_keeps_rows_already_drawn() {
    let mut reg = DecoderRegistry::new();
    reg.register(FlakyRows);
    let mut r = Renderer::with_registry(RendererOpts::default(), reg).unwrap();
    let mut s = Surface::new(4, 4).unwrap();
    let out = r.draw_image(
        &mut s,
        Area::new(0, 0, 3, 3),
        &ImageSource::symbol("stream"),
        &ImageDrawDsc::default(),
    );
    assert_eq!(out, DrawOutcome::Degraded(ErrorCode::ReadLineFailed));
    assert_eq!(s.pixel(0, 1), RED);
    assert_eq!(s.pixel(0, 2), Rgba8::TRANSPARENT);
}

#[test]
fn square_rect_with_border_fills_exact_rects() {
    let mut r = renderer();
    let mut s = Surface::new(10, 10).unwrap();
    let dsc = RectDrawDsc {
        bg_color: BLUE,
        border_color: RED,
        border_width: 2,
        ..Default::default()
    };
    assert_eq!(r.draw_rect(&mut s, Area::new(0, 0, 9, 9), &dsc), DrawOutcome::Drawn);
    assert_eq!(s.pixel(0, 0), RED);
    assert_eq!(s.pixel(1, 5), RED);
    assert_eq!(s.pixel(2, 2), BLUE);
    assert_eq!(s.pixel(8, 8), RED);
}

#[test]
fn partial_border_leaves_open_sides() {
    let mut r = renderer();
    let mut s = Surface::new(10, 10).unwrap();
    let dsc = RectDrawDsc {
        bg_opa: OPA_TRANSP,
        border_color: RED,
        border_width: 1,
        border_side: BorderSide::LEFT,
        radius: 3,
        ..Default::default()
    };
    r.draw_rect(&mut s, Area::new(0, 0, 9, 9), &dsc);
    assert_eq!(s.pixel(0, 5), RED);
    assert_eq!(s.pixel(5, 0), Rgba8::TRANSPARENT);
    assert_eq!(s.pixel(9, 5), Rgba8::TRANSPARENT);
}

#[test]
fn shadow_extends_outside_the_rect() {
    let mut r = renderer();
    let mut s = Surface::new(40, 40).unwrap();
    let dsc = RectDrawDsc {
        radius: 4,
        shadow_width: 6,
        shadow_ofs_x: 2,
        shadow_ofs_y: 2,
        ..Default::default()
    };
    assert_eq!(r.draw_rect(&mut s, Area::new(10, 10, 29, 29), &dsc), DrawOutcome::Drawn);
    assert_eq!(s.pixel(20, 20), Rgba8::WHITE);
    let below = s.pixel(20, 31);
    assert!(below.a > 0 && below.a < 255, "{below:?}");
    assert_eq!((below.r, below.g, below.b), (0, 0, 0));
    assert_eq!(s.pixel(0, 0), Rgba8::TRANSPARENT);
}

#[test]
fn outline_sits_outside_the_padding() {
    let mut r = renderer();
    let mut s = Surface::new(20, 20).unwrap();
    let dsc = RectDrawDsc {
        bg_opa: OPA_TRANSP,
        outline_color: RED,
        outline_width: 1,
        outline_pad: 1,
        ..Default::default()
    };
    r.draw_rect(&mut s, Area::new(5, 5, 14, 14), &dsc);
    assert_eq!(s.pixel(3, 10), RED);
    assert_eq!(s.pixel(4, 10), Rgba8::TRANSPARENT);
    assert_eq!(s.pixel(5, 10), Rgba8::TRANSPARENT);
}

#[test]
fn clip_and_masks_limit_drawing() {
    let mut r = renderer();
    let mut s = Surface::new(10, 10).unwrap();
    r.set_clip(Some(Area::new(0, 0, 4, 9)));
    r.context_mut()
        .masks_mut()
        .add(Mask::Rect(RectMask {
            area: Area::new(0, 0, 9, 4),
        }))
        .unwrap();
    r.draw_rect(&mut s, Area::new(0, 0, 9, 9), &RectDrawDsc::default());
    assert_eq!(s.pixel(4, 4), Rgba8::WHITE);
    assert_eq!(s.pixel(5, 4), Rgba8::TRANSPARENT);
    assert_eq!(s.pixel(4, 5), Rgba8::TRANSPARENT);

    r.set_clip(Some(Area::new(20, 20, 30, 30)));
    assert_eq!(
        r.draw_rect(&mut s, Area::new(0, 0, 9, 9), &RectDrawDsc::default()),
        DrawOutcome::Invisible
    );
}

#[test]
fn mask_rect_rounds_and_clears() {
    let mut r = renderer();
    let mut s = Surface::filled(20, 20, BLUE).unwrap();
    assert_eq!(r.mask_rect(&mut s, Area::new(2, 2, 17, 17), 5), DrawOutcome::Drawn);
    assert_eq!(s.pixel(10, 10), BLUE);
    assert_eq!(s.pixel(0, 10).a, 0);
    assert_eq!(s.pixel(2, 2).a, 0);
    assert_eq!(s.pixel(2, 10).a, 255);
}
