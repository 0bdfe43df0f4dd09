use super::*;
use crate::draw::renderer::Renderer;
use crate::draw::surface::Surface;
use crate::foundation::error::ErrorCode;
use crate::gpu::soft::SoftGpu;
use crate::mask::engine::Mask;
use crate::mask::simple::RectMask;
use crate::pixel::format::{ColorFormat, PixelBuffer};

const RED: Rgba8 = Rgba8::rgb(255, 0, 0);
const BLUE: Rgba8 = Rgba8::rgb(0, 0, 255);

fn gpu(w: u32, h: u32) -> GpuRenderer<SoftGpu> {
    GpuRenderer::new(SoftGpu::new(w, h).unwrap(), RendererOpts::default()).unwrap()
}

fn solid(w: u16, h: u16, c: Rgba8) -> ImageSource {
    ImageSource::memory(PixelBuffer::filled_rgba(w, h, c))
}

#[test]
fn image_uploads_once_and_blits() {
    let mut g = gpu(16, 16);
    let src = solid(4, 4, BLUE);
    let coords = Area::new(2, 2, 9, 9);
    assert_eq!(g.draw_image(coords, &src, &ImageDrawDsc::default()), DrawOutcome::Drawn);
    assert_eq!(g.driver().screen().pixel(2, 2), BLUE);
    assert_eq!(g.driver().screen().pixel(5, 5), BLUE);
    assert_eq!(g.driver().screen().pixel(6, 6), Rgba8::TRANSPARENT);

    let uploads = g.driver().stats().uploads;
    g.draw_image(coords, &src, &ImageDrawDsc::default());
    assert_eq!(g.driver().stats().uploads, uploads);
    assert_eq!(g.texture_stats().hits, 1);
}

#[test]
fn rounded_half_opaque_image_matches_software_interior() {
    let mut g = gpu(64, 64);
    let src = solid(64, 64, RED);
    let dsc = ImageDrawDsc {
        radius: 8,
        opa: 128,
        ..Default::default()
    };
    assert_eq!(g.draw_image(Area::new(0, 0, 63, 63), &src, &dsc), DrawOutcome::Drawn);
    let s = g.driver().screen();
    assert_eq!(s.pixel(32, 32), Rgba8::new(255, 0, 0, 128));
    assert_eq!(s.pixel(0, 0).a, 0);
    assert_eq!(s.pixel(63, 0).a, 0);
    assert_eq!(g.driver().render_target(), None);
}

#[test]
fn rect_parts_match_the_software_renderer() {
    let dsc = RectDrawDsc {
        radius: 6,
        bg_color: BLUE,
        border_color: RED,
        border_width: 2,
        outline_color: Rgba8::rgb(0, 255, 0),
        outline_width: 2,
        outline_pad: 1,
        shadow_width: 4,
        shadow_ofs_y: 3,
        shadow_opa: 200,
        ..Default::default()
    };
    let coords = Area::new(8, 8, 39, 31);

    let mut g = gpu(48, 48);
    assert_eq!(g.draw_rect(coords, &dsc), DrawOutcome::Drawn);

    let mut sw = Renderer::new(RendererOpts::default()).unwrap();
    let mut s = Surface::new(48, 48).unwrap();
    assert_eq!(sw.draw_rect(&mut s, coords, &dsc), DrawOutcome::Drawn);

    assert_eq!(g.driver().screen(), &s);
}

#[test]
fn evicted_textures_are_destroyed() {
    let opts = RendererOpts {
        texture_cache_capacity: 1,
        ..Default::default()
    };
    let mut g = GpuRenderer::new(SoftGpu::new(8, 8).unwrap(), opts).unwrap();
    let a = solid(2, 2, RED);
    let b = solid(2, 2, BLUE);
    g.draw_image(Area::new(0, 0, 1, 1), &a, &ImageDrawDsc::default());
    g.draw_image(Area::new(2, 0, 3, 1), &b, &ImageDrawDsc::default());
    assert_eq!(g.cached_textures(), 1);
    assert_eq!(g.driver().live_textures(), 1);
    assert_eq!(g.texture_stats().evictions, 1);

    assert_eq!(g.invalidate_src(&b), 2);
    assert_eq!(g.driver().live_textures(), 0);
}

#[test]
fn tiny_texture_cache_still_composes_masked_draws() {
    let opts = |capacity| RendererOpts {
        texture_cache_capacity: capacity,
        ..Default::default()
    };
    let mut g = GpuRenderer::new(SoftGpu::new(64, 64).unwrap(), opts(2)).unwrap();
    let dsc = ImageDrawDsc {
        radius: 8,
        ..Default::default()
    };
    let out = g.draw_image(Area::new(0, 0, 63, 63), &solid(64, 64, RED), &dsc);
    assert_eq!(out, DrawOutcome::Drawn);
    assert_eq!(g.driver().screen().pixel(32, 32), RED);
    assert_eq!(g.driver().screen().pixel(0, 0).a, 0);
    assert!(g.cached_textures() <= 2);
    assert_eq!(g.driver().live_textures(), g.cached_textures());

    let mut g = GpuRenderer::new(SoftGpu::new(32, 32).unwrap(), opts(1)).unwrap();
    g.context_mut()
        .masks_mut()
        .add(Mask::Rect(RectMask {
            area: Area::new(0, 0, 15, 31),
        }))
        .unwrap();
    let dsc = RectDrawDsc {
        radius: 8,
        bg_color: BLUE,
        ..Default::default()
    };
    assert_eq!(g.draw_rect(Area::new(0, 0, 31, 31), &dsc), DrawOutcome::Drawn);
    assert_eq!(g.driver().screen().pixel(10, 16), BLUE);
    assert_eq!(g.driver().screen().pixel(20, 16), Rgba8::TRANSPARENT);
    assert_eq!(g.cached_textures(), 1);
    assert_eq!(g.driver().live_textures(), 1);
}

#[test]
fn allocation_failure_only_abandons_that_draw() {
    let driver = SoftGpu::new(8, 8).unwrap().with_texture_limit(0);
    let mut g = GpuRenderer::new(driver, RendererOpts::default()).unwrap();
    let out = g.draw_image(Area::new(0, 0, 3, 3), &solid(4, 4, RED), &ImageDrawDsc::default());
    assert_eq!(out, DrawOutcome::Abandoned(ErrorCode::AllocationFailed));
    assert_eq!(g.driver().screen().pixel(0, 0), Rgba8::TRANSPARENT);
    assert_eq!(g.cached_textures(), 0);
    assert_eq!(g.context().last_error(), Some(ErrorCode::AllocationFailed));

    let dsc = RectDrawDsc {
        bg_color: BLUE,
        shadow_width: 4,
        ..Default::default()
    };
    let out = g.draw_rect(Area::new(2, 2, 5, 5), &dsc);
    assert_eq!(out, DrawOutcome::Degraded(ErrorCode::AllocationFailed));
    assert_eq!(g.driver().screen().pixel(3, 3), BLUE);
    assert_eq!(g.driver().screen().pixel(1, 1), Rgba8::TRANSPARENT);
}

#[test]
fn masked_draws_compose_through_scratch() {
    let mut g = gpu(16, 16);
    g.context_mut()
        .masks_mut()
        .add(Mask::Rect(RectMask {
            area: Area::new(0, 0, 7, 15),
        }))
        .unwrap();
    g.draw_rect(Area::new(0, 0, 15, 15), &RectDrawDsc::default());
    let s = g.driver().screen();
    assert_eq!(s.pixel(7, 3), Rgba8::WHITE);
    assert_eq!(s.pixel(8, 3), Rgba8::TRANSPARENT);
    assert_eq!(g.driver().render_target(), None);
    assert!(g.cached_textures() >= 1);
}

#[test]
fn mask_rect_clears_outside_and_rounds() {
    let mut g = gpu(20, 20);
    g.driver_mut().clear(BLUE);
    assert_eq!(g.mask_rect(Area::new(2, 2, 17, 17), 5), DrawOutcome::Drawn);
    let s = g.driver().screen();
    assert_eq!(s.pixel(10, 10), BLUE);
    assert_eq!(s.pixel(0, 10).a, 0);
    assert_eq!(s.pixel(19, 19).a, 0);
    assert_eq!(s.pixel(2, 2).a, 0);
    assert_eq!(s.pixel(2, 10).a, 255);
}

#[test]
fn unresolvable_source_draws_a_labelled_white_box() {
    let mut g = gpu(40, 24);
    let coords = Area::new(2, 2, 37, 21);
    let out = g.draw_image(coords, &ImageSource::symbol("nope"), &ImageDrawDsc::default());
    assert!(matches!(out, DrawOutcome::Fallback(_)));
    let s = g.driver().screen();
    assert_eq!(s.pixel(2, 2), Rgba8::WHITE);
    assert_eq!(s.pixel(38, 22), Rgba8::TRANSPARENT);
    assert_eq!(s.pixel(14, 4), Rgba8::rgb(0x30, 0x30, 0x30));

    let mut sw = Renderer::new(RendererOpts::default()).unwrap();
    let mut expected = Surface::new(40, 24).unwrap();
    sw.draw_image(&mut expected, coords, &ImageSource::symbol("nope"), &ImageDrawDsc::default());
    assert_eq!(s, &expected);
}

#[test]
fn zoom_goes_through_the_matrix_blit() {
    let mut g = gpu(8, 8);
    let data = [RED, BLUE, BLUE, RED]
        .iter()
        .flat_map(|c| c.to_array())
        .collect::<Vec<_>>();
    let src = ImageSource::memory(PixelBuffer::new(ColorFormat::Rgba8888, 2, 2, data).unwrap());
    let dsc = ImageDrawDsc {
        zoom: 512,
        pivot: Some(Point::new(0, 0)),
        ..Default::default()
    };
    assert_eq!(g.draw_image(Area::new(0, 0, 1, 1), &src, &dsc), DrawOutcome::Drawn);
    let s = g.driver().screen();
    assert_eq!(s.pixel(1, 1), RED);
    assert_eq!(s.pixel(2, 0), BLUE);
    assert_eq!(s.pixel(3, 3), RED);
    g.finish();
}
