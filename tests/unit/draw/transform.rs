use super::*;

#[test]
fn identity_without_rotation_or_zoom() {
    let m = image_matrix(Point::new(5, 7), 10, 4, &ImageDrawDsc::default());
    assert_eq!(transformed_area(m, 10, 4), Area::new(5, 7, 14, 10));
}

#[test]
fn quarter_turn_swaps_the_bounding_box() {
    let dsc = ImageDrawDsc {
        angle: 900,
        ..ImageDrawDsc::default()
    };
    let m = image_matrix(Point::new(0, 0), 10, 4, &dsc);
    let a = transformed_area(m, 10, 4);
    assert_eq!((a.width(), a.height()), (4, 10));
    assert_eq!(a, Area::new(3, -3, 6, 6));
}

#[test]
fn zoom_scales_about_the_pivot() {
    let dsc = ImageDrawDsc {
        zoom: 512,
        pivot: Some(Point::new(0, 0)),
        ..ImageDrawDsc::default()
    };
    let m = image_matrix(Point::new(1, 1), 3, 2, &dsc);
    assert_eq!(transformed_area(m, 3, 2), Area::new(1, 1, 6, 4));
}

#[test]
fn zero_zoom_is_not_invertible() {
    let dsc = ImageDrawDsc {
        zoom: 0,
        ..ImageDrawDsc::default()
    };
    let m = image_matrix(Point::new(0, 0), 3, 3, &dsc);
    assert!(matches!(checked_inverse(m), Err(BlitError::NonInvertibleTransform)));
}

#[test]
fn bilinear_ignores_color_of_transparent_neighbours() {
    let data = [255, 0, 0, 255, 0, 0, 255, 0];
    let img = RgbaView {
        width: 2,
        height: 1,
        data: &data,
    };
    let mid = img.sample(1.0, 0.5, Sampling::Bilinear);
    assert_eq!((mid.r, mid.b), (255, 0));
    assert!((126..=129).contains(&mid.a));
    assert_eq!(img.sample(1.5, 0.5, Sampling::Nearest).a, 0);
    assert_eq!(img.sample(-0.1, 0.5, Sampling::Nearest), Rgba8::TRANSPARENT);
}
