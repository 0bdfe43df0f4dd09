use super::*;

#[test]
fn wraparound_wedge_contains_zero_not_180() {
    let m = AngleMask::new(Point::new(0, 0), 350.0, 10.0);
    assert!(m.contains_angle(0.0));
    assert!(m.contains_angle(355.0));
    assert!(m.contains_angle(5.0));
    assert!(!m.contains_angle(180.0));
    assert!(!m.contains_angle(20.0));
}

#[test]
fn pixels_far_along_axes_are_binary() {
    let m = AngleMask::new(Point::new(50, 50), 350.0, 10.0);
    assert_eq!(m.coverage(90, 50), 255);
    assert_eq!(m.coverage(10, 50), 0);
    assert_eq!(m.coverage(50, 90), 0);
}

#[test]
fn positive_y_is_ninety_degrees() {
    let m = AngleMask::new(Point::new(0, 0), 45.0, 135.0);
    assert_eq!(m.coverage(0, 30), 255);
    assert_eq!(m.coverage(0, -30), 0);
}

#[test]
fn full_turn_covers_everything() {
    let m = AngleMask::new(Point::new(0, 0), 0.0, 360.0);
    let mut buf = [9u8; 8];
    assert_eq!(m.apply_row(&mut buf, -4, 3), MaskResult::FullCover);
    assert_eq!(buf, [9; 8]);
}

#[test]
fn pixels_on_a_ray_are_partially_covered() {
    let m = AngleMask::new(Point::new(0, 0), 0.0, 90.0);
    let c = m.coverage(20, 0);
    assert!(c > 0 && c < 255, "coverage {c}");
}
