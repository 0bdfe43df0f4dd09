use super::*;

#[test]
fn image_defaults_are_an_identity_draw() {
    let d = ImageDrawDsc::default();
    assert_eq!(d.opa, OPA_COVER);
    assert_eq!(d.zoom, ZOOM_NONE);
    assert_eq!(d.recolor_opa, OPA_TRANSP);
    assert!(!d.has_transform());
}

#[test]
fn full_turns_are_not_transforms() {
    let mut d = ImageDrawDsc {
        angle: 3600,
        ..Default::default()
    };
    assert!(!d.has_transform());
    d.angle = -900;
    assert!(d.has_transform());
    d.angle = 0;
    d.zoom = 512;
    assert!(d.has_transform());
}

#[test]
fn partial_json_fills_in_defaults() {
    let d: RectDrawDsc =
        serde_json::from_str(r#"{"radius":4,"border_width":2,"blend_mode":"additive"}"#).unwrap();
    assert_eq!(d.radius, 4);
    assert_eq!(d.border_width, 2);
    assert_eq!(d.blend_mode, BlendMode::Additive);
    assert_eq!(d.bg_color, Rgba8::WHITE);
    assert_eq!(d.border_side, BorderSide::FULL);

    let err = serde_json::from_str::<ImageDrawDsc>(r#"{"opacity":3}"#);
    assert!(err.is_err());
}

#[test]
fn border_sides_combine_as_bits() {
    let tb = BorderSide::TOP.union(BorderSide::BOTTOM);
    assert_eq!(tb.bits(), 3);
    assert!(tb.contains(BorderSide::TOP));
    assert!(!tb.contains(BorderSide::LEFT));
    assert!(BorderSide::FULL.contains(tb));
    assert!(tb.contains(BorderSide::NONE));
}

#[test]
fn visibility_of_outcomes() {
    assert!(DrawOutcome::Drawn.is_visible());
    assert!(DrawOutcome::Fallback("x".into()).is_visible());
    assert!(DrawOutcome::Degraded(ErrorCode::AllocationFailed).is_visible());
    assert!(!DrawOutcome::Invisible.is_visible());
    assert!(!DrawOutcome::Abandoned(ErrorCode::AllocationFailed).is_visible());
}
