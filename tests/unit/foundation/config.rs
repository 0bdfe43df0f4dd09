use super::*;

#[test]
fn partial_json_keeps_defaults() {
    let opts = RendererOpts::from_json(r#"{ "image_cache_size": 0 }"#).unwrap();
    assert_eq!(opts.image_cache_size, 0);
    assert_eq!(
        opts.texture_cache_capacity,
        RendererOpts::default().texture_cache_capacity
    );
}

#[test]
fn unknown_fields_are_rejected() {
    let err = RendererOpts::from_json(r#"{ "cache": 3 }"#).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn zero_texture_capacity_is_invalid() {
    let err = RendererOpts::from_json(r#"{ "texture_cache_capacity": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("texture_cache_capacity"));
}

#[test]
fn json_round_trip() {
    let opts = RendererOpts {
        max_tile_size: 256,
        ..RendererOpts::default()
    };
    let s = serde_json::to_string(&opts).unwrap();
    assert_eq!(RendererOpts::from_json(&s).unwrap(), opts);
}
