use super::*;

#[test]
fn resolution_rejects_zero_and_oversize() {
    assert!(Resolution::new(0, 10).is_err());
    assert!(Resolution::new(10, 0).is_err());
    assert!(Resolution::new(MAX_RASTER_EDGE + 1, 10).is_err());
    assert!(Resolution::new(1920, 1080).is_ok());
}

#[test]
fn resolution_keeps_aspect_for_preview_width() {
    let r = Resolution::with_width_keeping_aspect(800, 1920, 1080).unwrap();
    assert_eq!((r.width, r.height), (800, 450));

    assert!(Resolution::with_width_keeping_aspect(10, 1, 10_000).is_err());
    assert!(Resolution::with_width_keeping_aspect(800, 0, 10).is_err());
}

#[test]
fn hex_colors_parse_long_and_short_forms() {
    assert_eq!(Rgb8::parse_hex("#ff8000"), Some(Rgb8::new(255, 128, 0)));
    assert_eq!(Rgb8::parse_hex("FF8000"), Some(Rgb8::new(255, 128, 0)));
    assert_eq!(Rgb8::parse_hex("#f80"), Some(Rgb8::new(255, 136, 0)));
    assert_eq!(Rgb8::parse_hex("#ff80"), None);
    assert_eq!(Rgb8::parse_hex("#gg0000"), None);
    assert_eq!(Rgb8::parse_hex(""), None);
}

#[test]
fn hex_color_serde_uses_strings() {
    let c: Rgb8 = serde_json::from_str("\"#102030\"").unwrap();
    assert_eq!(c, Rgb8::new(0x10, 0x20, 0x30));
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#102030\"");
    assert!(serde_json::from_str::<Rgb8>("\"red\"").is_err());
}
