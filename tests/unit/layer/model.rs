use super::*;

fn layer() -> TextLayer {
    TextLayer::new(LayerId(1))
}

#[test]
fn new_layer_uses_mid_range_defaults() {
    let l = layer();
    assert_eq!(l.font_size_px(), 210);
    assert_eq!(l.font_family(), "Roboto");
    assert_eq!(l.opacity(), 1.0);
    assert_eq!(l.blend_mode(), BlendMode::Normal);
    assert!(l.content().is_empty());
}

#[test]
fn font_size_is_clamped_on_write() {
    let mut l = layer();
    l.apply(&LayerPatch::new().font_size_px(1000));
    assert_eq!(l.font_size_px(), 400);
    l.apply(&LayerPatch::new().font_size_px(-5));
    assert_eq!(l.font_size_px(), 20);
}

#[test]
fn angular_and_spacing_fields_are_clamped() {
    let mut l = layer();
    l.apply(
        &LayerPatch::new()
            .rotation_deg(720.0)
            .horizontal_tilt_deg(-90.0)
            .vertical_tilt_deg(60.0)
            .letter_spacing_px(-30.0)
            .opacity(1.5),
    );
    assert_eq!(l.rotation_deg(), 180.0);
    assert_eq!(l.horizontal_tilt_deg(), -45.0);
    assert_eq!(l.vertical_tilt_deg(), 45.0);
    assert_eq!(l.letter_spacing_px(), -10.0);
    assert_eq!(l.opacity(), 1.0);
}

#[test]
fn non_finite_writes_are_ignored() {
    let mut l = layer();
    l.apply(&LayerPatch::new().rotation_deg(12.0).position(5.0, 6.0));
    l.apply(
        &LayerPatch::new()
            .rotation_deg(f64::NAN)
            .opacity(f64::INFINITY)
            .position(f64::NAN, 1.0),
    );
    assert_eq!(l.rotation_deg(), 12.0);
    assert_eq!(l.opacity(), 1.0);
    assert_eq!(l.position(), Point::new(5.0, 6.0));
}

#[test]
fn malformed_hex_leaves_color_unset() {
    let patch = LayerPatch::new().color_hex("#12");
    assert!(patch.color.is_none());
    let mut l = layer();
    l.apply(&patch);
    assert_eq!(l.color(), Rgb8::WHITE);
}

#[test]
fn blend_mode_css_names_round_trip() {
    for mode in BlendMode::ALL {
        assert_eq!(mode.css_name().parse::<BlendMode>().unwrap(), mode);
    }
    assert_eq!("Color_Dodge".parse::<BlendMode>().unwrap(), BlendMode::ColorDodge);
    assert!("plus-lighter".parse::<BlendMode>().is_err());
    assert_eq!(
        serde_json::to_string(&BlendMode::SoftLight).unwrap(),
        "\"soft-light\""
    );
}

#[test]
fn patch_deserializes_partial_json() {
    let p: LayerPatch = serde_json::from_str(
        r##"{ "content": "NATURE", "color": "#ff0000", "blend_mode": "multiply" }"##,
    )
    .unwrap();
    assert_eq!(p.content.as_deref(), Some("NATURE"));
    assert_eq!(p.color, Some(Rgb8::new(255, 0, 0)));
    assert_eq!(p.blend_mode, Some(BlendMode::Multiply));
    assert!(p.touches_text_layout());
    assert!(serde_json::from_str::<LayerPatch>(r##"{ "colour": "#fff" }"##).is_err());
}

#[test]
fn duplicate_is_independent_of_source() {
    let mut a = layer();
    a.apply(&LayerPatch::new().content("A").position(10.0, 10.0));
    let mut b = a.duplicate_as(LayerId(2), Vec2::new(20.0, 20.0));
    b.apply(&LayerPatch::new().content("B").rotation_deg(30.0));

    assert_eq!(a.content(), "A");
    assert_eq!(a.rotation_deg(), 0.0);
    assert_eq!(a.position(), Point::new(10.0, 10.0));
    assert_eq!(b.id(), LayerId(2));
    assert_eq!(b.position(), Point::new(30.0, 30.0));
}

#[test]
fn extreme_shear_still_refreshes_last_good_transform() {
    let mut l = layer();
    l.apply(&LayerPatch::new().bounding_size(100.0, 40.0).horizontal_tilt_deg(45.0));
    let before = l.last_good_transform().unwrap();
    l.apply(&LayerPatch::new().vertical_tilt_deg(45.0));
    assert_eq!(l.vertical_tilt_deg(), 45.0);
    let after = l.last_good_transform().unwrap();
    assert_ne!(after, before);
    assert!(after.determinant().abs() > 1e-3);
}
