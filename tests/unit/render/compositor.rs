use std::sync::Arc;

use super::*;
use crate::assets::decode::BaseImage;
use crate::foundation::core::Rgb8;
use crate::layer::model::LayerPatch;
use crate::layer::store::LayerStore;

const INK: (u32, u32) = (6, 12);

fn res(w: u32, h: u32) -> Resolution {
    Resolution::new(w, h).unwrap()
}

fn text_patch() -> LayerPatch {
    LayerPatch::new()
        .content("X")
        .font_size_px(20)
        .position(0.0, 0.0)
}

fn solid_image(w: u32, h: u32, rgba: [u8; 4]) -> Arc<BaseImage> {
    let data = rgba.repeat((w * h) as usize);
    Arc::new(BaseImage::from_rgba8(w, h, data).unwrap())
}

#[test]
fn empty_scene_is_transparent() {
    let mut c = Compositor::new();
    let frame = c.render(&LayerStore::new().snapshot(), res(8, 8), &FontSet::empty());
    assert!(frame.premultiplied);
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn render_is_deterministic() {
    let mut store = LayerStore::new();
    store.add(&text_patch().rotation_deg(17.0).horizontal_tilt_deg(12.0));
    store.add(&text_patch().blend_mode(BlendMode::Screen).opacity(0.6));
    let scene = store.snapshot();

    let a = Compositor::new().render(&scene, res(40, 30), &FontSet::empty());
    let mut reused = Compositor::new();
    let _ = reused.render(&scene, res(17, 9), &FontSet::empty());
    let b = reused.render(&scene, res(40, 30), &FontSet::empty());
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn text_is_drawn_with_its_color() {
    let mut store = LayerStore::new();
    store.add(&text_patch().color(Rgb8::new(255, 0, 0)));
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    assert_eq!(frame.pixel(INK.0, INK.1), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(39, 29), Some([0, 0, 0, 0]));
}

#[test]
fn transparent_layer_draws_nothing() {
    let mut store = LayerStore::new();
    store.add(&text_patch().opacity(0.0));
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn opaque_base_image_hides_normal_text() {
    let mut store = LayerStore::new();
    store.add(&text_patch());
    store.set_base_image(solid_image(40, 30, [200, 10, 10, 255]));
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    for px in frame.data.chunks_exact(4) {
        for (got, want) in px.iter().zip([200u8, 10, 10, 255]) {
            assert!(got.abs_diff(want) <= 1, "{px:?}");
        }
    }
}

#[test]
fn translucent_base_image_lets_text_through() {
    let mut store = LayerStore::new();
    store.add(&text_patch());
    store.set_base_image(solid_image(40, 30, [0, 0, 0, 128]));
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    let under_text = frame.pixel(INK.0, INK.1).unwrap();
    let bare = frame.pixel(39, 29).unwrap();
    assert_eq!(under_text[3], 255);
    assert!(under_text[0] > 100);
    assert_eq!(bare[0], 0);
}

#[test]
fn blend_mode_applies_against_lower_text() {
    let mut store = LayerStore::new();
    store.add(&text_patch());
    store.add(&text_patch().blend_mode(BlendMode::Difference));
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    assert_eq!(frame.pixel(INK.0, INK.1), Some([0, 0, 0, 255]));

    let mut store = LayerStore::new();
    store.add(&text_patch());
    store.add(
        &text_patch()
            .color(Rgb8::new(100, 150, 200))
            .blend_mode(BlendMode::Darken),
    );
    let frame = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());
    assert_eq!(frame.pixel(INK.0, INK.1), Some([100, 150, 200, 255]));
}

#[test]
fn layers_follow_the_image_when_the_target_shrinks() {
    let mut store = LayerStore::new();
    store.add(&text_patch().font_size_px(200).position(0.0, 0.0));
    store.set_base_image(solid_image(400, 300, [0, 0, 0, 0]));
    let big = Compositor::new().render(&store.snapshot(), res(400, 300), &FontSet::empty());
    let small = Compositor::new().render(&store.snapshot(), res(40, 30), &FontSet::empty());

    // block ink spans 10..110 x 50..190 in image pixels
    assert_eq!(big.pixel(60, 120).map(|p| p[3]), Some(255));
    assert_eq!(small.pixel(6, 12).map(|p| p[3]), Some(255));
    assert_eq!(small.pixel(20, 12).map(|p| p[3]), Some(0));
}

#[test]
fn measure_uses_fallback_face() {
    let mut c = Compositor::with_fallback_family("Impact");
    assert_eq!(c.fallback_family(), "Impact");
    let mut store = LayerStore::new();
    let id = store.add(&text_patch().content("abc"));
    let size = c.measure(store.get(id).unwrap(), &FontSet::empty());
    assert!((size.width - 36.0).abs() < 1e-9);
    assert!((size.height - 24.0).abs() < 1e-9);
}
