use super::*;
use crate::layer::model::{LayerId, LayerPatch};

fn params() -> TransformParams {
    TransformParams {
        position: Point::new(100.0, 50.0),
        size: Size::new(200.0, 80.0),
        rotation_deg: 0.0,
        horizontal_tilt_deg: 0.0,
        vertical_tilt_deg: 0.0,
    }
}

fn approx(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn untransformed_layer_is_a_translation() {
    let t = try_resolve(&params()).unwrap();
    assert!(approx(t.to_image(Point::ZERO), Point::new(100.0, 50.0)));
    assert!(approx(t.to_image(Point::new(200.0, 80.0)), Point::new(300.0, 130.0)));
}

#[test]
fn rotation_pivots_on_box_center() {
    let t = try_resolve(&TransformParams {
        rotation_deg: 90.0,
        ..params()
    })
    .unwrap();
    let center = Point::new(200.0, 90.0);
    assert!(approx(t.to_image(Point::new(100.0, 40.0)), center));
    // Top-left corner swings to where a 90° clockwise turn (y down) puts it.
    assert!(approx(t.to_image(Point::ZERO), Point::new(240.0, -10.0)));
}

#[test]
fn shear_axes_are_independent() {
    let h = try_resolve(&TransformParams {
        horizontal_tilt_deg: 45.0,
        ..params()
    })
    .unwrap();
    let v = try_resolve(&TransformParams {
        vertical_tilt_deg: 45.0,
        ..params()
    })
    .unwrap();
    // Horizontal tilt moves x with local y; vertical tilt moves y with local x.
    let dh = h.image_delta(Vec2::new(0.0, 10.0));
    assert!((dh.x - 10.0).abs() < 1e-9 && (dh.y - 10.0).abs() < 1e-9);
    let dv = v.image_delta(Vec2::new(10.0, 0.0));
    assert!((dv.x - 10.0).abs() < 1e-9 && (dv.y - 10.0).abs() < 1e-9);
}

#[test]
fn inverse_round_trips_points() {
    let t = try_resolve(&TransformParams {
        rotation_deg: -33.0,
        horizontal_tilt_deg: 20.0,
        vertical_tilt_deg: -12.0,
        ..params()
    })
    .unwrap();
    let p = Point::new(37.5, 12.25);
    assert!(approx(t.to_local(t.to_image(p)), p));
    let d = Vec2::new(3.0, -4.0);
    let back = t.image_delta(t.local_delta(d));
    assert!((back - d).hypot() < 1e-9);
}

#[test]
fn tangent_is_clamped_and_finite() {
    assert!((tilt_tangent(30.0) - 30f64.to_radians().tan()).abs() < 1e-12);
    assert_eq!(tilt_tangent(45.0), TILT_TANGENT_LIMIT);
    assert_eq!(tilt_tangent(-45.0), -TILT_TANGENT_LIMIT);
    assert_eq!(tilt_tangent(90.0), TILT_TANGENT_LIMIT);
    assert_eq!(tilt_tangent(-90.0), -TILT_TANGENT_LIMIT);
    assert_eq!(tilt_tangent(f64::NAN), 0.0);
}

#[test]
fn singular_forward_is_rejected() {
    assert!(ResolvedTransform::from_forward(Affine::new([1.0, 1.0, 1.0, 1.0, 5.0, 5.0])).is_none());
    assert!(ResolvedTransform::from_forward(Affine::scale(f64::NAN)).is_none());
}

#[test]
fn extreme_matching_tilts_stay_invertible() {
    for deg in [45.0, -45.0] {
        let p = TransformParams {
            horizontal_tilt_deg: deg,
            vertical_tilt_deg: deg,
            ..params()
        };
        let t = try_resolve(&p).unwrap();
        let q = Point::new(12.0, 3.0);
        assert!(approx(t.to_local(t.to_image(q)), q));
    }
}

#[test]
fn corners_follow_position_at_extreme_tilts() {
    let mut layer = TextLayer::new(LayerId(7));
    layer.apply(
        &LayerPatch::new()
            .position(100.0, 100.0)
            .bounding_size(100.0, 20.0)
            .horizontal_tilt_deg(45.0)
            .vertical_tilt_deg(45.0),
    );
    let before = layer_corners(&layer);
    layer.apply(&LayerPatch::new().position(300.0, 300.0));
    let after = layer_corners(&layer);
    for (a, b) in before.iter().zip(after.iter()) {
        assert!(approx(*b, *a + Vec2::new(200.0, 200.0)), "{a:?} -> {b:?}");
    }
}

#[test]
fn fallback_keeps_shear_but_uses_current_position() {
    let good = try_resolve(&TransformParams {
        rotation_deg: 30.0,
        horizontal_tilt_deg: 10.0,
        ..params()
    })
    .unwrap();
    let moved = TransformParams {
        position: Point::new(500.0, -40.0),
        ..params()
    };
    let t = place(linear_part(good.forward), &moved).unwrap();
    let [a0, a1, a2, a3, _, _] = t.forward.as_coeffs();
    let [b0, b1, b2, b3, _, _] = good.forward.as_coeffs();
    for (a, b) in [(a0, b0), (a1, b1), (a2, b2), (a3, b3)] {
        assert!((a - b).abs() < 1e-12);
    }
    let center = Point::new(moved.size.width * 0.5, moved.size.height * 0.5);
    assert!(approx(t.to_image(center), moved.position + center.to_vec2()));
}

#[test]
fn contains_uses_rotated_box() {
    let mut layer = TextLayer::new(LayerId(1));
    layer.apply(
        &LayerPatch::new()
            .position(0.0, 0.0)
            .bounding_size(200.0, 20.0)
            .rotation_deg(90.0),
    );
    // Center (100, 10); rotated box spans x in [90, 110], y in [-90, 110].
    assert!(contains(&layer, Point::new(100.0, 100.0)));
    assert!(!contains(&layer, Point::new(180.0, 10.0)));

    let corners = layer_corners(&layer);
    assert!(approx(corners[0], Point::new(110.0, -90.0)));
}
