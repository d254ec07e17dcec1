use crate::foundation::core::{Affine, Point, Size, Vec2};
use crate::layer::model::TextLayer;

/// Largest shear factor fed into the mapping (tan 44.9°). Keeps `1 - tan h * tan v` away from
/// zero for every pair of in-range tilts.
pub const TILT_TANGENT_LIMIT: f64 = 0.996_515_419_697_730_2;
/// Forward mappings closer than this to singular are treated as unusable.
pub const MIN_DETERMINANT: f64 = 1e-6;

/// Declarative geometry of a layer, in base-image pixels and degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParams {
    /// Top-left of the untransformed text box.
    pub position: Point,
    /// Footprint of the untransformed text box; rotation and shear pivot on its center.
    pub size: Size,
    pub rotation_deg: f64,
    pub horizontal_tilt_deg: f64,
    pub vertical_tilt_deg: f64,
}

/// Forward (layer-local -> image) mapping together with its inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTransform {
    pub forward: Affine,
    pub inverse: Affine,
}

impl ResolvedTransform {
    /// Pair `forward` with its inverse, or `None` if either is singular or non-finite.
    pub fn from_forward(forward: Affine) -> Option<Self> {
        if !forward.is_finite() || forward.determinant().abs() < MIN_DETERMINANT {
            return None;
        }
        let inverse = forward.inverse();
        inverse.is_finite().then_some(Self { forward, inverse })
    }

    fn translation(position: Point) -> Self {
        let v = position.to_vec2();
        Self {
            forward: Affine::translate(v),
            inverse: Affine::translate(-v),
        }
    }

    pub fn to_image(&self, local: Point) -> Point {
        self.forward * local
    }

    pub fn to_local(&self, image: Point) -> Point {
        self.inverse * image
    }

    /// Map an image-space displacement into the layer-local frame (translation ignored).
    pub fn local_delta(&self, image_delta: Vec2) -> Vec2 {
        apply_linear(self.inverse, image_delta)
    }

    /// Map a layer-local displacement into image space (translation ignored).
    pub fn image_delta(&self, local_delta: Vec2) -> Vec2 {
        apply_linear(self.forward, local_delta)
    }
}

/// Shear factor for a tilt angle, clamped away from the tangent singularity.
pub fn tilt_tangent(deg: f64) -> f64 {
    let t = deg.to_radians().tan();
    if t.is_finite() {
        t.clamp(-TILT_TANGENT_LIMIT, TILT_TANGENT_LIMIT)
    } else {
        0.0
    }
}

/// Build the forward mapping for `params`.
///
/// Order: translate to `position`, pivot on the box center, rotate, then the two independent
/// shear axes (skew applies to local points first, matching `rotate(..) skew(..)`).
pub fn try_resolve(params: &TransformParams) -> Option<ResolvedTransform> {
    let linear = Affine::rotate(params.rotation_deg.to_radians())
        * Affine::skew(
            tilt_tangent(params.horizontal_tilt_deg),
            tilt_tangent(params.vertical_tilt_deg),
        );
    place(linear, params)
}

/// Resolve a layer, falling back to the rotation/shear of its last known-good transform placed
/// at the current position, and finally to a plain translation. The result is always finite
/// and invertible.
pub fn resolve(layer: &TextLayer) -> ResolvedTransform {
    let params = layer.transform_params();
    try_resolve(&params)
        .or_else(|| {
            layer
                .last_good_transform()
                .and_then(|good| place(linear_part(good), &params))
        })
        .unwrap_or_else(|| ResolvedTransform::translation(layer.position()))
}

/// Put a linear map at `params.position`, pivoting on the box center.
fn place(linear: Affine, params: &TransformParams) -> Option<ResolvedTransform> {
    let center = Vec2::new(params.size.width * 0.5, params.size.height * 0.5);
    let forward = Affine::translate(params.position.to_vec2() + center)
        * linear
        * Affine::translate(-center);
    ResolvedTransform::from_forward(forward)
}

fn linear_part(a: Affine) -> Affine {
    let [m0, m1, m2, m3, _, _] = a.as_coeffs();
    Affine::new([m0, m1, m2, m3, 0.0, 0.0])
}

/// Corners of the transformed text box in image space (TL, TR, BR, BL).
pub fn layer_corners(layer: &TextLayer) -> [Point; 4] {
    let t = resolve(layer);
    let Size { width, height } = layer.bounding_size();
    [
        t.to_image(Point::new(0.0, 0.0)),
        t.to_image(Point::new(width, 0.0)),
        t.to_image(Point::new(width, height)),
        t.to_image(Point::new(0.0, height)),
    ]
}

/// Containment test against the rotated/sheared box rather than the axis-aligned one.
pub fn contains(layer: &TextLayer, image_point: Point) -> bool {
    let local = resolve(layer).to_local(image_point);
    let Size { width, height } = layer.bounding_size();
    (0.0..=width).contains(&local.x) && (0.0..=height).contains(&local.y)
}

fn apply_linear(a: Affine, v: Vec2) -> Vec2 {
    let [m0, m1, m2, m3, _, _] = a.as_coeffs();
    Vec2::new(m0 * v.x + m2 * v.y, m1 * v.x + m3 * v.y)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/resolver.rs"]
mod tests;
