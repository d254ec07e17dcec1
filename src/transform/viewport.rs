use crate::foundation::core::{Affine, Point, Resolution, Size, Vec2};

/// Cover/crop fit of a source rectangle (base-image pixels) onto a render target.
///
/// The source is scaled uniformly until it covers the target and centered; overflow is cropped,
/// never letterboxed. Text layers live in source space, so the same mapping keeps them anchored
/// at any target resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    source: Size,
    target: Resolution,
    scale: f64,
    to_target: Affine,
}

impl Viewport {
    pub fn cover(source: Size, target: Resolution) -> Self {
        if !(source.width > 0.0 && source.height > 0.0) {
            return Self::identity(target);
        }
        let target_size = target.as_size();
        let scale = (target_size.width / source.width).max(target_size.height / source.height);
        let offset = Vec2::new(
            (target_size.width - source.width * scale) * 0.5,
            (target_size.height - source.height * scale) * 0.5,
        );
        Self {
            source,
            target,
            scale,
            to_target: Affine::translate(offset) * Affine::scale(scale),
        }
    }

    /// Source space equals target space.
    pub fn identity(target: Resolution) -> Self {
        Self {
            source: target.as_size(),
            target,
            scale: 1.0,
            to_target: Affine::IDENTITY,
        }
    }

    pub fn source(&self) -> Size {
        self.source
    }

    pub fn target(&self) -> Resolution {
        self.target
    }

    /// Target pixels per source pixel.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_target(&self) -> Affine {
        self.to_target
    }

    pub fn to_source(&self) -> Affine {
        self.to_target.inverse()
    }

    /// Map a target (screen) point back into source (image) space.
    pub fn source_point(&self, target_point: Point) -> Point {
        self.to_source() * target_point
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/viewport.rs"]
mod tests;
