use std::fmt;
use std::str::FromStr;

use crate::assets::fonts::FONT_CATALOG;
use crate::foundation::core::{Affine, Point, Rgb8, Size, Vec2};
use crate::foundation::error::TextBlendError;
use crate::foundation::math::clamp_finite;
use crate::transform::resolver::{TransformParams, try_resolve};

pub const FONT_SIZE_MIN_PX: u32 = 20;
pub const FONT_SIZE_MAX_PX: u32 = 400;
/// Mid-range of the font size domain, used for new layers.
pub const DEFAULT_FONT_SIZE_PX: u32 = (FONT_SIZE_MIN_PX + FONT_SIZE_MAX_PX) / 2;
pub const ROTATION_RANGE_DEG: (f64, f64) = (-180.0, 180.0);
pub const TILT_RANGE_DEG: (f64, f64) = (-45.0, 45.0);
pub const LETTER_SPACING_RANGE_PX: (f64, f64) = (-10.0, 50.0);

/// Stable identifier of a text layer. Identifiers are never reused within a store.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub(crate) u64);

impl LayerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Pixel-combination function applied when a text layer lands on the accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// All modes in presentation order.
    pub const ALL: [BlendMode; 12] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
    ];

    /// CSS `mix-blend-mode` keyword for this mode.
    pub fn css_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for BlendMode {
    type Err = TextBlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        BlendMode::ALL
            .into_iter()
            .find(|m| m.css_name() == needle)
            .ok_or_else(|| TextBlendError::validation(format!("unknown blend mode '{s}'")))
    }
}

/// One positionable, styled text element.
///
/// Fields are private: every write goes through a setter that clamps to the documented domain
/// (or ignores non-finite input), so a stored layer is always in range.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextLayer {
    id: LayerId,
    content: String,
    color: Rgb8,
    font_family: String,
    font_size_px: u32,
    position: Point,
    bounding_size: Size,
    opacity: f64,
    rotation_deg: f64,
    letter_spacing_px: f64,
    horizontal_tilt_deg: f64,
    vertical_tilt_deg: f64,
    blend_mode: BlendMode,
    #[serde(skip)]
    last_good_transform: Option<Affine>,
}

impl TextLayer {
    /// A layer with model defaults: empty text, white, first catalog font, mid-range size,
    /// opaque, normal blend, untransformed at the origin.
    pub fn new(id: LayerId) -> Self {
        let mut layer = Self {
            id,
            content: String::new(),
            color: Rgb8::WHITE,
            font_family: FONT_CATALOG[0].to_string(),
            font_size_px: DEFAULT_FONT_SIZE_PX,
            position: Point::ZERO,
            bounding_size: Size::ZERO,
            opacity: 1.0,
            rotation_deg: 0.0,
            letter_spacing_px: 0.0,
            horizontal_tilt_deg: 0.0,
            vertical_tilt_deg: 0.0,
            blend_mode: BlendMode::Normal,
            last_good_transform: None,
        };
        layer.refresh_transform();
        layer
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn color(&self) -> Rgb8 {
        self.color
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size_px(&self) -> u32 {
        self.font_size_px
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn bounding_size(&self) -> Size {
        self.bounding_size
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    pub fn letter_spacing_px(&self) -> f64 {
        self.letter_spacing_px
    }

    pub fn horizontal_tilt_deg(&self) -> f64 {
        self.horizontal_tilt_deg
    }

    pub fn vertical_tilt_deg(&self) -> f64 {
        self.vertical_tilt_deg
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Most recent forward transform that resolved to finite, invertible values.
    pub fn last_good_transform(&self) -> Option<Affine> {
        self.last_good_transform
    }

    pub fn transform_params(&self) -> TransformParams {
        TransformParams {
            position: self.position,
            size: self.bounding_size,
            rotation_deg: self.rotation_deg,
            horizontal_tilt_deg: self.horizontal_tilt_deg,
            vertical_tilt_deg: self.vertical_tilt_deg,
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_color(&mut self, color: Rgb8) {
        self.color = color;
    }

    /// Catalog gating is the session's concern; the model accepts any non-empty family.
    pub fn set_font_family(&mut self, family: &str) {
        let family = family.trim();
        if family.is_empty() {
            tracing::debug!(layer = %self.id, "ignoring empty font family");
            return;
        }
        self.font_family = family.to_string();
    }

    pub fn set_font_size_px(&mut self, size: i64) {
        let lo = i64::from(FONT_SIZE_MIN_PX);
        let hi = i64::from(FONT_SIZE_MAX_PX);
        self.font_size_px = size.clamp(lo, hi) as u32;
    }

    pub fn set_position(&mut self, position: Point) {
        if !(position.x.is_finite() && position.y.is_finite()) {
            tracing::debug!(layer = %self.id, "ignoring non-finite position");
            return;
        }
        self.position = position;
        self.refresh_transform();
    }

    pub fn set_bounding_size(&mut self, size: Size) {
        if !(size.width.is_finite() && size.height.is_finite()) {
            tracing::debug!(layer = %self.id, "ignoring non-finite bounding size");
            return;
        }
        self.bounding_size = Size::new(size.width.max(0.0), size.height.max(0.0));
        self.refresh_transform();
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if let Some(v) = clamp_finite(opacity, 0.0, 1.0) {
            self.opacity = v;
        }
    }

    pub fn set_rotation_deg(&mut self, deg: f64) {
        if let Some(v) = clamp_finite(deg, ROTATION_RANGE_DEG.0, ROTATION_RANGE_DEG.1) {
            self.rotation_deg = v;
            self.refresh_transform();
        }
    }

    pub fn set_letter_spacing_px(&mut self, px: f64) {
        if let Some(v) = clamp_finite(px, LETTER_SPACING_RANGE_PX.0, LETTER_SPACING_RANGE_PX.1) {
            self.letter_spacing_px = v;
        }
    }

    pub fn set_horizontal_tilt_deg(&mut self, deg: f64) {
        if let Some(v) = clamp_finite(deg, TILT_RANGE_DEG.0, TILT_RANGE_DEG.1) {
            self.horizontal_tilt_deg = v;
            self.refresh_transform();
        }
    }

    pub fn set_vertical_tilt_deg(&mut self, deg: f64) {
        if let Some(v) = clamp_finite(deg, TILT_RANGE_DEG.0, TILT_RANGE_DEG.1) {
            self.vertical_tilt_deg = v;
            self.refresh_transform();
        }
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    /// Apply every field present in `patch`, each independently.
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(content) = &patch.content {
            self.set_content(content.clone());
        }
        if let Some(color) = patch.color {
            self.set_color(color);
        }
        if let Some(family) = &patch.font_family {
            self.set_font_family(family);
        }
        if let Some(size) = patch.font_size_px {
            self.set_font_size_px(size);
        }
        if let Some(position) = patch.position {
            self.set_position(position);
        }
        if let Some(size) = patch.bounding_size {
            self.set_bounding_size(size);
        }
        if let Some(opacity) = patch.opacity {
            self.set_opacity(opacity);
        }
        if let Some(deg) = patch.rotation_deg {
            self.set_rotation_deg(deg);
        }
        if let Some(px) = patch.letter_spacing_px {
            self.set_letter_spacing_px(px);
        }
        if let Some(deg) = patch.horizontal_tilt_deg {
            self.set_horizontal_tilt_deg(deg);
        }
        if let Some(deg) = patch.vertical_tilt_deg {
            self.set_vertical_tilt_deg(deg);
        }
        if let Some(mode) = patch.blend_mode {
            self.set_blend_mode(mode);
        }
    }

    /// Deep copy under a new identity, shifted by `offset`.
    pub(crate) fn duplicate_as(&self, id: LayerId, offset: Vec2) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy.set_position(self.position + offset);
        copy
    }

    fn refresh_transform(&mut self) {
        if let Some(resolved) = try_resolve(&self.transform_params()) {
            self.last_good_transform = Some(resolved.forward);
        }
    }
}

/// Partial update of a layer. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_px: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_tilt_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_tilt_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
}

impl LayerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn color(mut self, color: Rgb8) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the color from a hex string; malformed input leaves the field unset.
    pub fn color_hex(mut self, hex: &str) -> Self {
        match Rgb8::parse_hex(hex) {
            Some(c) => self.color = Some(c),
            None => tracing::debug!(hex, "rejecting malformed color"),
        }
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn font_size_px(mut self, size: i64) -> Self {
        self.font_size_px = Some(size);
        self
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn bounding_size(mut self, width: f64, height: f64) -> Self {
        self.bounding_size = Some(Size::new(width, height));
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn rotation_deg(mut self, deg: f64) -> Self {
        self.rotation_deg = Some(deg);
        self
    }

    pub fn letter_spacing_px(mut self, px: f64) -> Self {
        self.letter_spacing_px = Some(px);
        self
    }

    pub fn horizontal_tilt_deg(mut self, deg: f64) -> Self {
        self.horizontal_tilt_deg = Some(deg);
        self
    }

    pub fn vertical_tilt_deg(mut self, deg: f64) -> Self {
        self.vertical_tilt_deg = Some(deg);
        self
    }

    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = Some(mode);
        self
    }

    /// Whether applying this patch can change the shaped text and therefore the measured box.
    pub fn touches_text_layout(&self) -> bool {
        self.content.is_some()
            || self.font_family.is_some()
            || self.font_size_px.is_some()
            || self.letter_spacing_px.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/model.rs"]
mod tests;
