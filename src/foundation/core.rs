use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{TextBlendError, TextBlendResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Largest raster edge the CPU rasterizer accepts.
pub const MAX_RASTER_EDGE: u32 = u16::MAX as u32;

/// Pixel dimensions of a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Build a resolution, rejecting empty or oversize targets.
    pub fn new(width: u32, height: u32) -> TextBlendResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextBlendError::validation(
                "resolution width and height must be > 0",
            ));
        }
        if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
            return Err(TextBlendError::validation(format!(
                "resolution {width}x{height} exceeds {MAX_RASTER_EDGE} px per edge"
            )));
        }
        Ok(Self { width, height })
    }

    /// Resolution with the given width and the aspect ratio of `w`x`h`.
    ///
    /// The derived height is rounded and never drops below one pixel.
    pub fn with_width_keeping_aspect(width: u32, w: u32, h: u32) -> TextBlendResult<Self> {
        if w == 0 || h == 0 {
            return Err(TextBlendError::validation(
                "source dimensions must be > 0",
            ));
        }
        let height = ((f64::from(width) * f64::from(h)) / f64::from(w))
            .round()
            .max(1.0) as u32;
        Self::new(width, height)
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Opaque RGB text color. Transparency lives on the layer's opacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional). Returns `None` for anything else.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        fn nibble(b: u8) -> u8 {
            match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                _ => b - b'A' + 10,
            }
        }

        let b = hex.as_bytes();
        match b.len() {
            6 => Some(Self::new(
                (nibble(b[0]) << 4) | nibble(b[1]),
                (nibble(b[2]) << 4) | nibble(b[3]),
                (nibble(b[4]) << 4) | nibble(b[5]),
            )),
            3 => Some(Self::new(
                nibble(b[0]) * 17,
                nibble(b[1]) * 17,
                nibble(b[2]) * 17,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb8 {
    type Err = TextBlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
            .ok_or_else(|| TextBlendError::validation(format!("invalid hex color '{s}'")))
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = TextBlendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb8> for String {
    fn from(value: Rgb8) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
