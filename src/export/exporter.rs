use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use image::ImageEncoder as _;

use crate::assets::fonts::{FontRegistry, FontSet};
use crate::foundation::core::Resolution;
use crate::foundation::error::{TextBlendError, TextBlendResult};
use crate::layer::store::SceneSnapshot;
use crate::render::backend::FrameRGBA;
use crate::render::compositor::Compositor;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;
pub const DEFAULT_FONT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Encoded still-image format of an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless, keeps transparency.
    #[default]
    Png,
    /// Lossy; transparent regions flatten onto black.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
            Self::Jpeg { quality } => write!(f, "jpeg (quality {quality})"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TextBlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::jpeg(DEFAULT_JPEG_QUALITY)),
            other => Err(TextBlendError::validation(format!(
                "unknown export format '{other}' (expected png or jpeg)"
            ))),
        }
    }
}

/// Renders a scene at the base image's native resolution and encodes it.
#[derive(Debug)]
pub struct Exporter {
    compositor: Compositor,
    font_timeout: Duration,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Compositor::new(), DEFAULT_FONT_TIMEOUT)
    }
}

impl Exporter {
    pub fn new(compositor: Compositor, font_timeout: Duration) -> Self {
        Self {
            compositor,
            font_timeout,
        }
    }

    pub fn font_timeout(&self) -> Duration {
        self.font_timeout
    }

    /// Flatten `scene` to encoded bytes at native resolution.
    ///
    /// Blocks until every referenced family (and the fallback) is settled in `fonts`, or until the
    /// font timeout, after which it proceeds with whatever is loaded.
    #[tracing::instrument(skip(self, scene, fonts), fields(layers = scene.layers().len()))]
    pub fn export(
        &mut self,
        scene: &SceneSnapshot,
        fonts: &FontRegistry,
        format: ExportFormat,
    ) -> TextBlendResult<Vec<u8>> {
        native_target(scene)?;
        let set = self.wait_for_fonts(scene, fonts);
        self.export_with_fonts(scene, &set, format)
    }

    /// Encode `scene` against an already settled font set.
    pub fn export_with_fonts(
        &mut self,
        scene: &SceneSnapshot,
        fonts: &FontSet,
        format: ExportFormat,
    ) -> TextBlendResult<Vec<u8>> {
        let frame = self.render_with_fonts(scene, fonts)?;
        let bytes = encode_frame(&frame, format)?;
        tracing::info!(
            width = frame.width,
            height = frame.height,
            %format,
            bytes = bytes.len(),
            "export encoded"
        );
        Ok(bytes)
    }

    /// The raster [`Exporter::export`] would encode.
    pub fn render_native(
        &mut self,
        scene: &SceneSnapshot,
        fonts: &FontRegistry,
    ) -> TextBlendResult<FrameRGBA> {
        let set = self.wait_for_fonts(scene, fonts);
        self.render_with_fonts(scene, &set)
    }

    /// Wait, up to the font timeout, for the families `scene` uses plus the fallback.
    pub fn wait_for_fonts(&self, scene: &SceneSnapshot, fonts: &FontRegistry) -> Arc<FontSet> {
        let mut wanted = scene.referenced_families();
        wanted.insert(self.compositor.fallback_family().to_string());
        let (set, settled) = fonts.wait_for(&wanted, self.font_timeout);
        if !settled {
            let pending: Vec<&str> = wanted
                .iter()
                .filter(|f| !set.is_settled(f))
                .map(String::as_str)
                .collect();
            tracing::warn!(
                ?pending,
                timeout_ms = self.font_timeout.as_millis() as u64,
                "fonts not ready, exporting with fallback"
            );
        }
        set
    }

    fn render_with_fonts(
        &mut self,
        scene: &SceneSnapshot,
        fonts: &FontSet,
    ) -> TextBlendResult<FrameRGBA> {
        let target = native_target(scene)?;
        Ok(self.compositor.render(scene, target, fonts))
    }
}

/// Export raster size: the base image's own dimensions.
pub(crate) fn native_target(scene: &SceneSnapshot) -> TextBlendResult<Resolution> {
    scene
        .native_resolution()
        .ok_or_else(|| TextBlendError::export("no base image to export"))
}

/// Encode a frame as PNG (straight alpha) or JPEG (flattened onto black).
pub fn encode_frame(frame: &FrameRGBA, format: ExportFormat) -> TextBlendResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ExportFormat::Png => image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                &frame.to_straight_rgba8(),
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| TextBlendError::export(format!("encode png: {e}")))?,
        ExportFormat::Jpeg { quality } => {
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
                .write_image(
                    &frame.to_rgb8_on_black(),
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| TextBlendError::export(format!("encode jpeg: {e}")))?
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/export/exporter.rs"]
mod tests;
