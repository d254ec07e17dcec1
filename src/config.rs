use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::fonts::FONT_CATALOG;
use crate::export::exporter::ExportFormat;
use crate::foundation::core::Rgb8;
use crate::foundation::error::{TextBlendError, TextBlendResult};

/// Editor settings. Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// On-screen preview width; the height follows the base image's aspect ratio.
    pub preview_width: u32,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
    pub load_system_fonts: bool,
    /// Family substituted while a layer's own family is not loaded.
    pub fallback_family: String,
    /// Upper bound on how long an export waits for fonts.
    pub export_font_timeout_ms: u64,
    /// Offset applied to both axes of a duplicated layer.
    pub duplicate_offset_px: f64,
    pub default_content: String,
    pub default_color: Rgb8,
    pub export_format: ExportFormat,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_width: 800,
            font_dirs: Vec::new(),
            load_system_fonts: true,
            fallback_family: FONT_CATALOG[0].to_string(),
            export_font_timeout_ms: 3000,
            duplicate_offset_px: 20.0,
            default_content: "Text".to_string(),
            default_color: Rgb8::WHITE,
            export_format: ExportFormat::Png,
        }
    }
}

impl EditorConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> TextBlendResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| TextBlendError::serde(format!("parse editor config JSON: {e}")))
    }

    pub fn from_json_str(s: &str) -> TextBlendResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> TextBlendResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TextBlendError::serde(format!("open editor config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn export_font_timeout(&self) -> Duration {
        Duration::from_millis(self.export_font_timeout_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
