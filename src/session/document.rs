use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{TextBlendError, TextBlendResult};
use crate::layer::model::LayerPatch;

/// JSON description of a stack of text layers, bottom to top.
///
/// ```json
/// { "layers": [ { "content": "NATURE", "font_size_px": 300, "blend_mode": "overlay" } ] }
/// ```
///
/// Each entry is applied on top of a fresh default layer.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDocument {
    #[serde(default)]
    pub layers: Vec<LayerPatch>,
}

impl LayerDocument {
    pub fn from_reader<R: std::io::Read>(r: R) -> TextBlendResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| TextBlendError::serde(format!("parse layer document JSON: {e}")))
    }

    pub fn from_json_str(s: &str) -> TextBlendResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> TextBlendResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TextBlendError::serde(format!("open layer document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_pretty(&self) -> TextBlendResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TextBlendError::serde(format!("serialize layer document: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/document.rs"]
mod tests;
