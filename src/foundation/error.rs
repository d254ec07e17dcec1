/// Convenience result type used across textblend.
pub type TextBlendResult<T> = Result<T, TextBlendError>;

/// Recoverable error taxonomy surfaced to the presentation layer.
///
/// Out-of-range parameter values are never reported here; they are clamped where they enter the
/// layer model.
#[derive(thiserror::Error, Debug)]
pub enum TextBlendError {
    /// Input that cannot be clamped into a valid value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The uploaded image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The flattened image could not be produced or encoded.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing documents and configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TextBlendError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
