/// Convenience result type used across packdoc.
pub type PackResult<T> = Result<T, PackError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Failures of a single image never surface here; they are captured per source as a failed
/// [`ResolvedAsset`](crate::ResolvedAsset).
#[derive(thiserror::Error, Debug)]
pub enum PackError {
    /// Invalid caller-provided input: document JSON, option values or asset paths.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while reading image bytes from disk, the network or a data URL.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Errors while decoding source images or encoding the normalized JPEG.
    #[error("decode error: {0}")]
    Decode(String),

    /// The render engine rejected or failed to consume the enriched document.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PackError {
    /// Build a [`PackError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PackError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`PackError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PackError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PackError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
