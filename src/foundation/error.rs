use crate::foundation::core::{LayerId, StepKey};

/// Convenience result type used across layerbake.
pub type LayerbakeResult<T> = Result<T, LayerbakeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum LayerbakeError {
    /// Non-positive scale, non-finite placement, or degenerate geometry.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// Requested or derived output canvas has no area.
    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),

    /// A layer id is not present in the session.
    #[error("missing layer: {0}")]
    MissingLayer(LayerId),

    /// A state step was never saved (or was removed).
    #[error("unknown step: {0}")]
    UnknownStep(StepKey),

    /// Annotation geometry inconsistent with its type or its owning layer.
    #[error("malformed annotation: {0}")]
    MalformedAnnotation(String),

    /// Pixel buffer whose length does not match its dimensions.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Invalid declarative bake configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayerbakeError {
    /// Build a [`LayerbakeError::InvalidTransform`] value.
    pub fn invalid_transform(msg: impl Into<String>) -> Self {
        Self::InvalidTransform(msg.into())
    }

    /// Build a [`LayerbakeError::InvalidCanvas`] value.
    pub fn invalid_canvas(msg: impl Into<String>) -> Self {
        Self::InvalidCanvas(msg.into())
    }

    /// Build a [`LayerbakeError::MalformedAnnotation`] value.
    pub fn malformed_annotation(msg: impl Into<String>) -> Self {
        Self::MalformedAnnotation(msg.into())
    }

    /// Build a [`LayerbakeError::InvalidRaster`] value.
    pub fn invalid_raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    /// Build a [`LayerbakeError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LayerbakeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
