//! Error types for strata_core

use thiserror::Error;

use crate::geometry::GeometryType;

/// Errors that can occur while configuring or loading a layer
#[derive(Error, Debug)]
pub enum LayerError {
    /// Mask geometry is not a vector marker point, polygon or multi-polygon
    #[error("Invalid mask geometry {0}: expected a vector marker point, a polygon or a multi-polygon")]
    InvalidMask(GeometryType),

    /// The configured renderer kind has no registered implementation
    #[error(
        "Invalid renderer for Layer({}): {}",
        .layer_id.as_deref().unwrap_or(""),
        .kind.as_deref().unwrap_or("<none>")
    )]
    UnknownRenderer {
        kind: Option<String>,
        layer_id: Option<String>,
    },

    /// Layer options or profile could not be (de)serialized
    #[error("Layer options (de)serialization failed: {0}")]
    Options(#[from] serde_json::Error),
}

/// Result type for layer operations
pub type Result<T> = std::result::Result<T, LayerError>;
