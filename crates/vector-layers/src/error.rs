//! Error types for vector layer access and clipping.

use shake_common::MapError;
use thiserror::Error;

pub type VectorResult<T> = Result<T, VectorError>;

/// Failures opening or reading a layer source. These abort the session.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Failed to open {layer} layer at {path}: {message}")]
    Open {
        layer: String,
        path: String,
        message: String,
    },

    #[error("Failed to read {layer} layer: {message}")]
    Read { layer: String, message: String },

    #[error("Unsupported vector source for {layer}: {path}")]
    UnsupportedSource { layer: String, path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single shape could not be clipped. Never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ring self-intersects near ({x:.5}, {y:.5})")]
    SelfIntersection { x: f64, y: f64 },

    #[error("ring has {0} points, at least 4 are required")]
    DegenerateRing(usize),

    #[error("geometry contains non-finite coordinates")]
    NonFinite,

    #[error("cannot convert shape: {0}")]
    Conversion(String),
}

impl From<VectorError> for MapError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Io(e) => MapError::Io(e),
            other => MapError::Vector(other.to_string()),
        }
    }
}
