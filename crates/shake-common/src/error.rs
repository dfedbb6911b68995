//! Error types for the map rendering pipeline.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map generation.
///
/// Geometric failures during vector clipping are not represented here: they
/// are recovered per shape and only logged.
#[derive(Debug, Error)]
pub enum MapError {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required vector layers: {0}")]
    MissingLayers(String),

    // === Data Errors ===
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid intensity measure type: {0}")]
    InvalidImt(String),

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    // === Rendering Errors ===
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Vector data error: {0}")]
    Vector(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MapError {
    /// Whether the error aborts the run before any rendering happens.
    pub fn is_fatal_before_render(&self) -> bool {
        matches!(
            self,
            MapError::Configuration(_)
                | MapError::MissingLayers(_)
                | MapError::DataNotAvailable(_)
        )
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        MapError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::parse("JSON", err)
    }
}
