//! Error types for map rendering.

use shake_common::MapError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown color palette: {0}")]
    UnknownPalette(String),

    #[error("Raster has {actual} values, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("Invalid SVG document: {0}")]
    Svg(String),

    #[error("Failed to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub(crate) fn check_dims(data: &[f64], width: usize, height: usize) -> RenderResult<()> {
        if width < 2 || height < 2 || data.len() != width * height {
            return Err(RenderError::DimensionMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => RenderError::Io(e),
            other => RenderError::Encode(other.to_string()),
        }
    }
}

impl From<RenderError> for MapError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Configuration(msg) => MapError::Configuration(msg),
            RenderError::UnknownPalette(name) => {
                MapError::Configuration(format!("unknown color palette '{}'", name))
            }
            RenderError::Io(e) => MapError::Io(e),
            other => MapError::Render(other.to_string()),
        }
    }
}
