//! Cartographic rendering for ShakeMap products.
//!
//! Builds page documents from projected rasters and vector geometry:
//! - Shaded relief with a draped intensity or topography raster
//! - Contour lines (smoothing, level picking, marching squares, labels)
//! - Scale bars
//! - SVG documents written as PDF, JPEG and PNG thumbnails

pub mod contour;
pub mod error;
pub mod output;
pub mod palette;
pub mod relief;
pub mod scalebar;
pub mod smoothing;
pub mod svg;

pub use contour::{ContourEngine, ContourLevel, ContourSet, LevelKind};
pub use error::{RenderError, RenderResult};
pub use output::MapOutput;
pub use palette::{ColorPalette, PaletteSet, Rgb};
pub use relief::{DrapeMode, ReliefCompositor};
pub use scalebar::ScaleBar;
pub use svg::{
    DrawPass, FigureSize, FillStyle, LineStyle, MapDocument, MapFrame, MarkerShape, MarkerStyle,
    TextAnchor, TextStyle, VerticalAlign,
};
