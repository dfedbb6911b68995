//! Vector map layers: sources, geometry kinds and clipping to the map extent.
//!
//! Layers (coastlines, oceans, lakes, borders, optional roads) are read from
//! shapefiles, GeoJSON documents or directory trees of regional files, and
//! clipped once per rendering session.

pub mod clipper;
pub mod error;
pub mod geometry;
pub mod source;

pub use clipper::{ClipOutcome, ClippedLayers, VectorClipper, VectorLayer};
pub use error::{GeometryError, VectorError, VectorResult};
pub use geometry::{GeometryVisitor, MapGeometry};
pub use source::{open_source, DirectorySource, GeoJsonSource, LayerSource, ShapefileSource};
