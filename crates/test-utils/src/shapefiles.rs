//! Shapefiles written on the fly, for exercising the `.shp` layer sources.

use std::path::Path;

use shapefile::{Point, Polyline, ShapeWriter};

/// Write one polyline record per vertex list to `path`, plus the `.shx`
/// index next to it. The header bounding box covers every vertex.
///
/// Each list needs at least two vertices.
pub fn write_polylines(path: &Path, lines: &[Vec<(f64, f64)>]) -> Result<(), shapefile::Error> {
    let polylines: Vec<Polyline> = lines
        .iter()
        .map(|line| Polyline::new(line.iter().map(|&(x, y)| Point::new(x, y)).collect()))
        .collect();
    ShapeWriter::from_path(path)?.write_shapes(&polylines)
}
