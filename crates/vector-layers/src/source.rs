//! Vector layer sources.
//!
//! A source is opened fresh for every query and its file handles are dropped
//! when the query returns, whether it succeeds or fails.

use std::convert::TryInto;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geojson::GeoJson;
use shake_common::GeoExtent;
use walkdir::WalkDir;

use crate::error::{GeometryError, VectorError, VectorResult};
use crate::geometry::MapGeometry;

/// A shape read from a source, or the reason it could not be converted.
pub type SourceShape = Result<MapGeometry, GeometryError>;

/// A named collection of global vector features.
pub trait LayerSource {
    /// Layer key, e.g. `coast` or `lake`.
    fn name(&self) -> &str;

    /// Features whose bounding box overlaps the extent, in storage order.
    fn query(&self, extent: &GeoExtent) -> VectorResult<Vec<SourceShape>>;
}

/// Open the right source for a path: `.shp` files, GeoJSON documents, or a
/// directory tree of regional files.
pub fn open_source(name: &str, path: &Path) -> VectorResult<Box<dyn LayerSource>> {
    if path.is_dir() {
        return Ok(Box::new(DirectorySource::new(name, path)));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "shp" => Ok(Box::new(ShapefileSource::new(name, path))),
        "json" | "geojson" => Ok(Box::new(GeoJsonSource::new(name, path))),
        _ => Err(VectorError::UnsupportedSource {
            layer: name.to_string(),
            path: path.display().to_string(),
        }),
    }
}

/// Whether a lon/lat box overlaps the extent, also trying the box moved 360°
/// west when the extent wraps the antimeridian.
fn box_overlaps(extent: &GeoExtent, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
    extent.intersects_box(min_x, min_y, max_x, max_y)
        || (extent.crosses_antimeridian()
            && extent.intersects_box(min_x - 360.0, min_y, max_x - 360.0, max_y))
}

/// Keep a feature, as stored, if its bounding box overlaps the extent.
fn overlapping(geometry: MapGeometry, extent: &GeoExtent) -> Option<MapGeometry> {
    let rect = geometry.bounds()?;
    box_overlaps(extent, rect.min().x, rect.min().y, rect.max().x, rect.max().y).then_some(geometry)
}

fn filter_shape(shape: SourceShape, extent: &GeoExtent) -> Option<SourceShape> {
    match shape {
        Ok(geometry) => overlapping(geometry, extent).map(Ok),
        Err(e) => Some(Err(e)),
    }
}

/// ESRI shapefile source. Only the `.shp` geometry is read.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    name: String,
    path: PathBuf,
}

impl ShapefileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Extent declared in the file header as (min_x, min_y, max_x, max_y).
    pub fn declared_bounds(&self) -> VectorResult<(f64, f64, f64, f64)> {
        let reader = shapefile::ShapeReader::from_path(&self.path).map_err(|e| self.open_error(e))?;
        let bbox = &reader.header().bbox;
        Ok((bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y))
    }

    fn open_error(&self, e: shapefile::Error) -> VectorError {
        VectorError::Open {
            layer: self.name.clone(),
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl LayerSource for ShapefileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, extent: &GeoExtent) -> VectorResult<Vec<SourceShape>> {
        let mut reader = shapefile::ShapeReader::from_path(&self.path).map_err(|e| self.open_error(e))?;

        let mut shapes = Vec::new();
        for result in reader.iter_shapes() {
            let shape = result.map_err(|e| VectorError::Read {
                layer: self.name.clone(),
                message: e.to_string(),
            })?;
            if matches!(shape, shapefile::Shape::NullShape) {
                continue;
            }
            let converted: Result<geo::Geometry<f64>, _> = shape.try_into();
            let item = match converted {
                Ok(geometry) => match MapGeometry::from_geo(geometry) {
                    Some(g) => Ok(g),
                    None => continue,
                },
                Err(e) => Err(GeometryError::Conversion(format!("{:?}", e))),
            };
            if let Some(kept) = filter_shape(item, extent) {
                shapes.push(kept);
            }
        }
        Ok(shapes)
    }
}

/// GeoJSON FeatureCollection (or bare geometry) source.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    name: String,
    path: PathBuf,
}

impl GeoJsonSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn read(&self) -> VectorResult<Vec<geojson::Geometry>> {
        let file = File::open(&self.path).map_err(|e| VectorError::Open {
            layer: self.name.clone(),
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let geojson = GeoJson::from_reader(BufReader::new(file)).map_err(|e| VectorError::Read {
            layer: self.name.clone(),
            message: e.to_string(),
        })?;

        Ok(match geojson {
            GeoJson::FeatureCollection(fc) => fc.features.into_iter().filter_map(|f| f.geometry).collect(),
            GeoJson::Feature(f) => f.geometry.into_iter().collect(),
            GeoJson::Geometry(g) => vec![g],
        })
    }
}

impl LayerSource for GeoJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, extent: &GeoExtent) -> VectorResult<Vec<SourceShape>> {
        let mut shapes = Vec::new();
        for geom in self.read()? {
            let converted: Result<geo::Geometry<f64>, _> = geom.value.try_into();
            let item = match converted {
                Ok(geometry) => match MapGeometry::from_geo(geometry) {
                    Some(g) => Ok(g),
                    None => continue,
                },
                Err(e) => Err(GeometryError::Conversion(e.to_string())),
            };
            if let Some(kept) = filter_shape(item, extent) {
                shapes.push(kept);
            }
        }
        Ok(shapes)
    }
}

/// A directory tree of regional files, e.g. roads split by continent.
///
/// Shapefiles whose header extent misses the map are skipped without
/// reading their shapes.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    name: String,
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    fn regional_files(&self) -> VectorResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| VectorError::Read {
                layer: self.name.clone(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_vector = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "shp" | "geojson"))
                .unwrap_or(false);
            if is_vector {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl LayerSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, extent: &GeoExtent) -> VectorResult<Vec<SourceShape>> {
        let mut shapes = Vec::new();
        for path in self.regional_files()? {
            let is_shp = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("shp"))
                .unwrap_or(false);
            if is_shp {
                let source = ShapefileSource::new(self.name.clone(), &path);
                let (min_x, min_y, max_x, max_y) = source.declared_bounds()?;
                if !box_overlaps(extent, min_x, min_y, max_x, max_y) {
                    tracing::trace!(file = %path.display(), "Regional file outside map extent");
                    continue;
                }
                shapes.extend(source.query(extent)?);
            } else {
                shapes.extend(GeoJsonSource::new(self.name.clone(), &path).query(extent)?);
            }
        }
        Ok(shapes)
    }
}
