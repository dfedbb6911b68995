//! Common test fixtures for the mapping pipeline.
//!
//! This module provides pre-defined extents, event documents and vector
//! layers, plus [`EventFixture`] which lays them out on disk the way a
//! processed event looks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use crate::generators::{
    create_ln_motion_grid, create_mmi_bowl, create_topography_grid, grid_document,
};

/// Common extents as (xmin, xmax, ymin, ymax).
pub mod extent {
    /// Southern California, used by most map tests
    pub const SOCAL: (f64, f64, f64, f64) = (-120.0, -116.0, 33.0, 36.0);

    /// Fiji region, crosses the antimeridian (xmax < xmin)
    pub const FIJI: (f64, f64, f64, f64) = (178.0, -178.0, -20.0, -16.0);

    /// Topography coverage around [`SOCAL`]
    pub const SOCAL_TOPO: (f64, f64, f64, f64) = (-121.0, -115.0, 32.0, 37.0);
}

/// `info.json` for a synthetic Southern California event.
pub const INFO_JSON: &str = r#"{
  "input": {
    "event_information": {
      "event_id": "ci99999999",
      "eventsource": "ci",
      "latitude": "34.5",
      "longitude": "-118.0",
      "depth": "10.0",
      "magnitude": "6.4",
      "event_description": "Synthetic Valley",
      "origin_time": "2020-03-01 12:30:00"
    }
  }
}"#;

/// Station list mixing macroseismic and instrumental records.
pub const STATIONLIST_JSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "id": "DYFI.1",
     "geometry": {"type": "Point", "coordinates": [-118.2, 34.6]},
     "properties": {"network": "DYFI", "intensity": 5.1,
       "channels": [{"name": "mmi", "amplitudes": [{"name": "mmi", "value": 5.1}]}]}},
    {"type": "Feature", "id": "CI.ABC",
     "geometry": {"type": "Point", "coordinates": [-117.7, 34.3]},
     "properties": {"network": "CI", "intensity": 6.2,
       "channels": [{"name": "HNE", "amplitudes": [
         {"name": "pga", "value": 22.4},
         {"name": "pgv", "value": 18.0},
         {"name": "sa(0.3)", "value": "null"},
         {"name": "sa(1.0)", "value": 15.5}]}]}}
  ]
}"#;

/// Rupture with a single quadrilateral near the epicenter.
pub const RUPTURE_JSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[
       [-118.2, 34.4, 0.0], [-117.8, 34.6, 0.0], [-117.8, 34.6, 15.0],
       [-118.2, 34.4, 15.0], [-118.2, 34.4, 0.0]]]]}}
  ]
}"#;

/// Point-source rupture.
pub const POINT_RUPTURE_JSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {},
     "geometry": {"type": "Point", "coordinates": [-118.0, 34.5, 10.0]}}
  ]
}"#;

fn feature_collection(geometries: Vec<serde_json::Value>) -> String {
    let features: Vec<_> = geometries
        .into_iter()
        .map(|g| json!({"type": "Feature", "properties": {}, "geometry": g}))
        .collect();
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// Vector layers as GeoJSON documents, keyed by layer name.
pub mod layers {
    use serde_json::json;

    use super::feature_collection;

    /// Ocean covering the south-west corner of [`super::extent::SOCAL`] and beyond.
    pub fn ocean() -> String {
        feature_collection(vec![json!({
            "type": "Polygon",
            "coordinates": [[[-125.0, 30.0], [-117.5, 30.0], [-117.5, 33.6],
                             [-119.0, 34.4], [-125.0, 34.4], [-125.0, 30.0]]]
        })])
    }

    /// Coastline following the ocean edge.
    pub fn coast() -> String {
        feature_collection(vec![json!({
            "type": "LineString",
            "coordinates": [[-117.5, 30.0], [-117.5, 33.6], [-119.0, 34.4], [-125.0, 34.4]]
        })])
    }

    /// One valid lake and one self-intersecting "bowtie" lake.
    pub fn lake_with_bowtie() -> String {
        feature_collection(vec![
            json!({
                "type": "Polygon",
                "coordinates": [[[-117.0, 35.0], [-116.6, 35.0], [-116.6, 35.3],
                                 [-117.0, 35.3], [-117.0, 35.0]]]
            }),
            json!({
                "type": "Polygon",
                "coordinates": [[[-119.5, 35.0], [-119.0, 35.5], [-119.0, 35.0],
                                 [-119.5, 35.5], [-119.5, 35.0]]]
            }),
        ])
    }

    /// Country border crossing the extent plus one far away.
    pub fn country() -> String {
        feature_collection(vec![
            json!({
                "type": "LineString",
                "coordinates": [[-121.0, 32.5], [-115.0, 32.5], [-114.0, 33.5]]
            }),
            json!({
                "type": "LineString",
                "coordinates": [[10.0, 45.0], [12.0, 46.0]]
            }),
        ])
    }

    /// State boundary as a polygon extending past the extent.
    pub fn state() -> String {
        feature_collection(vec![json!({
            "type": "Polygon",
            "coordinates": [[[-121.0, 32.0], [-116.5, 32.0], [-116.5, 38.0],
                             [-121.0, 38.0], [-121.0, 32.0]]]
        })])
    }

    /// A small road network sample.
    pub fn roads() -> String {
        feature_collection(vec![json!({
            "type": "MultiLineString",
            "coordinates": [[[-119.0, 34.0], [-117.0, 35.0]], [[-118.0, 33.0], [-118.0, 36.5]]]
        })])
    }
}

/// A processed event laid out in a temporary directory.
///
/// ```text
/// <root>/products/      info.json, stationlist.json, rupture.json, *_mean.json
/// <root>/layers/        coast.json, ocean.json, lake.json, country.json, state.json
/// <root>/topo.json
/// ```
pub struct EventFixture {
    dir: TempDir,
}

impl EventFixture {
    /// Southern California event with MMI, PGA, PGV and SA(1.0) grids.
    pub fn socal() -> io::Result<Self> {
        let dir = TempDir::new()?;
        let fixture = Self { dir };
        fs::create_dir_all(fixture.products_dir())?;
        fs::create_dir_all(fixture.layers_dir())?;

        let products = fixture.products_dir();
        fs::write(products.join("info.json"), INFO_JSON)?;
        fs::write(products.join("stationlist.json"), STATIONLIST_JSON)?;
        fs::write(products.join("rupture.json"), RUPTURE_JSON)?;

        let (w, h) = (41, 31);
        let bounds = extent::SOCAL;
        fs::write(
            products.join("MMI_mean.json"),
            grid_document(bounds, 0.1, w, h, &create_mmi_bowl(w, h, 7.8, 2.3)),
        )?;
        for tag in ["PGA", "PSA1p0"] {
            fs::write(
                products.join(format!("{}_mean.json", tag)),
                grid_document(bounds, 0.1, w, h, &create_ln_motion_grid(w, h, 0.5, 60.0)),
            )?;
        }
        fs::write(
            products.join("PGV_mean.json"),
            grid_document(
                bounds,
                0.1,
                w,
                h,
                &create_ln_motion_grid(w, h, 0.5, 60.0)
                    .into_iter()
                    .map(|v| v + 100f64.ln())
                    .collect::<Vec<_>>(),
            ),
        )?;

        let (tw, th) = (121, 101);
        fs::write(
            fixture.topography_path(),
            grid_document(extent::SOCAL_TOPO, 0.05, tw, th, &create_topography_grid(tw, th)),
        )?;

        let layers_dir = fixture.layers_dir();
        fs::write(layers_dir.join("coast.json"), layers::coast())?;
        fs::write(layers_dir.join("ocean.json"), layers::ocean())?;
        fs::write(layers_dir.join("lake.json"), layers::lake_with_bowtie())?;
        fs::write(layers_dir.join("country.json"), layers::country())?;
        fs::write(layers_dir.join("state.json"), layers::state())?;

        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn products_dir(&self) -> PathBuf {
        self.dir.path().join("products")
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.dir.path().join("layers")
    }

    pub fn topography_path(&self) -> PathBuf {
        self.dir.path().join("topo.json")
    }

    /// Path of a named layer document.
    pub fn layer_path(&self, name: &str) -> PathBuf {
        self.layers_dir().join(format!("{}.json", name))
    }

    /// Replace the rupture with a point source.
    pub fn use_point_rupture(&self) -> io::Result<()> {
        fs::write(self.products_dir().join("rupture.json"), POINT_RUPTURE_JSON)
    }
}
