//! Seam for the external city label placement engine.

use projection::MapProjection;
use shake_common::GeoExtent;

use crate::config::CityGridConfig;

/// A city the placement engine decided to show.
#[derive(Debug, Clone, PartialEq)]
pub struct CityLabel {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub font_size: f64,
}

/// Chooses which cities to label on a map.
///
/// Implementations bin candidate cities into a `cols × rows` grid over the
/// map, keep at most `per_cell` per bin and prune labels that collide. The
/// composer draws whatever is returned, unchanged.
pub trait CityPlacer {
    fn place(
        &self,
        extent: &GeoExtent,
        projection: &MapProjection,
        grid: &CityGridConfig,
    ) -> Vec<CityLabel>;
}

/// Placer used when no engine is attached: labels nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCities;

impl CityPlacer for NoCities {
    fn place(&self, _: &GeoExtent, _: &MapProjection, _: &CityGridConfig) -> Vec<CityLabel> {
        Vec::new()
    }
}
