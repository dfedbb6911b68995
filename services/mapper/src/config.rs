//! Mapping configuration loader.
//!
//! Loads the YAML mapping configuration: vector layer paths, the measures to
//! contour, palette names, figure size and the city placement grid.
//!
//! Supports environment variable substitution using ${VAR} syntax.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use renderer::{FigureSize, PaletteSet};
use serde::{Deserialize, Serialize};
use shake_common::{Imt, MapError, MapResult};
use vector_layers::{open_source, LayerSource};

/// Layer keys every configuration must provide.
pub const REQUIRED_LAYERS: [&str; 5] = ["coast", "ocean", "lake", "country", "state"];

/// Optional regional roads tree.
pub const ROADS_LAYER: &str = "roads";

/// Optional global topography grid document.
pub const TOPOGRAPHY_LAYER: &str = "topography";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Layer key to file or directory path.
    pub layers: BTreeMap<String, PathBuf>,

    /// Measures that get a contour map.
    #[serde(default = "default_imts")]
    pub imts: Vec<Imt>,

    #[serde(default)]
    pub palettes: PaletteNames,

    #[serde(default)]
    pub figure: FigureConfig,

    #[serde(default = "default_thumbnail_width")]
    pub thumbnail_width_px: u32,

    #[serde(default)]
    pub cities: CityGridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteNames {
    /// Palette for intensity rasters, station fills and MMI contours.
    pub intensity: String,
    /// Palette for the topography behind contour maps.
    pub contour: String,
}

impl Default for PaletteNames {
    fn default() -> Self {
        Self {
            intensity: "mmi".to_string(),
            contour: "shaketopo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FigureConfig {
    pub width_in: f64,
    pub height_in: f64,
    /// Resolution of the JPEG images.
    pub dpi: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 8.0,
            dpi: 150.0,
        }
    }
}

impl FigureConfig {
    pub fn size(&self) -> FigureSize {
        FigureSize {
            width_in: self.width_in,
            height_in: self.height_in,
        }
    }
}

/// Parameters forwarded to the city placement engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CityGridConfig {
    pub cols: usize,
    pub rows: usize,
    pub per_cell: usize,
}

impl Default for CityGridConfig {
    fn default() -> Self {
        Self {
            cols: 2,
            rows: 2,
            per_cell: 2,
        }
    }
}

fn default_imts() -> Vec<Imt> {
    vec![
        Imt::Mmi,
        Imt::Pga,
        Imt::Pgv,
        Imt::Sa(0.3),
        Imt::Sa(1.0),
        Imt::Sa(3.0),
    ]
}

fn default_thumbnail_width() -> u32 {
    100
}

impl MappingConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> MapResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MapError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse YAML after substituting `${VAR}` references, then validate.
    pub fn from_yaml_str(raw: &str) -> MapResult<Self> {
        let expanded = shellexpand::env(raw)
            .map_err(|e| MapError::Configuration(format!("environment substitution: {}", e)))?;
        let config: MappingConfig = serde_yaml::from_str(&expanded)
            .map_err(|e| MapError::Configuration(format!("invalid mapping config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MapResult<()> {
        let missing: Vec<&str> = REQUIRED_LAYERS
            .iter()
            .copied()
            .filter(|key| !self.layers.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(MapError::MissingLayers(missing.join(", ")));
        }
        if self.figure.width_in <= 0.0 || self.figure.height_in <= 0.0 || self.figure.dpi <= 0.0 {
            return Err(MapError::Configuration(
                "figure size and dpi must be positive".to_string(),
            ));
        }
        if self.thumbnail_width_px == 0 {
            return Err(MapError::Configuration(
                "thumbnail_width_px must be positive".to_string(),
            ));
        }
        self.palettes()?;
        Ok(())
    }

    /// Palettes named by the configuration.
    pub fn palettes(&self) -> MapResult<PaletteSet> {
        Ok(PaletteSet::from_names(
            &self.palettes.intensity,
            &self.palettes.contour,
        )?)
    }

    /// Sources for the required layers plus roads when configured.
    pub fn layer_sources(&self) -> MapResult<Vec<Box<dyn LayerSource>>> {
        let mut sources = Vec::new();
        for key in REQUIRED_LAYERS.iter().copied().chain(std::iter::once(ROADS_LAYER)) {
            if let Some(path) = self.layers.get(key) {
                sources.push(open_source(key, path)?);
            }
        }
        Ok(sources)
    }

    pub fn topography_path(&self) -> Option<&Path> {
        self.layers.get(TOPOGRAPHY_LAYER).map(PathBuf::as_path)
    }
}
