//! Map session: clips vectors once, then renders the intensity map and one
//! contour map per configured measure.

use std::path::{Path, PathBuf};
use std::time::Instant;

use projection::{project_grid, MapProjection};
use renderer::contour::to_display_units;
use renderer::{
    ContourEngine, DrapeMode, DrawPass, MapDocument, MapOutput, PaletteSet, ReliefCompositor,
};
use shake_common::{GeoDict, GeoExtent, Imt, MapResult};
use tracing::{debug, info};
use vector_layers::{ClippedLayers, VectorClipper};

use crate::cities::{CityPlacer, NoCities};
use crate::config::MappingConfig;
use crate::drawing::{self, MapContext};
use crate::inputs::EventInputs;

pub const INTENSITY_PDF: &str = "intensity.pdf";
pub const INTENSITY_JPEG: &str = "intensity.jpg";
pub const THUMBNAIL_FILE: &str = "pin-thumbnail.png";

const TITLE_FONT_SIZE: f64 = 10.0;

/// Contour map file name, e.g. `PSA1p0_contour.pdf`.
pub fn contour_pdf_name(imt: &Imt) -> String {
    format!("{}_contour.pdf", imt.file_tag())
}

/// Legacy JPEG name of a contour map, e.g. `psa10.jpg`.
pub fn contour_jpeg_name(imt: &Imt) -> String {
    format!("{}.jpg", imt.legacy_tag())
}

pub struct MapComposer {
    config: MappingConfig,
    inputs: EventInputs,
    palettes: PaletteSet,
    /// Grid every raster is resampled onto.
    dict: GeoDict,
    extent: GeoExtent,
    projection: MapProjection,
    /// Projected topography on `dict`.
    topography: Vec<f64>,
    layers: ClippedLayers,
    cities: Box<dyn CityPlacer>,
    output_dir: PathBuf,
}

impl MapComposer {
    /// Set up the session: align topography with the measure grid, build the
    /// projection and clip every vector layer.
    pub fn new(config: MappingConfig, inputs: EventInputs, output_dir: &Path) -> MapResult<Self> {
        let palettes = config.palettes()?;
        let mmi = inputs.grid(&Imt::Mmi)?;

        let (dict, topo_data) = match inputs.topography() {
            Some(topo) => {
                let dict = topo.geodict().bounds_within(mmi.geodict())?;
                (dict, topo.subset(&dict)?.into_data())
            }
            None => {
                let dict = *mmi.geodict();
                debug!("No topography configured, using flat relief");
                (dict, vec![0.0; dict.nx * dict.ny])
            }
        };

        let extent = dict.extent();
        let projection = MapProjection::for_extent(&extent)?;
        let topography = project_grid(&topo_data, &extent, &projection)?;

        let layers = {
            let sources = config.layer_sources()?;
            VectorClipper::new(extent).clip_all(&sources)?
        };

        info!(
            event_id = %inputs.info.event_id,
            nx = extent.nx,
            ny = extent.ny,
            crosses_antimeridian = extent.crosses_antimeridian(),
            "Map session ready"
        );

        Ok(Self {
            config,
            inputs,
            palettes,
            dict,
            extent,
            projection,
            topography,
            layers,
            cities: Box::new(NoCities),
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Attach a city placement engine.
    pub fn with_city_placer(mut self, placer: Box<dyn CityPlacer>) -> Self {
        self.cities = placer;
        self
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }

    pub fn layers(&self) -> &ClippedLayers {
        &self.layers
    }

    fn context(&self) -> MapContext<'_> {
        MapContext::new(&self.extent, &self.projection)
    }

    fn new_document(&self) -> MapDocument {
        MapDocument::new(
            self.config.figure.size(),
            self.projection.width(),
            self.projection.height(),
        )
    }

    /// Measure grid resampled onto the session grid and projected.
    fn projected_measure(&self, imt: &Imt) -> MapResult<Vec<f64>> {
        let aligned = self.inputs.grid(imt)?.interpolate_to(&self.dict)?;
        project_grid(aligned.data(), &self.extent, &self.projection)
    }

    fn draw_cities(&self, doc: &mut MapDocument) {
        let cities = self
            .cities
            .place(&self.extent, &self.projection, &self.config.cities);
        drawing::draw_cities(doc, self.context(), &cities);
    }

    pub fn build_intensity_document(&self) -> MapResult<MapDocument> {
        let ctx = self.context();
        let (nx, ny) = (self.extent.nx, self.extent.ny);
        let mmi = self.projected_measure(&Imt::Mmi)?;
        let image = ReliefCompositor::new(&self.palettes).drape(
            DrapeMode::Intensity(&mmi),
            &self.topography,
            nx,
            ny,
        )?;

        let mut doc = self.new_document();
        doc.raster(DrawPass::Image, &image)?;
        drawing::draw_boundaries(&mut doc, ctx, &self.layers);
        drawing::draw_roads(&mut doc, ctx, &self.layers);
        drawing::draw_lakes(&mut doc, ctx, &self.layers);
        drawing::draw_oceans(&mut doc, ctx, &self.layers);
        drawing::draw_coastlines(&mut doc, ctx, &self.layers);
        drawing::draw_graticule(&mut doc, ctx);
        drawing::draw_scale_bar(&mut doc, ctx);
        drawing::draw_fault(&mut doc, ctx, &self.inputs.rupture);
        drawing::draw_epicenter(&mut doc, ctx, &self.inputs.info.origin);
        self.draw_cities(&mut doc);
        doc.title(&self.inputs.info.title(&Imt::Mmi), TITLE_FONT_SIZE);
        // Instruments are picked by their PGA amplitude and drawn open.
        let stations = self.inputs.stations.observations(&Imt::Pga);
        drawing::draw_stations(&mut doc, ctx, &stations, None);
        Ok(doc)
    }

    pub fn build_contour_document(&self, imt: &Imt) -> MapResult<MapDocument> {
        let ctx = self.context();
        let (nx, ny) = (self.extent.nx, self.extent.ny);
        let data = to_display_units(&self.projected_measure(imt)?, imt);
        let engine = ContourEngine::builder()
            .palette(self.palettes.intensity.clone())
            .build()?;
        let contours = engine.build_contours(&data, nx, ny, imt)?;
        let image = ReliefCompositor::new(&self.palettes).drape(
            DrapeMode::ContourBackground,
            &self.topography,
            nx,
            ny,
        )?;

        let mut doc = self.new_document();
        doc.raster(DrawPass::Image, &image)?;
        drawing::draw_boundaries(&mut doc, ctx, &self.layers);
        drawing::draw_roads(&mut doc, ctx, &self.layers);
        drawing::draw_lakes(&mut doc, ctx, &self.layers);
        drawing::draw_oceans(&mut doc, ctx, &self.layers);
        drawing::draw_coastlines(&mut doc, ctx, &self.layers);
        drawing::draw_graticule(&mut doc, ctx);
        drawing::draw_contours(&mut doc, ctx, &contours);
        drawing::draw_scale_bar(&mut doc, ctx);
        drawing::draw_fault(&mut doc, ctx, &self.inputs.rupture);
        drawing::draw_epicenter(&mut doc, ctx, &self.inputs.info.origin);
        self.draw_cities(&mut doc);
        doc.title(&self.inputs.info.title(imt), TITLE_FONT_SIZE);
        // Stations are colored by their own value of the measure.
        let stations = self.inputs.stations.observations(imt);
        drawing::draw_stations(&mut doc, ctx, &stations, Some(&self.palettes.intensity));
        Ok(doc)
    }

    /// Write `intensity.pdf`, `intensity.jpg` and the PNG thumbnail.
    pub fn draw_intensity_map(&self) -> MapResult<Vec<PathBuf>> {
        let start = Instant::now();
        let output = MapOutput::from_document(&self.build_intensity_document()?)?;

        let pdf = self.output_dir.join(INTENSITY_PDF);
        let jpeg = self.output_dir.join(INTENSITY_JPEG);
        output.save_pdf(&pdf)?;
        output.save_jpeg(&jpeg, self.config.figure.dpi)?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered intensity map"
        );

        let thumbnail = self.output_dir.join(THUMBNAIL_FILE);
        output.save_thumbnail(&thumbnail, self.config.thumbnail_width_px)?;
        Ok(vec![pdf, jpeg, thumbnail])
    }

    /// Write the contour PDF of a measure and its legacy-named JPEG copy.
    pub fn draw_contour_map(&self, imt: &Imt) -> MapResult<Vec<PathBuf>> {
        let start = Instant::now();
        let output = MapOutput::from_document(&self.build_contour_document(imt)?)?;

        let pdf = self.output_dir.join(contour_pdf_name(imt));
        let jpeg = self.output_dir.join(contour_jpeg_name(imt));
        output.save_pdf(&pdf)?;
        output.save_jpeg(&jpeg, self.config.figure.dpi)?;
        debug!(
            imt = %imt,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered contour map"
        );
        Ok(vec![pdf, jpeg])
    }

    /// Every product of the session, intensity map first.
    pub fn render_all(&self) -> MapResult<Vec<PathBuf>> {
        let start = Instant::now();
        let mut written = self.draw_intensity_map()?;
        for imt in &self.config.imts {
            written.extend(self.draw_contour_map(imt)?);
        }
        info!(
            files = written.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered all maps"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(contour_pdf_name(&Imt::Sa(1.0)), "PSA1p0_contour.pdf");
        assert_eq!(contour_pdf_name(&Imt::Mmi), "MMI_contour.pdf");
        assert_eq!(contour_jpeg_name(&Imt::Sa(1.0)), "psa10.jpg");
        assert_eq!(contour_jpeg_name(&Imt::Pga), "pga.jpg");
    }
}
