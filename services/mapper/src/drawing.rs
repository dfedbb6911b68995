//! Drawing routines that put projected layers and overlays on a map page.
//!
//! Vector layers are drawn through [`GeometryVisitor`] implementations, one
//! per drawing style. Everything else (graticule, scale bar, rupture,
//! stations, contours) is a plain function over the document.

use std::time::Instant;

use geo::{LineString, Polygon};
use projection::MapProjection;
use renderer::contour::{collect_label_positions, LabelLayout, CONTOUR_LINE_WIDTH};
use renderer::{
    ColorPalette, ContourSet, DrawPass, FillStyle, LevelKind, LineStyle, MapDocument, MarkerShape,
    MarkerStyle, Rgb, ScaleBar, TextAnchor, TextStyle, VerticalAlign,
};
use shake_common::{GeoExtent, Origin, Rupture, StationKind, StationObservation};
use tracing::debug;
use vector_layers::{ClippedLayers, GeometryVisitor, MapGeometry};

use crate::cities::CityLabel;

pub const WATER_COLOR: Rgb = Rgb::new(0x7a, 0xa1, 0xda);
pub const ROAD_COLOR: Rgb = Rgb::new(0x80, 0x80, 0x80);
pub const GRATICULE_COLOR: Rgb = Rgb::new(0x80, 0x80, 0x80);

/// Default stroke width of boundary, coast and road lines.
pub const LINE_WIDTH: f64 = 1.5;

const GRATICULE_WIDTH: f64 = 0.5;
const GRATICULE_FONT_SIZE: f64 = 12.0;
const TICK_LENGTH: f64 = 3.5;

/// Extent and projection of the map being drawn.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub extent: &'a GeoExtent,
    pub projection: &'a MapProjection,
}

impl<'a> MapContext<'a> {
    pub fn new(extent: &'a GeoExtent, projection: &'a MapProjection) -> Self {
        Self { extent, projection }
    }

    /// Longitude in the extent's unwrapped frame.
    pub fn unwrap_lon(&self, lon: f64) -> f64 {
        if self.extent.crosses_antimeridian() && lon > self.extent.xmax {
            lon - 360.0
        } else {
            lon
        }
    }

    /// Project lon/lat to map meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.projection.forward(self.unwrap_lon(lon), lat)
    }

    fn project_line(&self, line: &LineString<f64>) -> Vec<(f64, f64)> {
        line.coords().map(|c| self.forward(c.x, c.y)).collect()
    }
}

/// Strokes lines and polygon outlines.
pub struct StrokeDrawer<'d, 'c> {
    doc: &'d mut MapDocument,
    ctx: MapContext<'c>,
    pass: DrawPass,
    style: LineStyle,
}

impl<'d, 'c> StrokeDrawer<'d, 'c> {
    pub fn new(doc: &'d mut MapDocument, ctx: MapContext<'c>, pass: DrawPass, style: LineStyle) -> Self {
        Self {
            doc,
            ctx,
            pass,
            style,
        }
    }
}

impl GeometryVisitor for StrokeDrawer<'_, '_> {
    fn visit_polygon(&mut self, polygon: &Polygon<f64>) {
        let points = self.ctx.project_line(polygon.exterior());
        self.doc.polyline(self.pass, &points, &self.style);
    }

    fn visit_line_string(&mut self, line: &LineString<f64>) {
        let points = self.ctx.project_line(line);
        self.doc.polyline(self.pass, &points, &self.style);
    }
}

/// Fills polygons, holes included. Lines have no area and are skipped.
pub struct FillDrawer<'d, 'c> {
    doc: &'d mut MapDocument,
    ctx: MapContext<'c>,
    pass: DrawPass,
    style: FillStyle,
}

impl<'d, 'c> FillDrawer<'d, 'c> {
    pub fn new(doc: &'d mut MapDocument, ctx: MapContext<'c>, pass: DrawPass, style: FillStyle) -> Self {
        Self {
            doc,
            ctx,
            pass,
            style,
        }
    }
}

impl GeometryVisitor for FillDrawer<'_, '_> {
    fn visit_polygon(&mut self, polygon: &Polygon<f64>) {
        let rings: Vec<Vec<(f64, f64)>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| self.ctx.project_line(ring))
            .collect();
        self.doc.polygon(self.pass, &rings, &self.style);
    }

    fn visit_line_string(&mut self, _line: &LineString<f64>) {}
}

fn draw_all<V: GeometryVisitor>(geometries: &[MapGeometry], visitor: &mut V) {
    for geometry in geometries {
        geometry.accept(visitor);
    }
}

/// Country and state borders.
pub fn draw_boundaries(doc: &mut MapDocument, ctx: MapContext<'_>, layers: &ClippedLayers) {
    let mut drawer = StrokeDrawer::new(
        doc,
        ctx,
        DrawPass::Boundaries,
        LineStyle::solid(Rgb::BLACK, LINE_WIDTH),
    );
    draw_all(layers.geometries("country"), &mut drawer);
    draw_all(layers.geometries("state"), &mut drawer);
}

pub fn draw_roads(doc: &mut MapDocument, ctx: MapContext<'_>, layers: &ClippedLayers) {
    let mut drawer = StrokeDrawer::new(
        doc,
        ctx,
        DrawPass::Roads,
        LineStyle::solid(ROAD_COLOR, LINE_WIDTH),
    );
    draw_all(layers.geometries("roads"), &mut drawer);
}

pub fn draw_lakes(doc: &mut MapDocument, ctx: MapContext<'_>, layers: &ClippedLayers) {
    let style = FillStyle {
        fill: WATER_COLOR,
        edge: Some(Rgb::BLACK),
        edge_width: 1.0,
    };
    let mut drawer = FillDrawer::new(doc, ctx, DrawPass::Water, style);
    draw_all(layers.geometries("lake"), &mut drawer);
}

pub fn draw_oceans(doc: &mut MapDocument, ctx: MapContext<'_>, layers: &ClippedLayers) {
    let start = Instant::now();
    let style = FillStyle {
        fill: WATER_COLOR,
        edge: Some(WATER_COLOR),
        edge_width: 1.0,
    };
    let oceans = layers.geometries("ocean");
    let mut drawer = FillDrawer::new(doc, ctx, DrawPass::Water, style);
    draw_all(oceans, &mut drawer);
    debug!(
        shapes = oceans.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rendered oceans"
    );
}

pub fn draw_coastlines(doc: &mut MapDocument, ctx: MapContext<'_>, layers: &ClippedLayers) {
    let start = Instant::now();
    let coasts = layers.geometries("coast");
    let mut drawer = StrokeDrawer::new(
        doc,
        ctx,
        DrawPass::Boundaries,
        LineStyle::solid(Rgb::BLACK, LINE_WIDTH),
    );
    draw_all(coasts, &mut drawer);
    debug!(
        shapes = coasts.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rendered coastlines"
    );
}

/// Label for a meridian, e.g. `118°W`.
pub fn meridian_label(lon: f64) -> String {
    let lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
    let deg = lon.abs().round() as i64;
    if deg == 0 || deg == 180 {
        format!("{}°", deg)
    } else if lon < 0.0 {
        format!("{}°W", deg)
    } else {
        format!("{}°E", deg)
    }
}

/// Label for a parallel, e.g. `34°N`.
pub fn parallel_label(lat: f64) -> String {
    let deg = lat.abs().round() as i64;
    if deg == 0 {
        "0°".to_string()
    } else if lat < 0.0 {
        format!("{}°S", deg)
    } else {
        format!("{}°N", deg)
    }
}

/// Whole-degree meridians and parallels, labelled below and left of the frame.
pub fn draw_graticule(doc: &mut MapDocument, ctx: MapContext<'_>) {
    let extent = ctx.extent;
    let west = extent.west();
    let line = LineStyle::solid(GRATICULE_COLOR, GRATICULE_WIDTH);
    let tick = LineStyle::solid(Rgb::BLACK, 0.8);
    let frame = *doc.frame();

    for lon in (west.ceil() as i64)..=(extent.xmax.floor() as i64) {
        let lon = lon as f64;
        let bottom = ctx.projection.forward(lon, extent.ymin);
        let top = ctx.projection.forward(lon, extent.ymax);
        doc.polyline(DrawPass::Overlay, &[bottom, top], &line);

        let (x, _) = frame.to_page(bottom.0, bottom.1);
        doc.margin_line((x, frame.bottom()), (x, frame.bottom() + TICK_LENGTH), &tick);
        doc.margin_text(
            (x, frame.bottom() + TICK_LENGTH + 2.0),
            &meridian_label(lon),
            &TextStyle::new(GRATICULE_FONT_SIZE).anchored(TextAnchor::Middle, VerticalAlign::Top),
        );
    }

    for lat in (extent.ymin.ceil() as i64)..=(extent.ymax.floor() as i64) {
        let lat = lat as f64;
        let left = ctx.projection.forward(west, lat);
        let right = ctx.projection.forward(extent.xmax, lat);
        doc.polyline(DrawPass::Overlay, &[left, right], &line);

        let (_, y) = frame.to_page(left.0, left.1);
        doc.margin_line((frame.left, y), (frame.left - TICK_LENGTH, y), &tick);
        doc.margin_text(
            (frame.left - TICK_LENGTH - 2.0, y),
            &parallel_label(lat),
            &TextStyle::new(GRATICULE_FONT_SIZE).anchored(TextAnchor::End, VerticalAlign::Center),
        );
    }
}

/// Two-tone scale bar with its distance labels.
pub fn draw_scale_bar(doc: &mut MapDocument, ctx: MapContext<'_>) -> ScaleBar {
    let bar = ScaleBar::for_map(ctx.extent, ctx.projection);
    let [west, east] = bar.halves();
    for ((x, y, w, h), fill) in [(west, Rgb::WHITE), (east, Rgb::BLACK)] {
        doc.rect(
            DrawPass::ScaleBar,
            x,
            y,
            w,
            h,
            &FillStyle {
                fill,
                edge: Some(Rgb::BLACK),
                edge_width: 0.8,
            },
        );
    }
    let frame = *doc.frame();
    let style = TextStyle::new(9.0).anchored(TextAnchor::Middle, VerticalAlign::Top);
    for ((x, y), text) in bar.labels() {
        let at = frame.to_page(x, y);
        doc.text(DrawPass::ScaleBar, at, &text, &style);
    }
    debug!(length_km = bar.length_km, "Drew scale bar");
    bar
}

/// Rupture outlines as thick black lines. Point ruptures draw nothing.
pub fn draw_fault(doc: &mut MapDocument, ctx: MapContext<'_>, rupture: &Rupture) {
    let style = LineStyle::solid(Rgb::BLACK, 2.0);
    for ring in rupture.outlines() {
        let points: Vec<(f64, f64)> = ring.iter().map(|&(lon, lat)| ctx.forward(lon, lat)).collect();
        doc.polyline(DrawPass::Rupture, &points, &style);
    }
}

pub fn draw_epicenter(doc: &mut MapDocument, ctx: MapContext<'_>, origin: &Origin) {
    doc.marker(
        DrawPass::Rupture,
        ctx.forward(origin.lon, origin.lat),
        &MarkerStyle {
            shape: MarkerShape::Star,
            size: 22.0,
            fill: None,
            edge: Rgb::BLACK,
            edge_width: 1.2,
        },
    );
}

pub fn draw_cities(doc: &mut MapDocument, ctx: MapContext<'_>, cities: &[CityLabel]) {
    let frame = *doc.frame();
    for city in cities {
        let at = ctx.forward(city.lon, city.lat);
        doc.marker(
            DrawPass::Overlay,
            at,
            &MarkerStyle {
                shape: MarkerShape::Circle,
                size: 3.0,
                fill: Some(Rgb::BLACK),
                edge: Rgb::BLACK,
                edge_width: 0.5,
            },
        );
        let (x, y) = frame.to_page(at.0, at.1);
        doc.text(
            DrawPass::Overlay,
            (x + 3.0, y),
            &city.name,
            &TextStyle::new(city.font_size).anchored(TextAnchor::Start, VerticalAlign::Center),
        );
    }
}

/// Station symbols: circles for macroseismic reports, triangles for
/// instruments. With a palette the symbols are filled with the color of the
/// observation's intensity, otherwise they are drawn open.
pub fn draw_stations(
    doc: &mut MapDocument,
    ctx: MapContext<'_>,
    observations: &[StationObservation],
    fill: Option<&ColorPalette>,
) {
    for obs in observations {
        let (shape, size) = match obs.kind {
            StationKind::Macroseismic => (MarkerShape::Circle, 4.0),
            StationKind::Instrumental => (MarkerShape::Triangle, 6.0),
        };
        doc.marker(
            DrawPass::Stations,
            ctx.forward(obs.lon, obs.lat),
            &MarkerStyle {
                shape,
                size,
                fill: fill.map(|palette| palette.color_at(obs.mmi)),
                edge: Rgb::BLACK,
                edge_width: 1.0,
            },
        );
    }
}

/// Contour lines and their labels.
///
/// Stroked levels go down twice: dashed above the water and solid below it,
/// so lines read solid on land and dashed over water. Labels sit in the
/// dashed pass to stay visible over water.
pub fn draw_contours(doc: &mut MapDocument, ctx: MapContext<'_>, set: &ContourSet) {
    let (map_w, map_h) = (ctx.projection.width(), ctx.projection.height());
    let frame = *doc.frame();
    let roman_layout = LabelLayout {
        spacing: frame.width / 2.5,
        font_size: 16.0,
        bounds: frame.bounds(),
    };
    let measure_layout = LabelLayout {
        spacing: frame.width / 3.0,
        font_size: 8.0,
        bounds: frame.bounds(),
    };

    let mut placed = Vec::new();
    for level in &set.levels {
        let dashed = LineStyle::dashed(level.color, CONTOUR_LINE_WIDTH);
        let solid = LineStyle::solid(level.color, CONTOUR_LINE_WIDTH);
        for line in set.lines_at(level) {
            let points: Vec<(f64, f64)> = line
                .points
                .iter()
                .map(|p| set.to_map(*p, map_w, map_h))
                .collect();
            if level.is_stroked() {
                doc.polyline(DrawPass::DashedContours, &points, &dashed);
                doc.polyline(DrawPass::LandContours, &points, &solid);
            }

            let Some(text) = &level.label else { continue };
            let page: Vec<(f64, f64)> = points.iter().map(|&(x, y)| frame.to_page(x, y)).collect();
            let layout = if level.kind == LevelKind::WholeUnit {
                &roman_layout
            } else {
                &measure_layout
            };
            let before = placed.len();
            collect_label_positions(&page, text, layout, &mut placed);
            for pos in &placed[before..] {
                let style = match level.kind {
                    LevelKind::WholeUnit => TextStyle::new(16.0).with_halo(Rgb::WHITE, 2.0),
                    _ => TextStyle::new(8.0)
                        .with_background(Rgb::WHITE)
                        .rotated(pos.angle.to_degrees()),
                };
                doc.text(DrawPass::DashedContours, (pos.x, pos.y), &pos.text, &style);
            }
        }
    }
    debug!(
        imt = %set.imt,
        levels = set.levels.len(),
        labels = placed.len(),
        "Drew contours"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graticule_labels() {
        assert_eq!(meridian_label(-118.0), "118°W");
        assert_eq!(meridian_label(45.0), "45°E");
        assert_eq!(meridian_label(-181.0), "179°E");
        assert_eq!(meridian_label(180.0), "180°");
        assert_eq!(parallel_label(34.0), "34°N");
        assert_eq!(parallel_label(-17.0), "17°S");
        assert_eq!(parallel_label(0.0), "0°");
    }

    #[test]
    fn test_unwrap_lon_across_antimeridian() {
        let extent = GeoExtent::new(178.0, -178.0, -20.0, -16.0, 10, 10);
        let projection = MapProjection::for_extent(&extent).unwrap();
        let ctx = MapContext::new(&extent, &projection);
        assert_eq!(ctx.unwrap_lon(179.0), -181.0);
        assert_eq!(ctx.unwrap_lon(-179.0), -179.0);
    }
}
