//! Tests for relief draping, map documents, scale bars and file output.

use projection::MapProjection;
use renderer::relief::dual_hillshade;
use renderer::{
    ColorPalette, DrapeMode, DrawPass, FigureSize, FillStyle, LineStyle, MapDocument, MapOutput,
    MarkerShape, MarkerStyle, PaletteSet, ReliefCompositor, RenderError, Rgb, ScaleBar, TextStyle,
};
use shake_common::GeoExtent;
use tempfile::TempDir;
use test_utils::{create_mmi_bowl, create_topography_grid, extent};

fn socal_extent(nx: usize, ny: usize) -> GeoExtent {
    let (xmin, xmax, ymin, ymax) = extent::SOCAL;
    GeoExtent::new(xmin, xmax, ymin, ymax, nx, ny)
}

// ============================================================================
// Palette tests
// ============================================================================

#[test]
fn test_palette_presets_by_name() {
    let set = PaletteSet::from_names("MMI", "shaketopo").unwrap();
    assert_eq!(set.intensity.name(), "mmi");
    assert_eq!(set.topography.name(), "shaketopo");
    assert!(matches!(
        PaletteSet::from_names("viridis", "shaketopo"),
        Err(RenderError::UnknownPalette(_))
    ));
}

#[test]
fn test_palette_clamps_outside_range() {
    let mmi = ColorPalette::mmi();
    assert_eq!(mmi.color_at(-3.0), mmi.color_at(0.0));
    assert_eq!(mmi.color_at(14.0), Rgb::new(200, 0, 0));
}

// ============================================================================
// Relief tests
// ============================================================================

#[test]
fn test_drape_matches_raster_size() {
    let (w, h) = (30, 20);
    let topo = create_topography_grid(w, h);
    let mmi = create_mmi_bowl(w, h, 8.0, 2.0);
    let palettes = PaletteSet::default();
    let image = ReliefCompositor::new(&palettes)
        .drape(DrapeMode::Intensity(&mmi), &topo, w, h)
        .unwrap();
    assert_eq!((image.width(), image.height()), (30, 20));
}

#[test]
fn test_drape_rejects_mismatched_rasters() {
    let topo = create_topography_grid(10, 10);
    let mmi = create_mmi_bowl(9, 10, 8.0, 2.0);
    let palettes = PaletteSet::default();
    let result = ReliefCompositor::new(&palettes).drape(DrapeMode::Intensity(&mmi), &topo, 10, 10);
    assert!(matches!(result, Err(RenderError::DimensionMismatch { .. })));
}

#[test]
fn test_contour_background_uses_topography() {
    let (w, h) = (16, 16);
    let topo = create_topography_grid(w, h);
    let palettes = PaletteSet::default();
    let image = ReliefCompositor::new(&palettes)
        .drape(DrapeMode::ContourBackground, &topo, w, h)
        .unwrap();
    let mmi = create_mmi_bowl(w, h, 9.0, 8.0);
    let intensity = ReliefCompositor::new(&palettes)
        .drape(DrapeMode::Intensity(&mmi), &topo, w, h)
        .unwrap();
    assert_eq!(image.dimensions(), intensity.dimensions());
    assert_ne!(image.as_raw(), intensity.as_raw());
}

#[test]
fn test_hillshade_in_unit_range() {
    let topo = create_topography_grid(25, 25);
    let shade = dual_hillshade(&topo, 25, 25).unwrap();
    assert!(shade.iter().all(|v| (0.0..=1.0).contains(v)));
}

// ============================================================================
// Scale bar tests
// ============================================================================

#[test]
fn test_scale_bar_for_socal() {
    let ext = socal_extent(50, 40);
    let projection = MapProjection::for_extent(&ext).unwrap();
    let bar = ScaleBar::for_map(&ext, &projection);

    // About 370 km wide, so 30% is closest to 100 or 125 km.
    assert!(bar.length_km == 100 || bar.length_km == 125);
    assert!(bar.map_length > bar.length_km as f64 * 1000.0);
    assert!(bar.center.0 > 0.0 && bar.center.0 < projection.width() / 2.0);
    assert!(bar.center.1 > 0.0 && bar.center.1 < projection.height() / 2.0);
}

// ============================================================================
// Document and output tests
// ============================================================================

fn sample_document() -> MapDocument {
    let ext = socal_extent(40, 30);
    let projection = MapProjection::for_extent(&ext).unwrap();
    let mut doc = MapDocument::new(FigureSize::default(), projection.width(), projection.height());

    let topo = create_topography_grid(40, 30);
    let mmi = create_mmi_bowl(40, 30, 7.5, 2.5);
    let palettes = PaletteSet::default();
    let image = ReliefCompositor::new(&palettes)
        .drape(DrapeMode::Intensity(&mmi), &topo, 40, 30)
        .unwrap();
    doc.raster(DrawPass::Image, &image).unwrap();

    let line = [projection.forward(-119.5, 33.5), projection.forward(-116.5, 35.5)];
    doc.polyline(DrawPass::Boundaries, &line, &LineStyle::solid(Rgb::BLACK, 1.0));
    let lake = vec![
        projection.forward(-117.0, 35.0),
        projection.forward(-116.6, 35.0),
        projection.forward(-116.6, 35.3),
        projection.forward(-117.0, 35.3),
    ];
    doc.polygon(
        DrawPass::Water,
        &[lake],
        &FillStyle {
            fill: Rgb::new(0x7a, 0xa1, 0xda),
            edge: Some(Rgb::BLACK),
            edge_width: 1.0,
        },
    );
    doc.marker(
        DrawPass::Overlay,
        projection.forward(-118.0, 34.5),
        &MarkerStyle {
            shape: MarkerShape::Star,
            size: 22.0,
            fill: None,
            edge: Rgb::BLACK,
            edge_width: 1.2,
        },
    );
    doc.margin_text((100.0, 540.0), "118°W", &TextStyle::new(12.0));
    doc.title("Test Event\nMMI", 10.0);
    doc
}

#[test]
fn test_document_contains_layers() {
    let doc = sample_document();
    assert_eq!(doc.pass_len(DrawPass::Image), 1);
    assert_eq!(doc.pass_len(DrawPass::Water), 1);
    assert_eq!(doc.pass_len(DrawPass::Stations), 0);

    let svg = doc.to_svg();
    assert!(svg.contains("data:image/png;base64,"));
    assert!(svg.contains(r#"clip-path="url(#map-frame)""#));
    assert!(svg.contains("fill-rule=\"evenodd\""));
    assert!(svg.contains("118°W"));
}

#[test]
fn test_degenerate_geometry_skipped() {
    let mut doc = MapDocument::new(FigureSize::default(), 100.0, 100.0);
    doc.polyline(DrawPass::Roads, &[(1.0, 1.0)], &LineStyle::solid(Rgb::BLACK, 1.0));
    doc.polygon(
        DrawPass::Water,
        &[vec![(0.0, 0.0), (1.0, 1.0)]],
        &FillStyle {
            fill: Rgb::WHITE,
            edge: None,
            edge_width: 0.0,
        },
    );
    assert_eq!(doc.pass_len(DrawPass::Roads), 0);
    assert_eq!(doc.pass_len(DrawPass::Water), 0);
}

#[test]
fn test_write_all_formats() {
    let dir = TempDir::new().unwrap();
    let output = MapOutput::from_document(&sample_document()).unwrap();
    assert_eq!(output.page_size(), (576.0, 576.0));

    let pdf = dir.path().join("intensity.pdf");
    let jpg = dir.path().join("intensity.jpg");
    let png = dir.path().join("pin-thumbnail.png");
    output.save_pdf(&pdf).unwrap();
    output.save_jpeg(&jpg, 36.0).unwrap();
    output.save_thumbnail(&png, 100).unwrap();

    let bytes = std::fs::read(&pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let jpeg = image::open(&jpg).unwrap();
    assert_eq!((jpeg.width(), jpeg.height()), (288, 288));

    let thumb = image::open(&png).unwrap();
    assert_eq!(thumb.width(), 100);
}

#[test]
fn test_write_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let output = MapOutput::from_document(&sample_document()).unwrap();
    let result = output.save_pdf(&dir.path().join("missing").join("map.pdf"));
    assert!(matches!(result, Err(RenderError::Io(_))));
}
