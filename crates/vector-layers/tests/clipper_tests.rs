//! Integration tests for clipping layer files to a map extent.

use std::fs;

use shake_common::GeoExtent;
use test_utils::{assert_approx_eq, extent, layers, write_polylines, EventFixture};
use vector_layers::{
    open_source, ClipOutcome, DirectorySource, GeoJsonSource, LayerSource, MapGeometry,
    ShapefileSource, VectorClipper,
};

fn socal() -> GeoExtent {
    let (xmin, xmax, ymin, ymax) = extent::SOCAL;
    GeoExtent::new(xmin, xmax, ymin, ymax, 41, 31)
}

fn fiji() -> GeoExtent {
    let (xmin, xmax, ymin, ymax) = extent::FIJI;
    GeoExtent::new(xmin, xmax, ymin, ymax, 41, 41)
}

// ============================================================================
// Per-shape failure recovery
// ============================================================================

#[test]
fn test_bowtie_lake_skipped_valid_lake_kept() {
    let fixture = EventFixture::socal().unwrap();
    let source = GeoJsonSource::new("lake", fixture.layer_path("lake"));
    let layer = VectorClipper::new(socal()).clip_layer(&source).unwrap();

    assert_eq!(layer.skipped, 1);
    assert_eq!(layer.geometries.len(), 1);
    // The valid lake is 0.4 x 0.3 degrees and lies fully inside.
    assert_approx_eq!(layer.geometries[0].area(), 0.12, 1e-9);
}

// ============================================================================
// Extent filtering and clipping
// ============================================================================

#[test]
fn test_far_away_features_are_not_returned() {
    let fixture = EventFixture::socal().unwrap();
    let source = open_source("country", &fixture.layer_path("country")).unwrap();
    let shapes = source.query(&socal()).unwrap();
    assert_eq!(shapes.len(), 1);
}

#[test]
fn test_ocean_clipped_inside_extent() {
    let fixture = EventFixture::socal().unwrap();
    let source = open_source("ocean", &fixture.layer_path("ocean")).unwrap();
    let layer = VectorClipper::new(socal()).clip_layer(source.as_ref()).unwrap();

    assert_eq!(layer.geometries.len(), 1);
    let rect = layer.geometries[0].bounds().unwrap();
    assert!(rect.min().x >= -120.0 - 1e-9);
    assert!(rect.max().x <= -116.0 + 1e-9);
    assert!(rect.min().y >= 33.0 - 1e-9);
}

#[test]
fn test_clipping_is_idempotent() {
    let fixture = EventFixture::socal().unwrap();
    let clipper = VectorClipper::new(socal());

    for name in ["ocean", "coast", "state", "country"] {
        let source = open_source(name, &fixture.layer_path(name)).unwrap();
        let once = clipper.clip_layer(source.as_ref()).unwrap();
        for geometry in &once.geometries {
            let twice = match clipper.clip_geometry(geometry) {
                ClipOutcome::Clipped(g) => g,
                ClipOutcome::Skipped(reason) => panic!("{} re-clip skipped: {}", name, reason),
            };
            assert_approx_eq!(twice.area(), geometry.area(), 1e-9);
            assert_approx_eq!(twice.length(), geometry.length(), 1e-9);
        }
    }
}

#[test]
fn test_clip_all_keeps_every_layer() {
    let fixture = EventFixture::socal().unwrap();
    let sources: Vec<Box<dyn LayerSource>> = ["coast", "ocean", "lake", "country", "state"]
        .iter()
        .map(|name| open_source(name, &fixture.layer_path(name)).unwrap())
        .collect();
    let clipped = VectorClipper::new(socal()).clip_all(&sources).unwrap();

    assert_eq!(clipped.names().count(), 5);
    assert!(!clipped.geometries("state").is_empty());
    assert!(clipped.geometries("roads").is_empty());
}

// ============================================================================
// Directory trees
// ============================================================================

#[test]
fn test_roads_directory_walk() {
    let dir = tempfile::tempdir().unwrap();
    let region = dir.path().join("north_america");
    fs::create_dir_all(&region).unwrap();
    fs::write(region.join("roads.geojson"), layers::roads()).unwrap();
    fs::write(region.join("README.txt"), "not vector data").unwrap();

    let source = DirectorySource::new("roads", dir.path());
    let layer = VectorClipper::new(socal()).clip_layer(&source).unwrap();
    assert_eq!(layer.geometries.len(), 1);
    assert!(matches!(
        layer.geometries[0],
        MapGeometry::MultiLineString(_) | MapGeometry::LineString(_)
    ));
    assert_eq!(layer.skipped, 0);
}

// ============================================================================
// Shapefiles
// ============================================================================

#[test]
fn test_shapefile_source_reads_overlapping_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roads.shp");
    write_polylines(
        &path,
        &[
            vec![(-119.0, 34.0), (-117.0, 35.0)],
            vec![(-118.5, 33.5), (-118.5, 35.5)],
            vec![(10.0, 45.0), (12.0, 46.0)],
        ],
    )
    .unwrap();

    let source = ShapefileSource::new("roads", &path);
    let (min_x, min_y, max_x, max_y) = source.declared_bounds().unwrap();
    assert_approx_eq!(min_x, -119.0, 1e-9);
    assert_approx_eq!(min_y, 33.5, 1e-9);
    assert_approx_eq!(max_x, 12.0, 1e-9);
    assert_approx_eq!(max_y, 46.0, 1e-9);

    let shapes = source.query(&socal()).unwrap();
    assert_eq!(shapes.len(), 2);
    assert!(shapes.iter().all(|s| matches!(
        s,
        Ok(MapGeometry::LineString(_)) | Ok(MapGeometry::MultiLineString(_))
    )));

    let layer = VectorClipper::new(socal()).clip_layer(&source).unwrap();
    assert_eq!(layer.geometries.len(), 2);
    assert_approx_eq!(layer.geometries[1].length(), 2.0, 1e-9);
}

#[test]
fn test_directory_skips_shapefile_outside_header_extent() {
    let dir = tempfile::tempdir().unwrap();
    let north_america = dir.path().join("north_america");
    let europe = dir.path().join("europe");
    fs::create_dir_all(&north_america).unwrap();
    fs::create_dir_all(&europe).unwrap();

    write_polylines(&north_america.join("roads.shp"), &[vec![(-119.0, 34.0), (-117.0, 35.0)]]).unwrap();
    let european_roads = europe.join("roads.shp");
    write_polylines(
        &european_roads,
        &[vec![(10.0, 45.0), (12.0, 46.0)], vec![(2.0, 48.0), (3.0, 49.0)]],
    )
    .unwrap();

    // Scramble every record but keep the 100-byte header: reading the shapes
    // now fails, reading the header does not.
    let mut bytes = fs::read(&european_roads).unwrap();
    for b in bytes.iter_mut().skip(100) {
        *b = 0xFF;
    }
    fs::write(&european_roads, bytes).unwrap();
    assert!(ShapefileSource::new("roads", &european_roads).query(&socal()).is_err());

    let source = DirectorySource::new("roads", dir.path());
    let layer = VectorClipper::new(socal()).clip_layer(&source).unwrap();
    assert_eq!(layer.geometries.len(), 1);
    assert_approx_eq!(layer.geometries[0].length(), 5f64.sqrt(), 1e-9);
    assert_eq!(layer.skipped, 0);
}

// ============================================================================
// Antimeridian
// ============================================================================

#[test]
fn test_islands_on_both_sides_of_dateline_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("land.geojson");
    fs::write(
        &path,
        r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "properties": {},
            "geometry": {"type": "MultiPolygon", "coordinates": [
              [[[178.5, -19.0], [179.5, -19.0], [179.5, -17.0], [178.5, -17.0], [178.5, -19.0]]],
              [[[-179.5, -19.0], [-178.5, -19.0], [-178.5, -17.0], [-179.5, -17.0], [-179.5, -19.0]]]
            ]}}]}"#,
    )
    .unwrap();

    let layer = VectorClipper::new(fiji())
        .clip_layer(&GeoJsonSource::new("land", &path))
        .unwrap();
    assert_eq!(layer.geometries.len(), 1);
    assert_approx_eq!(layer.geometries[0].area(), 4.0, 1e-9);

    let rect = layer.geometries[0].bounds().unwrap();
    assert!(rect.min().x >= -182.0 - 1e-9);
    assert!(rect.max().x <= -178.0 + 1e-9);
}

#[test]
fn test_shapefile_east_of_dateline_read_for_wrapped_extent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coast.shp");
    write_polylines(&path, &[vec![(177.0, -18.0), (179.5, -18.0)]]).unwrap();

    let layer = VectorClipper::new(fiji())
        .clip_layer(&DirectorySource::new("coast", dir.path()))
        .unwrap();
    assert_eq!(layer.geometries.len(), 1);
    assert_approx_eq!(layer.geometries[0].length(), 1.5, 1e-9);
}
