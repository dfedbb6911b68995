//! Integration tests for the map projection and grid reprojection.

use projection::{project_grid, project_points, MapProjection};
use shake_common::GeoExtent;
use test_utils::{assert_approx_eq, assert_coords_approx_eq, create_mmi_bowl, extent};

fn extent_from(bounds: (f64, f64, f64, f64), nx: usize, ny: usize) -> GeoExtent {
    let (xmin, xmax, ymin, ymax) = bounds;
    GeoExtent::new(xmin, xmax, ymin, ymax, nx, ny)
}

// ============================================================================
// Projection setup
// ============================================================================

#[test]
fn test_center_is_true_scale() {
    let ext = extent_from(extent::SOCAL, 41, 31);
    let proj = MapProjection::for_extent(&ext).unwrap();
    let (_, clat) = ext.center();
    assert_approx_eq!(proj.map_length(100_000.0, clat), 100_000.0, 1e-6);
}

#[test]
fn test_map_is_wider_than_tall_for_socal() {
    let ext = extent_from(extent::SOCAL, 41, 31);
    let proj = MapProjection::for_extent(&ext).unwrap();
    assert!(proj.width() > proj.height());
    // Roughly 4 degrees of longitude at 34.5N.
    assert!(proj.width() > 350_000.0 && proj.width() < 390_000.0);
}

#[test]
fn test_forward_inverse_round_trip() {
    let ext = extent_from(extent::SOCAL, 41, 31);
    let proj = MapProjection::for_extent(&ext).unwrap();
    for &(lon, lat) in &[(-120.0, 33.0), (-118.0, 34.5), (-116.0, 36.0), (-117.3, 35.2)] {
        let (x, y) = proj.forward(lon, lat);
        assert_coords_approx_eq!(proj.inverse(x, y), (lon, lat), 1e-9);
    }
}

#[test]
fn test_project_points_matches_forward() {
    let ext = extent_from(extent::SOCAL, 41, 31);
    let proj = MapProjection::for_extent(&ext).unwrap();
    let lons = [-119.5, -118.0, -116.5];
    let lats = [33.5, 34.5, 35.5];
    let (xs, ys) = project_points(&lons, &lats, &proj);
    assert_eq!(xs.len(), 3);
    for i in 0..3 {
        assert_coords_approx_eq!((xs[i], ys[i]), proj.forward(lons[i], lats[i]), 1e-9);
    }
}

// ============================================================================
// Antimeridian handling
// ============================================================================

#[test]
fn test_antimeridian_grid_projection() {
    let ext = extent_from(extent::FIJI, 21, 21);
    let proj = MapProjection::for_extent(&ext).unwrap();
    let data = create_mmi_bowl(21, 21, 8.0, 2.0);
    let out = project_grid(&data, &ext, &proj).unwrap();

    assert_eq!(out.len(), data.len());
    // Peak stays in the middle column.
    let mid_row = 10;
    let row = &out[mid_row * 21..(mid_row + 1) * 21];
    let peak_col = row
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak_col, 10);
}

#[test]
fn test_points_on_both_sides_of_dateline() {
    let ext = extent_from(extent::FIJI, 21, 21);
    let proj = MapProjection::for_extent(&ext).unwrap();
    let (x, _) = project_points(&[179.0, -179.0], &[-18.0, -18.0], &proj);
    assert!(x[0] < x[1]);
    assert!(x[0] > 0.0 && x[1] < proj.width());
}

#[test]
fn test_round_trip_east_of_dateline_unwraps_west() {
    let ext = extent_from(extent::FIJI, 21, 21);
    let proj = MapProjection::for_extent(&ext).unwrap();
    let (x, y) = proj.forward(179.5, -18.0);
    // Inverse longitudes are continuous across the map, so 179.5E comes back
    // as its western equivalent.
    assert_coords_approx_eq!(proj.inverse(x, y), (-180.5, -18.0), 1e-9);

    let (xs, ys) = project_points(&[179.5, -180.5], &[-18.0, -18.0], &proj);
    assert_coords_approx_eq!((xs[0], ys[0]), (xs[1], ys[1]), 1e-6);
}
