//! Test data generators for synthetic ground-motion and terrain grids.
//!
//! All grids are row-major with row 0 at the northern edge, matching the
//! layout of the grid documents read by the mapping pipeline.

use serde_json::json;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates an MMI-like field decaying away from the grid center.
///
/// The center cell holds `peak`, the corners fall towards `floor`.
pub fn create_mmi_bowl(width: usize, height: usize, peak: f64, floor: f64) -> Vec<f64> {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            let frac = (dx * dx + dy * dy).sqrt() / max_dist;
            data.push(peak - (peak - floor) * frac);
        }
    }
    data
}

/// Creates a natural-log ground-motion field whose converted values
/// (`100 * exp(v)`) span roughly `min_pct..max_pct` %g.
pub fn create_ln_motion_grid(width: usize, height: usize, min_pct: f64, max_pct: f64) -> Vec<f64> {
    create_mmi_bowl(width, height, 1.0, 0.0)
        .into_iter()
        .map(|f| (min_pct + (max_pct - min_pct) * f) / 100.0)
        .map(f64::ln)
        .collect()
}

/// Creates rolling terrain in meters with sea level along the southern rows.
pub fn create_topography_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let north = 1.0 - row as f64 / height.max(1) as f64;
        for col in 0..width {
            let ripple = (col as f64 * 0.4).sin() * (row as f64 * 0.3).cos();
            data.push(2000.0 * north - 300.0 + 250.0 * ripple);
        }
    }
    data
}

/// Creates a grid where all values are the same.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Serializes a grid into the `{geodict, data}` document layout.
pub fn grid_document(
    bounds: (f64, f64, f64, f64),
    resolution: f64,
    width: usize,
    height: usize,
    data: &[f64],
) -> String {
    let (xmin, xmax, ymin, ymax) = bounds;
    let rows: Vec<&[f64]> = data.chunks(width).collect();
    json!({
        "geodict": {
            "xmin": xmin, "xmax": xmax, "ymin": ymin, "ymax": ymax,
            "dx": resolution, "dy": resolution,
            "nx": width, "ny": height,
        },
        "data": rows,
    })
    .to_string()
}
