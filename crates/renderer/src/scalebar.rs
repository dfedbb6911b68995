//! Map scale bar sizing and placement.

use projection::MapProjection;
use shake_common::GeoExtent;

/// Candidate bar lengths in kilometers.
pub const SCALE_LENGTHS_KM: [u32; 9] = [25, 50, 75, 100, 125, 150, 175, 200, 250];

/// Preferred bar length as a fraction of the map width.
pub const TARGET_WIDTH_FRACTION: f64 = 0.30;

/// Pick the candidate length closest to 30% of the map width.
///
/// Ties go to the shorter candidate.
pub fn pick_length(map_width_m: f64) -> u32 {
    let width_km = map_width_m / 1000.0;
    let mut best = SCALE_LENGTHS_KM[0];
    let mut best_err = f64::INFINITY;
    for &length in &SCALE_LENGTHS_KM {
        let err = (length as f64 / width_km - TARGET_WIDTH_FRACTION).abs();
        if err < best_err {
            best = length;
            best_err = err;
        }
    }
    best
}

/// A sized and anchored scale bar in map meters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub length_km: u32,
    /// Center of the bar.
    pub center: (f64, f64),
    /// Bar length on the map.
    pub map_length: f64,
    /// Bar thickness, and the gap to its labels.
    pub thickness: f64,
}

impl ScaleBar {
    /// Size the bar for the map and anchor it one fifth of the extent width
    /// east of the west edge and one tenth of its height above the south edge.
    pub fn for_map(extent: &GeoExtent, projection: &MapProjection) -> Self {
        let west = extent.west();
        let lon = west + (extent.xmax - west) / 5.0;
        let lat = extent.ymin + (extent.ymax - extent.ymin) / 10.0;
        let (_, center_lat) = extent.center();

        let length_km = pick_length(projection.width());
        let map_length = projection.map_length(length_km as f64 * 1000.0, center_lat);

        Self {
            length_km,
            center: projection.forward(lon, lat),
            map_length,
            thickness: 0.01 * projection.height(),
        }
    }

    /// Corners of the two bar halves as `(x, y, width, height)`, west half
    /// first.
    pub fn halves(&self) -> [(f64, f64, f64, f64); 2] {
        let (cx, cy) = self.center;
        let half = self.map_length / 2.0;
        [
            (cx - half, cy, half, self.thickness),
            (cx, cy, half, self.thickness),
        ]
    }

    /// Tick labels with their map positions: start, middle and end.
    pub fn labels(&self) -> [((f64, f64), String); 3] {
        let (cx, cy) = self.center;
        let half = self.map_length / 2.0;
        let y = cy - self.thickness;
        let mid = self.length_km as f64 / 2.0;
        let mid_label = if mid.fract() == 0.0 {
            format!("{}", mid as u32)
        } else {
            format!("{:.1}", mid)
        };
        [
            ((cx - half, y), "0".to_string()),
            ((cx, y), mid_label),
            ((cx + half, y), format!("{} km", self.length_km)),
        ]
    }
}
