//! Map extent shared by every product of a rendering session.

use serde::{Deserialize, Serialize};

/// Geographic bounding rectangle plus the raster dimensions drawn inside it.
///
/// `xmax < xmin` means the extent crosses the antimeridian. Consumers that
/// need a monotonically increasing longitude axis use [`GeoExtent::west`],
/// which shifts `xmin` by -360 in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub nx: usize,
    pub ny: usize,
}

impl GeoExtent {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, nx: usize, ny: usize) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            nx,
            ny,
        }
    }

    /// True when the extent wraps across the 180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.xmax < self.xmin
    }

    /// Western edge, unwrapped so that `west() < xmax` always holds.
    pub fn west(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.xmin - 360.0
        } else {
            self.xmin
        }
    }

    /// Width in degrees of longitude.
    pub fn width_degrees(&self) -> f64 {
        self.xmax - self.west()
    }

    /// Height in degrees of latitude.
    pub fn height_degrees(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Center longitude and latitude.
    pub fn center(&self) -> (f64, f64) {
        let lon = (self.west() + self.xmax) / 2.0;
        let lat = (self.ymin + self.ymax) / 2.0;
        (lon, lat)
    }

    /// Longitude of every raster column, west to east.
    pub fn lon_axis(&self) -> Vec<f64> {
        linspace(self.west(), self.xmax, self.nx)
    }

    /// Latitude of every raster row, north to south.
    pub fn lat_axis(&self) -> Vec<f64> {
        linspace(self.ymax, self.ymin, self.ny)
    }

    /// Closed clockwise ring outlining the extent, starting at the north-west corner.
    pub fn ring(&self) -> [(f64, f64); 5] {
        let west = self.west();
        [
            (west, self.ymax),
            (self.xmax, self.ymax),
            (self.xmax, self.ymin),
            (west, self.ymin),
            (west, self.ymax),
        ]
    }

    /// Check whether an axis-aligned box overlaps this extent.
    pub fn intersects_box(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        let west = self.west();
        min_x <= self.xmax && max_x >= west && min_y <= self.ymax && max_y >= self.ymin
    }
}

/// Evenly spaced samples over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
