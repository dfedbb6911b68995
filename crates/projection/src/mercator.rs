//! Ellipsoidal Mercator projection.
//!
//! The projection is true to scale along a chosen parallel (`lat_ts`) and
//! centered on a chosen meridian (`lon_0`). Map coordinates are in meters,
//! shifted so that the lower-left corner of the map lands on (0, 0).
//!
//! Forward:
//! - `x = k0 * a * (lon - lon_0)`
//! - `y = k0 * a * ln(tan(π/4 + φ/2) * ((1 - e·sinφ) / (1 + e·sinφ))^(e/2))`
//!
//! with `k0 = cos(lat_ts) / sqrt(1 - e²·sin²(lat_ts))`.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use shake_common::{GeoExtent, MapError, MapResult};

/// WGS84-like semi-major axis in meters.
pub const SEMI_MAJOR: f64 = 6378137.0;
/// Semi-minor axis in meters.
pub const SEMI_MINOR: f64 = 6356752.3142;

/// Latitudes closer to the poles than this cannot be projected.
const MAX_LATITUDE: f64 = 89.5;

const INVERSE_TOLERANCE: f64 = 1e-12;
const INVERSE_MAX_ITER: usize = 20;

/// Mercator projection on an ellipsoid.
#[derive(Debug, Clone)]
pub struct Mercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of true scale in radians
    pub lat_ts: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    e: f64,
    /// Scale factor at the equator
    k0: f64,
}

impl Mercator {
    /// Create a projection from degrees, on the default ellipsoid.
    pub fn new(lon0_deg: f64, lat_ts_deg: f64) -> MapResult<Self> {
        Self::with_ellipsoid(lon0_deg, lat_ts_deg, SEMI_MAJOR, SEMI_MINOR)
    }

    /// Create a projection on an arbitrary ellipsoid.
    pub fn with_ellipsoid(lon0_deg: f64, lat_ts_deg: f64, a: f64, b: f64) -> MapResult<Self> {
        if lat_ts_deg.abs() >= MAX_LATITUDE {
            return Err(MapError::Projection(format!(
                "latitude of true scale {} is too close to a pole",
                lat_ts_deg
            )));
        }
        let e = (1.0 - (b * b) / (a * a)).sqrt();
        let lat_ts = lat_ts_deg.to_radians();
        let sin_ts = lat_ts.sin();
        let k0 = lat_ts.cos() / (1.0 - e * e * sin_ts * sin_ts).sqrt();

        Ok(Self {
            lon0: lon0_deg.to_radians(),
            lat_ts,
            a,
            e,
            k0,
        })
    }

    /// Project lon/lat in degrees to unshifted meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let lon = lon_deg.to_radians();

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let esin = self.e * lat.sin();
        let ts = (FRAC_PI_4 + lat / 2.0).tan() * ((1.0 - esin) / (1.0 + esin)).powf(self.e / 2.0);

        let x = self.k0 * self.a * dlon;
        let y = self.k0 * self.a * ts.ln();
        (x, y)
    }

    /// Invert unshifted meters back to lon/lat in degrees.
    ///
    /// Longitudes are returned relative to the central meridian, so they may
    /// fall outside [-180, 180] for maps that straddle the antimeridian.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.lon0 + x / (self.k0 * self.a);
        let t = (-y / (self.k0 * self.a)).exp();

        let mut lat = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..INVERSE_MAX_ITER {
            let esin = self.e * lat.sin();
            let next =
                FRAC_PI_2 - 2.0 * (t * ((1.0 - esin) / (1.0 + esin)).powf(self.e / 2.0)).atan();
            let done = (next - lat).abs() < INVERSE_TOLERANCE;
            lat = next;
            if done {
                break;
            }
        }

        (lon.to_degrees(), lat.to_degrees())
    }

    /// Point scale factor at a latitude (map meters per ground meter).
    pub fn scale_factor(&self, lat_deg: f64) -> f64 {
        let lat = lat_deg.to_radians();
        let sin = lat.sin();
        self.k0 * (1.0 - self.e * self.e * sin * sin).sqrt() / lat.cos()
    }
}

/// Mercator projection fitted to a map extent.
///
/// Centered on the extent, with the lower-left corner at the origin and
/// the upper-right corner at `(width, height)`.
#[derive(Debug, Clone)]
pub struct MapProjection {
    mercator: Mercator,
    x_offset: f64,
    y_offset: f64,
    width: f64,
    height: f64,
}

impl MapProjection {
    /// Set up the projection for an extent.
    ///
    /// The central meridian uses the antimeridian-corrected western edge, so a
    /// map spanning 178°E to 178°W is centered on 180°.
    pub fn for_extent(extent: &GeoExtent) -> MapResult<Self> {
        if extent.ymax <= extent.ymin {
            return Err(MapError::Projection(format!(
                "extent has no latitude span ({} to {})",
                extent.ymin, extent.ymax
            )));
        }
        if extent.ymax.abs() >= MAX_LATITUDE || extent.ymin.abs() >= MAX_LATITUDE {
            return Err(MapError::Projection(
                "extent reaches too close to a pole for Mercator".to_string(),
            ));
        }
        let (clon, clat) = extent.center();
        let mercator = Mercator::new(clon, clat)?;

        let (x_ll, y_ll) = mercator.forward(extent.west(), extent.ymin);
        let (x_ur, y_ur) = mercator.forward(extent.xmax, extent.ymax);

        tracing::debug!(
            lon_0 = clon,
            lat_ts = clat,
            width_m = x_ur - x_ll,
            height_m = y_ur - y_ll,
            "Mercator projection set up"
        );

        Ok(Self {
            mercator,
            x_offset: x_ll,
            y_offset: y_ll,
            width: x_ur - x_ll,
            height: y_ur - y_ll,
        })
    }

    pub fn mercator(&self) -> &Mercator {
        &self.mercator
    }

    /// Map width in meters.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Map height in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Project lon/lat in degrees to map meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.mercator.forward(lon, lat);
        (x - self.x_offset, y - self.y_offset)
    }

    /// Invert map meters to lon/lat in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        self.mercator.inverse(x + self.x_offset, y + self.y_offset)
    }

    /// Length on the map of a ground distance measured at a latitude.
    pub fn map_length(&self, meters: f64, lat: f64) -> f64 {
        meters * self.mercator.scale_factor(lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_inverse_roundtrip() {
        let merc = Mercator::new(-118.0, 34.5).unwrap();
        for &(lon, lat) in &[(-118.0, 34.5), (-120.0, 33.0), (-116.0, 36.0), (-117.3, 0.0)] {
            let (x, y) = merc.forward(lon, lat);
            let (lon2, lat2) = merc.inverse(x, y);
            assert!((lon - lon2).abs() < 1e-9, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_true_scale_at_lat_ts() {
        let merc = Mercator::new(0.0, 40.0).unwrap();
        assert!((merc.scale_factor(40.0) - 1.0).abs() < 1e-12);
        assert!(merc.scale_factor(50.0) > 1.0);
    }

    #[test]
    fn test_equator_degree_length() {
        // One degree of longitude at the equator is ~111.32 km on WGS84.
        let merc = Mercator::new(0.0, 0.0).unwrap();
        let (x, _) = merc.forward(1.0, 0.0);
        assert!((x - 111_319.49).abs() < 1.0, "got {}", x);
    }

    #[test]
    fn test_map_corners() {
        let ext = GeoExtent::new(-120.0, -116.0, 33.0, 36.0, 41, 31);
        let proj = MapProjection::for_extent(&ext).unwrap();
        let (x0, y0) = proj.forward(-120.0, 33.0);
        assert!(x0.abs() < 1e-6 && y0.abs() < 1e-6);
        let (x1, y1) = proj.forward(-116.0, 36.0);
        assert!((x1 - proj.width()).abs() < 1e-6);
        assert!((y1 - proj.height()).abs() < 1e-6);
    }

    #[test]
    fn test_antimeridian_extent_is_contiguous() {
        let ext = GeoExtent::new(178.0, -178.0, -20.0, -16.0, 41, 41);
        let proj = MapProjection::for_extent(&ext).unwrap();
        let (x_east, _) = proj.forward(-178.0, -18.0);
        let (x_dateline, _) = proj.forward(180.0, -18.0);
        let (x_west, _) = proj.forward(178.0, -18.0);
        assert!(x_west.abs() < 1e-6);
        assert!(x_west < x_dateline && x_dateline < x_east);
        assert!(proj.width() > 0.0);
    }

    #[test]
    fn test_polar_extent_rejected() {
        let ext = GeoExtent::new(0.0, 10.0, 80.0, 90.0, 10, 10);
        assert!(matches!(MapProjection::for_extent(&ext), Err(MapError::Projection(_))));
    }
}
