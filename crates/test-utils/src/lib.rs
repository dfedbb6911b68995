//! Test support for the mapping crates.
//!
//! - [`generators`]: synthetic ground-motion and topography grids
//! - [`fixtures`]: extents, event documents, vector layers and
//!   [`EventFixture`], a processed event laid out in a temporary folder
//! - [`shapefiles`]: `.shp` layers written on the fly
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, extent, EventFixture};
//! ```

pub mod fixtures;
pub mod generators;
pub mod shapefiles;

pub use fixtures::*;
pub use generators::*;
pub use shapefiles::write_polylines;

/// Assert two numbers agree within `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(proj.map_length(100_000.0, lat), 100_000.0, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert two `(x, y)` or `(lon, lat)` pairs agree within `epsilon` on both
/// axes. Either side may be any expression yielding an `(f64, f64)` tuple,
/// such as a projection call.
///
/// ```ignore
/// assert_coords_approx_eq!(proj.inverse(x, y), (179.5, -18.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (lx, ly): (f64, f64) = $left;
        let (rx, ry): (f64, f64) = $right;
        let epsilon: f64 = $epsilon as f64;
        if (lx - rx).abs() > epsilon || (ly - ry).abs() > epsilon {
            panic!(
                "assertion failed: coordinates differ\n  left: `({:?}, {:?})`,\n right: `({:?}, {:?})`,\n  epsilon `{:?}`",
                lx, ly, rx, ry, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "coordinates differ")]
    fn test_coords_differ_on_one_axis() {
        assert_coords_approx_eq!((-118.0, 34.0), (-118.0, 34.1), 1e-6);
    }

    #[test]
    fn test_write_polylines_header_bbox() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faults.shp");
        crate::write_polylines(&path, &[vec![(-119.0, 34.0), (-117.5, 35.0)]]).unwrap();
        assert!(path.with_extension("shx").is_file());

        let reader = shapefile::ShapeReader::from_path(&path).unwrap();
        let bbox = &reader.header().bbox;
        assert_coords_approx_eq!((bbox.min.x, bbox.min.y), (-119.0, 34.0), 1e-12);
        assert_coords_approx_eq!((bbox.max.x, bbox.max.y), (-117.5, 35.0), 1e-12);
    }
}
