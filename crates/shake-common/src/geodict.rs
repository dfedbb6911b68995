//! Georeferenced raster grids.
//!
//! Grids are stored row-major with row 0 at the northern edge. A [`GeoDict`]
//! describes cell centers: `xmin`/`xmax` are the longitudes of the first and
//! last columns, `ymax`/`ymin` the latitudes of the first and last rows.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::extent::GeoExtent;

/// Tolerance used when snapping coordinates onto a grid.
const ALIGN_EPS: f64 = 1e-6;

/// Geographic description of a regular lon/lat grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoDict {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl GeoDict {
    /// Build a dict from bounds and resolution, deriving the dimensions.
    pub fn from_bounds(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        dx: f64,
        dy: f64,
    ) -> MapResult<Self> {
        if dx <= 0.0 || dy <= 0.0 {
            return Err(MapError::InvalidGrid(format!(
                "resolution must be positive (dx={}, dy={})",
                dx, dy
            )));
        }
        let west = if xmax < xmin { xmin - 360.0 } else { xmin };
        let nx = ((xmax - west) / dx + ALIGN_EPS).floor() as usize + 1;
        let ny = ((ymax - ymin) / dy + ALIGN_EPS).floor() as usize + 1;
        let gd = Self {
            xmin,
            xmax,
            ymin,
            ymax,
            dx,
            dy,
            nx,
            ny,
        };
        gd.validate()?;
        Ok(gd)
    }

    /// Check that the bounds, resolution and dimensions agree.
    pub fn validate(&self) -> MapResult<()> {
        if self.nx < 2 || self.ny < 2 {
            return Err(MapError::InvalidGrid(format!(
                "grid must be at least 2x2, got {}x{}",
                self.nx, self.ny
            )));
        }
        if self.ymax <= self.ymin {
            return Err(MapError::InvalidGrid(format!(
                "ymax ({}) must exceed ymin ({})",
                self.ymax, self.ymin
            )));
        }
        let expected_nx = (self.width() / self.dx).round() as usize + 1;
        let expected_ny = ((self.ymax - self.ymin) / self.dy).round() as usize + 1;
        if expected_nx != self.nx || expected_ny != self.ny {
            return Err(MapError::InvalidGrid(format!(
                "dimensions {}x{} do not match bounds and resolution (expected {}x{})",
                self.nx, self.ny, expected_nx, expected_ny
            )));
        }
        Ok(())
    }

    /// Western column longitude, unwrapped across the antimeridian.
    pub fn west(&self) -> f64 {
        if self.xmax < self.xmin {
            self.xmin - 360.0
        } else {
            self.xmin
        }
    }

    /// Longitudinal span in degrees.
    pub fn width(&self) -> f64 {
        self.xmax - self.west()
    }

    pub fn extent(&self) -> GeoExtent {
        GeoExtent::new(self.xmin, self.xmax, self.ymin, self.ymax, self.nx, self.ny)
    }

    /// Longitude of a column, relative to the unwrapped western edge.
    pub fn col_lon(&self, col: usize) -> f64 {
        self.west() + col as f64 * self.dx
    }

    /// Latitude of a row, counted from the northern edge.
    pub fn row_lat(&self, row: usize) -> f64 {
        self.ymax - row as f64 * self.dy
    }

    /// Fractional column of a longitude, in this grid's unwrapped frame.
    fn fractional_col(&self, lon: f64) -> f64 {
        let mut offset = (lon - self.west()).rem_euclid(360.0);
        // Longitudes just west of the grid wrap to ~360; pull them back.
        if offset > self.width() + (360.0 - self.width()) / 2.0 {
            offset -= 360.0;
        }
        offset / self.dx
    }

    fn fractional_row(&self, lat: f64) -> f64 {
        (self.ymax - lat) / self.dy
    }

    /// A dict aligned to this grid's cells that lies inside `other`.
    ///
    /// Used to resample a model grid onto the topography resolution without
    /// sampling topography outside the model area.
    pub fn bounds_within(&self, other: &GeoDict) -> MapResult<GeoDict> {
        let start = self.fractional_col(other.west());
        let end = start + other.width() / self.dx;
        let first_col = (start - ALIGN_EPS).ceil();
        let last_col = (end + ALIGN_EPS).floor();
        let first_row = (self.fractional_row(other.ymax) - ALIGN_EPS).ceil();
        let last_row = (self.fractional_row(other.ymin) + ALIGN_EPS).floor();

        if last_col < first_col + 1.0 || last_row < first_row + 1.0 {
            return Err(MapError::InvalidGrid(format!(
                "no aligned cells of the {}x{} grid fall inside the requested bounds",
                self.nx, self.ny
            )));
        }

        let west = self.west() + first_col * self.dx;
        let east = self.west() + last_col * self.dx;
        let ymax = self.ymax - first_row * self.dy;
        let ymin = self.ymax - last_row * self.dy;

        let xmin = wrap_longitude(west);
        let xmax = wrap_longitude(east);
        Ok(GeoDict {
            xmin,
            xmax,
            ymin,
            ymax,
            dx: self.dx,
            dy: self.dy,
            nx: (last_col - first_col) as usize + 1,
            ny: (last_row - first_row) as usize + 1,
        })
    }
}

/// Normalize a longitude into `[-180, 180]`, keeping exactly 180 as is.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
        if (wrapped + 180.0).abs() < ALIGN_EPS && lon > 0.0 {
            180.0
        } else {
            wrapped
        }
    }
}

/// On-disk layout of a grid document.
#[derive(Debug, Deserialize)]
struct GridDocument {
    geodict: GeoDict,
    data: Vec<Vec<f64>>,
}

/// A 2-D scalar array with its geographic description.
#[derive(Debug, Clone)]
pub struct RasterField {
    geodict: GeoDict,
    data: Vec<f64>,
}

impl RasterField {
    pub fn new(geodict: GeoDict, data: Vec<f64>) -> MapResult<Self> {
        if data.len() != geodict.nx * geodict.ny {
            return Err(MapError::InvalidGrid(format!(
                "data length {} does not match {}x{} grid",
                data.len(),
                geodict.nx,
                geodict.ny
            )));
        }
        Ok(Self { geodict, data })
    }

    /// Read a grid document `{geodict: {...}, data: [[row0], [row1], ...]}`.
    pub fn from_json_reader<R: Read>(reader: R) -> MapResult<Self> {
        let doc: GridDocument = serde_json::from_reader(reader)?;
        doc.geodict.validate()?;
        if doc.data.len() != doc.geodict.ny {
            return Err(MapError::InvalidGrid(format!(
                "expected {} rows, found {}",
                doc.geodict.ny,
                doc.data.len()
            )));
        }
        let mut data = Vec::with_capacity(doc.geodict.nx * doc.geodict.ny);
        for (i, row) in doc.data.into_iter().enumerate() {
            if row.len() != doc.geodict.nx {
                return Err(MapError::InvalidGrid(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    doc.geodict.nx
                )));
            }
            data.extend(row);
        }
        Self::new(doc.geodict, data)
    }

    pub fn geodict(&self) -> &GeoDict {
        &self.geodict
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn width(&self) -> usize {
        self.geodict.nx
    }

    pub fn height(&self) -> usize {
        self.geodict.ny
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.geodict.ny && col < self.geodict.nx {
            Some(self.data[row * self.geodict.nx + col])
        } else {
            None
        }
    }

    /// Finite minimum and maximum, or `None` for an all-NaN field.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Sample the field at fractional indices, clamped to the grid.
    pub fn sample_bilinear(&self, col: f64, row: f64) -> f64 {
        sample_bilinear(&self.data, self.geodict.nx, self.geodict.ny, col, row)
    }

    /// Bilinearly resample onto another grid.
    pub fn interpolate_to(&self, target: &GeoDict) -> MapResult<RasterField> {
        target.validate()?;
        let mut data = Vec::with_capacity(target.nx * target.ny);
        for row in 0..target.ny {
            let frow = self.geodict.fractional_row(target.row_lat(row));
            for col in 0..target.nx {
                let fcol = self.geodict.fractional_col(target.col_lon(col));
                data.push(self.sample_bilinear(fcol, frow));
            }
        }
        RasterField::new(*target, data)
    }

    /// Extract the cells covered by an aligned dict without resampling.
    pub fn subset(&self, target: &GeoDict) -> MapResult<RasterField> {
        let src = &self.geodict;
        if (src.dx - target.dx).abs() > ALIGN_EPS || (src.dy - target.dy).abs() > ALIGN_EPS {
            return Err(MapError::InvalidGrid(format!(
                "subset resolution {}x{} differs from source {}x{}",
                target.dx, target.dy, src.dx, src.dy
            )));
        }
        let first_row = src.fractional_row(target.ymax).round();
        if first_row < 0.0 || first_row as usize + target.ny > src.ny {
            return Err(MapError::InvalidGrid(
                "subset rows fall outside the source grid".to_string(),
            ));
        }
        let first_row = first_row as usize;

        let mut cols = Vec::with_capacity(target.nx);
        for col in 0..target.nx {
            let c = src.fractional_col(target.col_lon(col)).round();
            if c < 0.0 || c as usize >= src.nx {
                return Err(MapError::InvalidGrid(format!(
                    "subset longitude {:.4} falls outside the source grid",
                    target.col_lon(col)
                )));
            }
            cols.push(c as usize);
        }

        let mut data = Vec::with_capacity(target.nx * target.ny);
        for row in first_row..first_row + target.ny {
            let offset = row * src.nx;
            data.extend(cols.iter().map(|&c| self.data[offset + c]));
        }
        RasterField::new(*target, data)
    }
}

/// Bilinear sample of a row-major `nx` x `ny` grid at fractional indices.
///
/// Coordinates outside the grid are clamped to the nearest edge. The grid
/// must be at least 2 x 2.
pub fn sample_bilinear(data: &[f64], nx: usize, ny: usize, col: f64, row: f64) -> f64 {
    let x = col.clamp(0.0, (nx - 1) as f64);
    let y = row.clamp(0.0, (ny - 1) as f64);

    let x0 = (x.floor() as usize).min(nx - 2);
    let y0 = (y.floor() as usize).min(ny - 2);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let v00 = data[y0 * nx + x0];
    let v10 = data[y0 * nx + x0 + 1];
    let v01 = data[(y0 + 1) * nx + x0];
    let v11 = data[(y0 + 1) * nx + x0 + 1];

    let top = v00 * (1.0 - fx) + v10 * fx;
    let bottom = v01 * (1.0 - fx) + v11 * fx;
    top * (1.0 - fy) + bottom * fy
}
