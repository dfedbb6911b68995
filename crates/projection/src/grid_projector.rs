//! Reprojection of lon/lat rasters and vertices into map coordinates.
//!
//! A raster on a regular lon/lat grid is resampled onto a grid that is
//! regular in projected meters, keeping the same `nx × ny` dimensions. Each
//! output cell is inverse-projected to lon/lat and sampled bilinearly from
//! the input, clamping at the edges.

use shake_common::{sample_bilinear, GeoExtent, MapError, MapResult};

use crate::mercator::MapProjection;

/// Resample a north-up lon/lat raster onto a north-up projected grid.
///
/// `data` is row-major with `extent.nx` columns and `extent.ny` rows. The
/// output has the same shape; output row 0 is the top (north) edge of the
/// map and column 0 its west edge.
pub fn project_grid(
    data: &[f64],
    extent: &GeoExtent,
    projection: &MapProjection,
) -> MapResult<Vec<f64>> {
    let (nx, ny) = (extent.nx, extent.ny);
    if nx < 2 || ny < 2 {
        return Err(MapError::InvalidGrid(format!(
            "cannot project a {}x{} raster",
            nx, ny
        )));
    }
    if data.len() != nx * ny {
        return Err(MapError::InvalidGrid(format!(
            "raster has {} values, expected {}x{}",
            data.len(),
            nx,
            ny
        )));
    }

    let west = extent.west();
    let lon_span = extent.xmax - west;
    let lat_span = extent.ymax - extent.ymin;

    let dx = projection.width() / (nx - 1) as f64;
    let dy = projection.height() / (ny - 1) as f64;

    let mut out = Vec::with_capacity(nx * ny);
    for row in 0..ny {
        let y = projection.height() - row as f64 * dy;
        for col in 0..nx {
            let x = col as f64 * dx;
            let (lon, lat) = projection.inverse(x, y);

            let fcol = (lon - west) / lon_span * (nx - 1) as f64;
            let frow = (extent.ymax - lat) / lat_span * (ny - 1) as f64;
            out.push(sample_bilinear(data, nx, ny, fcol, frow));
        }
    }
    Ok(out)
}

/// Project vertex sequences into map meters.
pub fn project_points(
    lons: &[f64],
    lats: &[f64],
    projection: &MapProjection,
) -> (Vec<f64>, Vec<f64>) {
    lons.iter()
        .zip(lats.iter())
        .map(|(&lon, &lat)| projection.forward(lon, lat))
        .unzip()
}
