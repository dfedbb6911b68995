//! Separable Gaussian smoothing of row-major rasters.

use crate::error::{RenderError, RenderResult};

/// Kernel half-width in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Smooth a raster with a Gaussian of `sigma` cells.
///
/// Edges are extended by mirroring about the outer cell boundary
/// (`d c b a | a b c d | d c b a`), repeating as often as needed for
/// kernels wider than the raster.
pub fn gaussian_filter(
    data: &[f64],
    width: usize,
    height: usize,
    sigma: f64,
) -> RenderResult<Vec<f64>> {
    RenderError::check_dims(data, width, height)?;
    if sigma <= 0.0 {
        return Ok(data.to_vec());
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut rows = vec![0.0; data.len()];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect(x as isize + k as isize - radius, width);
                acc += weight * row[sx];
            }
            rows[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0; data.len()];
    for x in 0..width {
        for y in 0..height {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect(y as isize + k as isize - radius, height);
                acc += weight * rows[sy * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    Ok(out)
}

/// Normalized weights covering `±TRUNCATE·sigma`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}
