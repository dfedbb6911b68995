//! Shaded relief: hillshading topography and draping color over it.
//!
//! Two light sources (azimuth 120° and 225°, both 45° above the horizon)
//! shade the topography with a vertical exaggeration of 0.1 and a contrast
//! fraction of 0.25; the two shades are averaged and blended into the
//! colored raster in HSV space.

use image::RgbImage;

use crate::error::{RenderError, RenderResult};
use crate::palette::{PaletteSet, Rgb};

pub const VERTICAL_EXAGGERATION: f64 = 0.1;
pub const SHADE_FRACTION: f64 = 0.25;

/// A directional light used for hillshading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    /// Degrees clockwise from north.
    pub azimuth_deg: f64,
    /// Degrees above the horizon.
    pub altitude_deg: f64,
}

impl LightSource {
    pub const fn new(azimuth_deg: f64, altitude_deg: f64) -> Self {
        Self {
            azimuth_deg,
            altitude_deg,
        }
    }

    /// Unit vector pointing at the light, in (east, north, up).
    fn direction(&self) -> [f64; 3] {
        let az = (90.0 - self.azimuth_deg).to_radians();
        let alt = self.altitude_deg.to_radians();
        [az.cos() * alt.cos(), az.sin() * alt.cos(), alt.sin()]
    }

    /// Illumination of each cell in `0.0..=1.0`.
    ///
    /// `elevation` is row-major with row 0 at the north edge; cell spacing is
    /// taken as one unit in both directions. The raw illumination is scaled
    /// by `fraction` and then stretched over its pre-scaling range.
    pub fn hillshade(
        &self,
        elevation: &[f64],
        width: usize,
        height: usize,
        vert_exag: f64,
        fraction: f64,
    ) -> RenderResult<Vec<f64>> {
        RenderError::check_dims(elevation, width, height)?;
        let light = self.direction();

        let scaled: Vec<f64> = elevation.iter().map(|v| v * vert_exag).collect();
        let mut intensity = Vec::with_capacity(scaled.len());
        for row in 0..height {
            for col in 0..width {
                let e_dx = gradient(&scaled, width, row, col, Axis::Columns);
                // Rows run north to south, so the northward slope is negated.
                let e_dy = -gradient(&scaled, width, row, col, Axis::Rows);
                let normal = [-e_dx, -e_dy, 1.0];
                let norm = (normal[0].powi(2) + normal[1].powi(2) + 1.0).sqrt();
                intensity.push(
                    (normal[0] * light[0] + normal[1] * light[1] + normal[2] * light[2]) / norm,
                );
            }
        }

        let (imin, imax) = finite_range(&intensity);
        let stretch = imax - imin > 1e-6;
        Ok(intensity
            .into_iter()
            .map(|i| {
                let mut v = i * fraction;
                if stretch {
                    v = (v - imin) / (imax - imin);
                }
                v.clamp(0.0, 1.0)
            })
            .collect())
    }
}

pub const LIGHT_ONE: LightSource = LightSource::new(120.0, 45.0);
pub const LIGHT_TWO: LightSource = LightSource::new(225.0, 45.0);

/// Average of the two standard light sources.
pub fn dual_hillshade(elevation: &[f64], width: usize, height: usize) -> RenderResult<Vec<f64>> {
    let one = LIGHT_ONE.hillshade(elevation, width, height, VERTICAL_EXAGGERATION, SHADE_FRACTION)?;
    let two = LIGHT_TWO.hillshade(elevation, width, height, VERTICAL_EXAGGERATION, SHADE_FRACTION)?;
    Ok(one.iter().zip(&two).map(|(a, b)| 0.5 * a + 0.5 * b).collect())
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

/// Central differences inside the raster, one-sided at its edges.
fn gradient(data: &[f64], width: usize, row: usize, col: usize, axis: Axis) -> f64 {
    let height = data.len() / width;
    let at = |r: usize, c: usize| data[r * width + c];
    match axis {
        Axis::Columns => {
            if col == 0 {
                at(row, 1) - at(row, 0)
            } else if col == width - 1 {
                at(row, col) - at(row, col - 1)
            } else {
                (at(row, col + 1) - at(row, col - 1)) / 2.0
            }
        }
        Axis::Rows => {
            if row == 0 {
                at(1, col) - at(0, col)
            } else if row == height - 1 {
                at(row, col) - at(row - 1, col)
            } else {
                (at(row + 1, col) - at(row - 1, col)) / 2.0
            }
        }
    }
}

fn finite_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

const HSV_MIN_VAL: f64 = 0.0;
const HSV_MAX_VAL: f64 = 1.0;
const HSV_MIN_SAT: f64 = 1.0;
const HSV_MAX_SAT: f64 = 0.0;

/// Blend a color with an illumination value in HSV space.
///
/// Intensity above 0.5 pushes toward white (lower saturation, higher
/// value); below 0.5 toward black. NaN intensity leaves the color as is.
pub fn blend_hsv(rgb: [f64; 3], intensity: f64) -> [f64; 3] {
    if intensity.is_nan() {
        return rgb;
    }
    let [h, mut s, mut v] = rgb_to_hsv(rgb);
    let i = 2.0 * intensity - 1.0;

    if s.abs() > 1e-10 {
        if i > 0.0 {
            s = (1.0 - i) * s + i * HSV_MAX_SAT;
        } else if i < 0.0 {
            s = (1.0 + i) * s - i * HSV_MIN_SAT;
        }
    }
    if i > 0.0 {
        v = (1.0 - i) * v + i * HSV_MAX_VAL;
    } else if i < 0.0 {
        v = (1.0 + i) * v - i * HSV_MIN_VAL;
    }

    hsv_to_rgb([h, s.clamp(0.0, 1.0), v.clamp(0.0, 1.0)])
}

fn rgb_to_hsv([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    [h, s, max]
}

fn hsv_to_rgb([h, s, v]: [f64; 3]) -> [f64; 3] {
    if s <= 0.0 {
        return [v, v, v];
    }
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// What the colored layer under the hillshade represents.
#[derive(Debug, Clone, Copy)]
pub enum DrapeMode<'a> {
    /// A measure raster (intensity), colored by the intensity palette.
    Intensity(&'a [f64]),
    /// The topography itself, colored by the topography palette.
    ContourBackground,
}

/// Combines color and hillshading into the map's base image.
#[derive(Debug, Clone, Copy)]
pub struct ReliefCompositor<'a> {
    palettes: &'a PaletteSet,
}

impl<'a> ReliefCompositor<'a> {
    pub fn new(palettes: &'a PaletteSet) -> Self {
        Self { palettes }
    }

    /// Build the shaded image; its pixel size equals the raster size.
    ///
    /// Values are normalized by the palette maximum before the color lookup.
    pub fn drape(
        &self,
        mode: DrapeMode<'_>,
        topography: &[f64],
        width: usize,
        height: usize,
    ) -> RenderResult<RgbImage> {
        let shade = dual_hillshade(topography, width, height)?;
        let (values, palette) = match mode {
            DrapeMode::Intensity(values) => {
                RenderError::check_dims(values, width, height)?;
                (values, &self.palettes.intensity)
            }
            DrapeMode::ContourBackground => (topography, &self.palettes.topography),
        };
        let vmax = palette.vmax();

        let mut image = RgbImage::new(width as u32, height as u32);
        for (idx, pixel) in image.pixels_mut().enumerate() {
            let base = palette.color_at_fraction(values[idx] / vmax);
            let Rgb { r, g, b } = Rgb::from_unit(blend_hsv(base.to_unit(), shade[idx]));
            *pixel = image::Rgb([r, g, b]);
        }
        tracing::debug!(
            width = width,
            height = height,
            palette = palette.name(),
            "Draped raster over hillshade"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain_is_uniform() {
        let flat = vec![100.0; 5 * 4];
        let shade = LIGHT_ONE.hillshade(&flat, 5, 4, 0.1, 0.25).unwrap();
        // No range to stretch: fraction times sin(45°).
        let expected = 0.25 * 45f64.to_radians().sin();
        for v in shade {
            assert!((v - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_slope_facing_light_is_brighter() {
        // Elevation rises to the west, so slopes face east.
        let (w, h) = (6, 6);
        let mut ramp = vec![0.0; w * h];
        for r in 0..h {
            for c in 0..w {
                ramp[r * w + c] = (w - c) as f64 * 50.0;
            }
        }
        let east = LightSource::new(90.0, 45.0).hillshade(&ramp, w, h, 1.0, 1.0).unwrap();
        let west = LightSource::new(270.0, 45.0).hillshade(&ramp, w, h, 1.0, 1.0).unwrap();
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(mean(&east) >= mean(&west));
    }

    #[test]
    fn test_light_direction() {
        let d = LightSource::new(90.0, 0.0).direction();
        assert!((d[0] - 1.0).abs() < 1e-12);
        assert!(d[1].abs() < 1e-12 && d[2].abs() < 1e-12);
    }

    #[test]
    fn test_blend_midpoint_keeps_color() {
        let rgb = [0.2, 0.6, 0.4];
        let out = blend_hsv(rgb, 0.5);
        for k in 0..3 {
            assert!((out[k] - rgb[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend_hsv([1.0, 0.0, 0.0], 1.0), [1.0, 1.0, 1.0]);
        assert_eq!(blend_hsv([1.0, 0.0, 0.0], 0.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hsv_roundtrip() {
        for rgb in [[0.1, 0.5, 0.9], [1.0, 1.0, 0.0], [0.3, 0.3, 0.3], [0.8, 0.1, 0.4]] {
            let back = hsv_to_rgb(rgb_to_hsv(rgb));
            for k in 0..3 {
                assert!((back[k] - rgb[k]).abs() < 1e-12);
            }
        }
    }
}
