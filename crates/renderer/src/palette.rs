//! Color palettes for intensity and topography rendering.
//!
//! A palette is a list of linear color segments over a value range. Values
//! below the first segment take its start color, values above the last take
//! its end color, and NaN maps to the palette's NaN color.

use std::fmt;

use crate::error::{RenderError, RenderResult};

/// An opaque 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    pub fn from_unit(rgb: [f64; 3]) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    /// Linear interpolation towards `other`, `t` clamped to `0..=1`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One linear color ramp from `z0` to `z1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteSegment {
    pub z0: f64,
    pub z1: f64,
    pub rgb0: Rgb,
    pub rgb1: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    name: String,
    segments: Vec<PaletteSegment>,
    nan_color: Rgb,
}

impl ColorPalette {
    /// Build a palette from contiguous segments sorted by value.
    pub fn new(
        name: impl Into<String>,
        segments: Vec<PaletteSegment>,
        nan_color: Rgb,
    ) -> RenderResult<Self> {
        let name = name.into();
        if segments.is_empty() {
            return Err(RenderError::Configuration(format!(
                "palette '{}' has no segments",
                name
            )));
        }
        for pair in segments.windows(2) {
            if pair[1].z0 < pair[0].z1 || pair[0].z1 <= pair[0].z0 {
                return Err(RenderError::Configuration(format!(
                    "palette '{}' segments are not increasing at {}",
                    name, pair[0].z1
                )));
            }
        }
        Ok(Self {
            name,
            segments,
            nan_color,
        })
    }

    /// Look up a built-in palette by name.
    pub fn preset(name: &str) -> RenderResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mmi" => Ok(Self::mmi()),
            "shaketopo" => Ok(Self::shaketopo()),
            _ => Err(RenderError::UnknownPalette(name.to_string())),
        }
    }

    /// Macroseismic intensity palette, I (white) to X (dark red).
    pub fn mmi() -> Self {
        let colors = [
            Rgb::new(255, 255, 255),
            Rgb::new(255, 255, 255),
            Rgb::new(191, 204, 255),
            Rgb::new(160, 230, 255),
            Rgb::new(128, 255, 255),
            Rgb::new(122, 255, 147),
            Rgb::new(255, 255, 0),
            Rgb::new(255, 200, 0),
            Rgb::new(255, 145, 0),
            Rgb::new(255, 0, 0),
            Rgb::new(200, 0, 0),
        ];
        let segments = (0..10)
            .map(|i| PaletteSegment {
                z0: i as f64,
                z1: (i + 1) as f64,
                rgb0: colors[i],
                rgb1: colors[i + 1],
            })
            .collect();
        Self {
            name: "mmi".to_string(),
            segments,
            nan_color: Rgb::new(0, 0, 0),
        }
    }

    /// Topography palette used under contour maps, in meters.
    pub fn shaketopo() -> Self {
        let nodes: [(f64, Rgb); 12] = [
            (-100.0, Rgb::new(195, 255, 193)),
            (0.0, Rgb::new(110, 135, 80)),
            (50.0, Rgb::new(120, 140, 85)),
            (350.0, Rgb::new(150, 155, 100)),
            (1000.0, Rgb::new(180, 170, 120)),
            (1800.0, Rgb::new(190, 175, 140)),
            (2300.0, Rgb::new(175, 165, 150)),
            (2600.0, Rgb::new(150, 150, 150)),
            (4000.0, Rgb::new(90, 90, 90)),
            (4500.0, Rgb::new(60, 60, 60)),
            (6000.0, Rgb::new(200, 200, 200)),
            (9000.0, Rgb::new(255, 255, 255)),
        ];
        let segments = nodes
            .windows(2)
            .map(|w| PaletteSegment {
                z0: w[0].0,
                z1: w[1].0,
                rgb0: w[0].1,
                rgb1: w[1].1,
            })
            .collect();
        Self {
            name: "shaketopo".to_string(),
            segments,
            nan_color: Rgb::new(195, 255, 193),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vmin(&self) -> f64 {
        self.segments[0].z0
    }

    pub fn vmax(&self) -> f64 {
        self.segments[self.segments.len() - 1].z1
    }

    /// Color of a data value.
    pub fn color_at(&self, value: f64) -> Rgb {
        if value.is_nan() {
            return self.nan_color;
        }
        let first = &self.segments[0];
        if value <= first.z0 {
            return first.rgb0;
        }
        for seg in &self.segments {
            if value <= seg.z1 {
                if value < seg.z0 {
                    // Gap between segments.
                    return seg.rgb0;
                }
                let t = (value - seg.z0) / (seg.z1 - seg.z0);
                return seg.rgb0.lerp(seg.rgb1, t);
            }
        }
        self.segments[self.segments.len() - 1].rgb1
    }

    /// Color at a fraction of the palette range, as a normalized colormap
    /// lookup: `0.0` is `vmin` and `1.0` is `vmax`.
    pub fn color_at_fraction(&self, fraction: f64) -> Rgb {
        if fraction.is_nan() {
            return self.nan_color;
        }
        let f = fraction.clamp(0.0, 1.0);
        self.color_at(self.vmin() + f * (self.vmax() - self.vmin()))
    }
}

/// The palettes of one rendering session.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteSet {
    /// Colors intensity rasters, contour lines and station symbols.
    pub intensity: ColorPalette,
    /// Colors the topography under contour maps.
    pub topography: ColorPalette,
}

impl PaletteSet {
    pub fn from_names(intensity: &str, topography: &str) -> RenderResult<Self> {
        Ok(Self {
            intensity: ColorPalette::preset(intensity)?,
            topography: ColorPalette::preset(topography)?,
        })
    }
}

impl Default for PaletteSet {
    fn default() -> Self {
        Self {
            intensity: ColorPalette::mmi(),
            topography: ColorPalette::shaketopo(),
        }
    }
}
