//! Contour lines (isolines) using the marching squares algorithm.
//!
//! The engine smooths a projected measure raster, picks levels from its data
//! range and traces every level into polylines in grid coordinates. Levels
//! carry their drawing role:
//!
//! - MMI half-unit levels (`3.5`, `4.5`, ...) are drawn dashed everywhere and
//!   solid beneath the water layer, with no label.
//! - MMI whole-unit levels are not stroked; their lines only anchor Roman
//!   numeral labels.
//! - Other measures are drawn dashed and solid in white, labelled with three
//!   significant digits.

use std::collections::{HashMap, VecDeque};

use shake_common::Imt;

use crate::error::{RenderError, RenderResult};
use crate::palette::{ColorPalette, Rgb};
use crate::smoothing::gaussian_filter;

/// Default smoothing, in grid cells.
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 5.0;

/// Stroke width of visible contour lines, in points.
pub const CONTOUR_LINE_WIDTH: f64 = 1.5;

const MMI_LABELS: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

/// A point in grid coordinates: `x` is the column, `y` the row (row 0 north).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn key(&self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f64,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// How levels are spaced across the data range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSpacing {
    /// Every half unit (intensity).
    Linear,
    /// 1, 2 and 5 times each decade (ground motions).
    Logarithmic,
}

impl LevelSpacing {
    pub fn for_imt(imt: &Imt) -> Self {
        if imt.is_mmi() {
            LevelSpacing::Linear
        } else {
            LevelSpacing::Logarithmic
        }
    }
}

/// Pick contour levels for a data range.
///
/// Linear levels are the half units in `[dmin, dmax]`. Logarithmic levels are
/// the 1-2-5 values strictly inside `(dmin, dmax)`; when none fit, the
/// midpoint of the range is the only level.
pub fn pick_levels(dmin: f64, dmax: f64, spacing: LevelSpacing) -> Vec<f64> {
    if !dmin.is_finite() || !dmax.is_finite() || dmax < dmin {
        return vec![];
    }
    match spacing {
        LevelSpacing::Linear => {
            let first = (dmin * 2.0).ceil() as i64;
            let last = (dmax * 2.0).floor() as i64;
            (first..=last).map(|k| k as f64 / 2.0).collect()
        }
        LevelSpacing::Logarithmic => {
            if dmax <= 0.0 {
                return vec![(dmin + dmax) / 2.0];
            }
            let upper = dmax.log10().ceil() as i32;
            // Non-positive minimums get three decades below the maximum.
            let lower = if dmin > 0.0 {
                dmin.log10().floor() as i32
            } else {
                upper - 3
            };
            let levels: Vec<f64> = (lower..=upper)
                .flat_map(|d| [1.0, 2.0, 5.0].map(|m| m * 10f64.powi(d)))
                .filter(|&l| l > dmin && l < dmax)
                .collect();
            if levels.is_empty() {
                vec![(dmin + dmax) / 2.0]
            } else {
                levels
            }
        }
    }
}

/// Roman numeral label for a whole intensity unit, I through X.
pub fn roman_numeral(level: f64) -> Option<&'static str> {
    if level.fract() != 0.0 || !(1.0..=10.0).contains(&level) {
        return None;
    }
    Some(MMI_LABELS[level as usize - 1])
}

/// Format with three significant digits the way `%.3g` does: fixed notation
/// for exponents from -4 to 2, scientific otherwise, trailing zeros removed.
pub fn format_sig3(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sci = format!("{:.2e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if !(-4..3).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (2 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Drawing role of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// MMI level at `n + 0.5`.
    HalfUnit,
    /// MMI level at a whole unit.
    WholeUnit,
    /// A level of a ground-motion measure.
    Measure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourLevel {
    pub value: f64,
    pub kind: LevelKind,
    /// Text drawn along the level's lines, if any.
    pub label: Option<String>,
    pub color: Rgb,
}

impl ContourLevel {
    fn new(value: f64, imt: &Imt, palette: &ColorPalette) -> Self {
        if imt.is_mmi() {
            let color = palette.color_at(value);
            if (value * 2.0).rem_euclid(2.0) == 1.0 {
                Self {
                    value,
                    kind: LevelKind::HalfUnit,
                    label: None,
                    color,
                }
            } else {
                Self {
                    value,
                    kind: LevelKind::WholeUnit,
                    label: roman_numeral(value).map(str::to_string),
                    color,
                }
            }
        } else {
            Self {
                value,
                kind: LevelKind::Measure,
                label: Some(format_sig3(value)),
                color: Rgb::WHITE,
            }
        }
    }

    /// Whether the level is stroked at all. Whole MMI units only carry labels.
    pub fn is_stroked(&self) -> bool {
        self.kind != LevelKind::WholeUnit
    }
}

/// Contours of one measure raster.
#[derive(Debug, Clone)]
pub struct ContourSet {
    pub imt: Imt,
    /// Range of the smoothed data.
    pub data_range: (f64, f64),
    pub levels: Vec<ContourLevel>,
    /// Lines of every level, tagged with the level value.
    pub lines: Vec<Contour>,
    width: usize,
    height: usize,
}

impl ContourSet {
    /// Lines traced at one level.
    pub fn lines_at<'a>(&'a self, level: &'a ContourLevel) -> impl Iterator<Item = &'a Contour> {
        self.lines.iter().filter(move |c| c.level == level.value)
    }

    /// Convert a grid point to map meters for a map of the given size, with
    /// the grid spanning the whole map.
    pub fn to_map(&self, p: Point, map_width: f64, map_height: f64) -> (f64, f64) {
        let x = p.x / (self.width - 1) as f64 * map_width;
        let y = map_height - p.y / (self.height - 1) as f64 * map_height;
        (x, y)
    }
}

/// Builds contour sets; requires a palette for coloring intensity levels.
#[derive(Debug, Clone)]
pub struct ContourEngine {
    palette: ColorPalette,
    sigma: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ContourEngineBuilder {
    palette: Option<ColorPalette>,
    sigma: Option<f64>,
}

impl ContourEngineBuilder {
    pub fn palette(mut self, palette: ColorPalette) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn smoothing_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn build(self) -> RenderResult<ContourEngine> {
        let palette = self.palette.ok_or_else(|| {
            RenderError::Configuration("contour engine has no color palette".to_string())
        })?;
        Ok(ContourEngine {
            palette,
            sigma: self.sigma.unwrap_or(DEFAULT_SMOOTHING_SIGMA),
        })
    }
}

impl ContourEngine {
    pub fn builder() -> ContourEngineBuilder {
        ContourEngineBuilder::default()
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Contour a projected raster already converted to display units.
    pub fn build_contours(
        &self,
        data: &[f64],
        width: usize,
        height: usize,
        imt: &Imt,
    ) -> RenderResult<ContourSet> {
        let smoothed = gaussian_filter(data, width, height, self.sigma)?;
        let (dmin, dmax) = smoothed
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let levels: Vec<ContourLevel> = pick_levels(dmin, dmax, LevelSpacing::for_imt(imt))
            .into_iter()
            .map(|value| ContourLevel::new(value, imt, &self.palette))
            .collect();

        let mut lines = Vec::new();
        for level in &levels {
            let segments = march_squares(&smoothed, width, height, level.value);
            let mut contours = connect_segments(segments);
            for contour in &mut contours {
                contour.level = level.value;
            }
            lines.extend(contours);
        }

        tracing::debug!(
            imt = %imt,
            data_min = dmin,
            data_max = dmax,
            num_levels = levels.len(),
            num_lines = lines.len(),
            total_points = lines.iter().map(|c| c.points.len()).sum::<usize>(),
            "Generated contours"
        );

        Ok(ContourSet {
            imt: *imt,
            data_range: (dmin, dmax),
            levels,
            lines,
            width,
            height,
        })
    }
}

/// Convert stored (log) values to display units before leveling.
pub fn to_display_units(data: &[f64], imt: &Imt) -> Vec<f64> {
    data.iter().map(|&v| imt.convert_units(v)).collect()
}

/// Marching squares algorithm to generate contour lines
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f64], width: usize, height: usize, level: f64) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(get_cell_segments(
                cell_index, x as f64, y as f64, tl, tr, br, bl, level,
            ));
        }
    }

    segments
}

/// Get line segments for a marching squares cell
///
/// Uses linear interpolation to find where the contour crosses cell edges
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f64,
    y: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
    level: f64,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        5 => vec![
            // Saddle case - two separate segments
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            // Saddle case - two separate segments
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(x1: f64, y1: f64, x2: f64, y2: f64, val1: f64, val2: f64, level: f64) -> Point {
    if (val2 - val1).abs() < 1e-12 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Connect line segments into continuous polylines
///
/// Neighbouring cells compute shared edge crossings from the same corner
/// values, so matching endpoints are bit-identical and can be joined by
/// exact lookup. Each chain is grown from both ends.
pub fn connect_segments(segments: Vec<Segment>) -> Vec<Contour> {
    let mut by_endpoint: HashMap<(u64, u64), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_endpoint.entry(seg.start.key()).or_default().push(i);
        by_endpoint.entry(seg.end.key()).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    // Next unused segment touching `p`, returned with its far end.
    let take_next = |p: Point, used: &mut Vec<bool>| -> Option<Point> {
        let candidates = by_endpoint.get(&p.key())?;
        for &i in candidates {
            if used[i] {
                continue;
            }
            used[i] = true;
            let seg = &segments[i];
            return Some(if seg.start.key() == p.key() { seg.end } else { seg.start });
        }
        None
    };

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = VecDeque::from([segments[start_idx].start, segments[start_idx].end]);

        while let Some(last) = points.back().copied() {
            match take_next(last, &mut used) {
                Some(next) => points.push_back(next),
                None => break,
            }
        }
        while let Some(first) = points.front().copied() {
            match take_next(first, &mut used) {
                Some(prev) => points.push_front(prev),
                None => break,
            }
        }

        let points: Vec<Point> = points.into_iter().collect();
        let closed = points.len() > 3 && points[0].key() == points[points.len() - 1].key();
        contours.push(Contour {
            level: 0.0, // Level will be set by caller
            points,
            closed,
        });
    }

    contours
}

/// Placement parameters for labels along lines in page coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LabelLayout {
    /// Target distance between labels along one line.
    pub spacing: f64,
    pub font_size: f64,
    /// Allowed area as `[min_x, min_y, max_x, max_y]`.
    pub bounds: [f64; 4],
}

/// Position and metadata for a contour label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub x: f64,
    pub y: f64,
    /// Rotation along the line, in radians, kept upright.
    pub angle: f64,
    pub text: String,
}

/// Calculate the total length of a polyline
fn polyline_length(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
        .sum()
}

/// Collect label positions along a polyline, skipping spots too close to the
/// bounds or to labels already placed.
pub fn collect_label_positions(
    points: &[(f64, f64)],
    text: &str,
    layout: &LabelLayout,
    positions: &mut Vec<LabelPosition>,
) {
    let total_length = polyline_length(points);
    if total_length < layout.spacing * 0.5 {
        return; // Line too short for labels
    }

    let margin = layout.font_size * 2.0;
    let [min_x, min_y, max_x, max_y] = layout.bounds;
    let min_distance = layout.font_size * 4.0;

    let num_labels = ((total_length / layout.spacing).floor() as usize).max(1);
    let spacing = total_length / (num_labels as f64 + 1.0);

    let mut accumulated_length = 0.0;
    let mut next_label_at = spacing;
    let mut label_count = 0;

    for w in points.windows(2) {
        if label_count >= num_labels {
            break;
        }
        let (p1, p2) = (w[0], w[1]);
        let dx = p2.0 - p1.0;
        let dy = p2.1 - p1.1;
        let segment_length = (dx * dx + dy * dy).sqrt();

        while accumulated_length + segment_length >= next_label_at && label_count < num_labels {
            let t = (next_label_at - accumulated_length) / segment_length;
            let x = p1.0 + t * dx;
            let y = p1.1 + t * dy;

            let inside = x > min_x + margin
                && x < max_x - margin
                && y > min_y + margin
                && y < max_y - margin;
            if inside {
                let angle = dy.atan2(dx);
                // Flip angle if text would be upside down
                let angle = if angle.abs() > std::f64::consts::FRAC_PI_2 {
                    angle + std::f64::consts::PI
                } else {
                    angle
                };

                let has_overlap = positions.iter().any(|pos| {
                    (pos.x - x).powi(2) + (pos.y - y).powi(2) < min_distance * min_distance
                });
                if !has_overlap {
                    positions.push(LabelPosition {
                        x,
                        y,
                        angle,
                        text: text.to_string(),
                    });
                }
            }

            next_label_at += spacing;
            label_count += 1;
        }

        accumulated_length += segment_length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn test_march_squares_flat() {
        let data = vec![5.0; 9];
        let segments = march_squares(&data, 3, 3, 6.0);
        assert_eq!(segments.len(), 0);
    }

    #[test]
    fn test_peak_makes_closed_ring() {
        let data = vec![
            0.0, 0.0, 0.0, //
            0.0, 10.0, 0.0, //
            0.0, 0.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 3, 5.0);
        assert_eq!(segments.len(), 4);
        let contours = connect_segments(segments);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert_eq!(contours[0].points.len(), 5);
    }

    #[test]
    fn test_open_line_joined_from_both_ends() {
        // Left half low, right half high: one vertical line.
        let data = vec![
            0.0, 0.0, 10.0, 10.0, //
            0.0, 0.0, 10.0, 10.0, //
            0.0, 0.0, 10.0, 10.0, //
            0.0, 0.0, 10.0, 10.0,
        ];
        let contours = connect_segments(march_squares(&data, 4, 4, 5.0));
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].closed);
        assert_eq!(contours[0].points.len(), 4);
        for p in &contours[0].points {
            assert!((p.x - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trim_zeros() {
        assert_eq!(trim_zeros("2.00"), "2");
        assert_eq!(trim_zeros("2.50"), "2.5");
        assert_eq!(trim_zeros("100"), "100");
    }

    #[test]
    fn test_builder_requires_palette() {
        let err = ContourEngine::builder().build().unwrap_err();
        assert!(matches!(err, RenderError::Configuration(_)));
    }
}
