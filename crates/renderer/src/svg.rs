//! SVG map documents.
//!
//! A document is laid out in points (1/72 inch). The map occupies a frame
//! fitted inside the axes rectangle `[0.1, 0.1, 0.8, 0.8]` of the page with
//! the map's aspect ratio preserved. Map content is collected per draw pass
//! and emitted in pass order, clipped to the frame; graticule labels and the
//! title sit outside it.

use std::collections::BTreeMap;

use base64::Engine;
use image::{ImageEncoder, RgbImage};

use crate::error::RenderResult;
use crate::palette::Rgb;

pub const POINTS_PER_INCH: f64 = 72.0;

/// Axes rectangle as fractions of the page: left, bottom, width, height.
pub const AXES_RECT: [f64; 4] = [0.1, 0.1, 0.8, 0.8];

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Layers of a map, bottom to top.
///
/// The solid contour pass lies beneath the water pass, so oceans and lakes
/// hide it and those contours only show on land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawPass {
    Image,
    Roads,
    LandContours,
    Water,
    Boundaries,
    DashedContours,
    Rupture,
    Stations,
    Overlay,
    ScaleBar,
}

impl DrawPass {
    fn id(self) -> &'static str {
        match self {
            DrawPass::Image => "image",
            DrawPass::Roads => "roads",
            DrawPass::LandContours => "land-contours",
            DrawPass::Water => "water",
            DrawPass::Boundaries => "boundaries",
            DrawPass::DashedContours => "dashed-contours",
            DrawPass::Rupture => "rupture",
            DrawPass::Stations => "stations",
            DrawPass::Overlay => "overlay",
            DrawPass::ScaleBar => "scale-bar",
        }
    }
}

/// Page size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FigureSize {
    pub fn width_pt(&self) -> f64 {
        self.width_in * POINTS_PER_INCH
    }

    pub fn height_pt(&self) -> f64 {
        self.height_in * POINTS_PER_INCH
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 8.0,
        }
    }
}

/// Placement of the map on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    map_width: f64,
    map_height: f64,
}

impl MapFrame {
    /// Fit a map of `map_width × map_height` meters into the axes rectangle.
    pub fn fit(figure: FigureSize, map_width: f64, map_height: f64) -> Self {
        let [ax, ay, aw, ah] = AXES_RECT;
        let axes_left = ax * figure.width_pt();
        let axes_width = aw * figure.width_pt();
        let axes_height = ah * figure.height_pt();
        let axes_top = figure.height_pt() - (ay + ah) * figure.height_pt();

        let aspect = map_width / map_height;
        let (width, height) = if aspect >= axes_width / axes_height {
            (axes_width, axes_width / aspect)
        } else {
            (axes_height * aspect, axes_height)
        };
        Self {
            left: axes_left + (axes_width - width) / 2.0,
            top: axes_top + (axes_height - height) / 2.0,
            width,
            height,
            map_width,
            map_height,
        }
    }

    /// Map meters to page points (y grows downward on the page).
    pub fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.left + x / self.map_width * self.width,
            self.top + (1.0 - y / self.map_height) * self.height,
        )
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// `[min_x, min_y, max_x, max_y]` in page points.
    pub fn bounds(&self) -> [f64; 4] {
        [self.left, self.top, self.right(), self.bottom()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgb,
    pub width: f64,
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: Rgb, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub fn dashed(color: Rgb, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!(
            r#"fill="none" stroke="{}" stroke-width="{:.2}" stroke-linejoin="round""#,
            self.color, self.width
        );
        if self.dashed {
            attrs.push_str(&format!(
                r#" stroke-dasharray="{:.2} {:.2}" stroke-linecap="butt""#,
                3.7 * self.width,
                1.6 * self.width
            ));
        } else {
            attrs.push_str(r#" stroke-linecap="round""#);
        }
        attrs
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub fill: Rgb,
    pub edge: Option<Rgb>,
    pub edge_width: f64,
}

impl FillStyle {
    fn attributes(&self) -> String {
        match self.edge {
            Some(edge) => format!(
                r#"fill="{}" stroke="{}" stroke-width="{:.2}" stroke-linejoin="round""#,
                self.fill, edge, self.edge_width
            ),
            None => format!(r#"fill="{}" stroke="none""#, self.fill),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Triangle,
    Star,
}

/// A point symbol; `size` is the symbol's diameter in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub size: f64,
    /// `None` draws an open symbol.
    pub fill: Option<Rgb>,
    pub edge: Rgb,
    pub edge_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Rgb,
    pub anchor: TextAnchor,
    pub vertical: VerticalAlign,
    /// Outline drawn behind the glyphs: color and width in points.
    pub halo: Option<(Rgb, f64)>,
    /// Rounded box drawn behind the text.
    pub background: Option<Rgb>,
    pub rotation_deg: f64,
}

impl TextStyle {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            color: Rgb::BLACK,
            anchor: TextAnchor::Middle,
            vertical: VerticalAlign::Center,
            halo: None,
            background: None,
            rotation_deg: 0.0,
        }
    }

    pub fn anchored(mut self, anchor: TextAnchor, vertical: VerticalAlign) -> Self {
        self.anchor = anchor;
        self.vertical = vertical;
        self
    }

    pub fn with_halo(mut self, color: Rgb, width: f64) -> Self {
        self.halo = Some((color, width));
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = Some(color);
        self
    }

    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotation_deg = degrees;
        self
    }
}

/// A map page under construction.
#[derive(Debug, Clone)]
pub struct MapDocument {
    figure: FigureSize,
    frame: MapFrame,
    passes: BTreeMap<DrawPass, Vec<String>>,
    margin: Vec<String>,
    title: Vec<String>,
}

impl MapDocument {
    pub fn new(figure: FigureSize, map_width: f64, map_height: f64) -> Self {
        Self {
            figure,
            frame: MapFrame::fit(figure, map_width, map_height),
            passes: BTreeMap::new(),
            margin: Vec::new(),
            title: Vec::new(),
        }
    }

    pub fn figure(&self) -> FigureSize {
        self.figure
    }

    pub fn frame(&self) -> &MapFrame {
        &self.frame
    }

    /// Number of elements drawn in a pass.
    pub fn pass_len(&self, pass: DrawPass) -> usize {
        self.passes.get(&pass).map(Vec::len).unwrap_or(0)
    }

    fn push(&mut self, pass: DrawPass, element: String) {
        self.passes.entry(pass).or_default().push(element);
    }

    /// Stretch an image over the whole map frame, one pixel per cell.
    pub fn raster(&mut self, pass: DrawPass, image: &RgbImage) -> RenderResult<()> {
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
        let f = self.frame;
        self.push(
            pass,
            format!(
                r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="none" image-rendering="optimizeSpeed" xlink:href="data:image/png;base64,{}"/>"#,
                f.left, f.top, f.width, f.height, encoded
            ),
        );
        Ok(())
    }

    /// Stroke a polyline given in map meters.
    pub fn polyline(&mut self, pass: DrawPass, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        let coords = self.page_points(points);
        self.push(
            pass,
            format!(r#"<polyline points="{}" {}/>"#, coords, style.attributes()),
        );
    }

    /// Fill a polygon given as rings in map meters; later rings are holes.
    pub fn polygon(&mut self, pass: DrawPass, rings: &[Vec<(f64, f64)>], style: &FillStyle) {
        let mut d = String::new();
        for ring in rings.iter().filter(|r| r.len() >= 3) {
            for (i, &(x, y)) in ring.iter().enumerate() {
                let (px, py) = self.frame.to_page(x, y);
                let cmd = if i == 0 { 'M' } else { 'L' };
                d.push_str(&format!("{}{:.2} {:.2} ", cmd, px, py));
            }
            d.push_str("Z ");
        }
        if d.is_empty() {
            return;
        }
        self.push(
            pass,
            format!(
                r#"<path d="{}" fill-rule="evenodd" {}/>"#,
                d.trim_end(),
                style.attributes()
            ),
        );
    }

    /// Axis-aligned rectangle in map meters anchored at its lower-left corner.
    pub fn rect(&mut self, pass: DrawPass, x: f64, y: f64, width: f64, height: f64, style: &FillStyle) {
        let (left, bottom) = self.frame.to_page(x, y);
        let (right, top) = self.frame.to_page(x + width, y + height);
        self.push(
            pass,
            format!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}/>"#,
                left,
                top,
                right - left,
                bottom - top,
                style.attributes()
            ),
        );
    }

    /// Point symbol at a map position.
    pub fn marker(&mut self, pass: DrawPass, at: (f64, f64), style: &MarkerStyle) {
        let (cx, cy) = self.frame.to_page(at.0, at.1);
        let element = marker_element(cx, cy, style);
        self.push(pass, element);
    }

    /// Text at a page position inside the frame.
    pub fn text(&mut self, pass: DrawPass, at: (f64, f64), text: &str, style: &TextStyle) {
        let element = text_element(at, text, style);
        self.push(pass, element);
    }

    /// Line in page points outside the map clip (ticks).
    pub fn margin_line(&mut self, from: (f64, f64), to: (f64, f64), style: &LineStyle) {
        self.margin.push(format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" {}/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            style.attributes()
        ));
    }

    /// Text in page points outside the map clip.
    pub fn margin_text(&mut self, at: (f64, f64), text: &str, style: &TextStyle) {
        self.margin.push(text_element(at, text, style));
    }

    /// Title above the frame, one element per line, bottom line closest to
    /// the map.
    pub fn title(&mut self, text: &str, size: f64) {
        self.title.clear();
        let lines: Vec<&str> = text.lines().collect();
        let cx = self.frame.left + self.frame.width / 2.0;
        let line_height = size * 1.2;
        let base = self.frame.top - 6.0;
        let style = TextStyle::new(size).anchored(TextAnchor::Middle, VerticalAlign::Bottom);
        for (i, line) in lines.iter().enumerate() {
            let from_bottom = (lines.len() - 1 - i) as f64;
            self.title.push(text_element(
                (cx, base - from_bottom * line_height),
                line.trim_start(),
                &style,
            ));
        }
    }

    fn page_points(&self, points: &[(f64, f64)]) -> String {
        points
            .iter()
            .map(|&(x, y)| {
                let (px, py) = self.frame.to_page(x, y);
                format!("{:.2},{:.2}", px, py)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize the page.
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.figure.width_pt(), self.figure.height_pt());
        let f = self.frame;
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w:.2}" height="{h:.2}" viewBox="0 0 {w:.2} {h:.2}">"#
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<defs><clipPath id="map-frame"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
            f.left, f.top, f.width, f.height
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<rect x="0" y="0" width="{w:.2}" height="{h:.2}" fill="{}"/>"#,
            Rgb::WHITE
        ));
        svg.push('\n');

        svg.push_str(r#"<g clip-path="url(#map-frame)">"#);
        svg.push('\n');
        for (pass, elements) in &self.passes {
            svg.push_str(&format!(r#"<g id="{}">"#, pass.id()));
            svg.push('\n');
            for element in elements {
                svg.push_str(element);
                svg.push('\n');
            }
            svg.push_str("</g>\n");
        }
        svg.push_str("</g>\n");

        svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}" stroke-width="0.8"/>"#,
            f.left,
            f.top,
            f.width,
            f.height,
            Rgb::BLACK
        ));
        svg.push('\n');
        for element in self.margin.iter().chain(&self.title) {
            svg.push_str(element);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn marker_element(cx: f64, cy: f64, style: &MarkerStyle) -> String {
    let r = style.size / 2.0;
    let fill = style.fill.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string());
    let paint = format!(
        r#"fill="{}" stroke="{}" stroke-width="{:.2}" stroke-linejoin="miter""#,
        fill, style.edge, style.edge_width
    );
    match style.shape {
        MarkerShape::Circle => format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" {}/>"#,
            cx, cy, r, paint
        ),
        MarkerShape::Triangle => format!(
            r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" {}/>"#,
            cx,
            cy - r,
            cx - r,
            cy + r,
            cx + r,
            cy + r,
            paint
        ),
        MarkerShape::Star => {
            let inner = r * 0.381966;
            let points: Vec<String> = (0..10)
                .map(|i| {
                    let radius = if i % 2 == 0 { r } else { inner };
                    let angle = std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
                    format!("{:.2},{:.2}", cx + radius * angle.cos(), cy - radius * angle.sin())
                })
                .collect();
            format!(r#"<polygon points="{}" {}/>"#, points.join(" "), paint)
        }
    }
}

fn text_element(at: (f64, f64), text: &str, style: &TextStyle) -> String {
    let (x, y) = at;
    let anchor = match style.anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    let baseline = match style.vertical {
        VerticalAlign::Top => "hanging",
        VerticalAlign::Center => "central",
        VerticalAlign::Bottom => "alphabetic",
    };
    let mut paint = format!(r#"fill="{}""#, style.color);
    if let Some((color, width)) = style.halo {
        paint.push_str(&format!(
            r#" stroke="{}" stroke-width="{:.2}" stroke-linejoin="round" paint-order="stroke""#,
            color, width
        ));
    }
    let transform = if style.rotation_deg != 0.0 {
        format!(r#" transform="rotate({:.2} {:.2} {:.2})""#, style.rotation_deg, x, y)
    } else {
        String::new()
    };

    let mut element = String::new();
    if let Some(background) = style.background {
        let w = text.chars().count() as f64 * style.size * 0.6 + style.size * 0.6;
        let h = style.size * 1.5;
        let left = match style.anchor {
            TextAnchor::Start => x - style.size * 0.3,
            TextAnchor::Middle => x - w / 2.0,
            TextAnchor::End => x - w + style.size * 0.3,
        };
        let top = match style.vertical {
            VerticalAlign::Top => y - style.size * 0.25,
            VerticalAlign::Center => y - h / 2.0,
            VerticalAlign::Bottom => y - h + style.size * 0.25,
        };
        element.push_str(&format!(
            r#"<g{}><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" stroke="{}"/>"#,
            transform,
            left,
            top,
            w,
            h,
            style.size * 0.4,
            background,
            background
        ));
        element.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" text-anchor="{}" dominant-baseline="{}" {}>{}</text></g>"#,
            x,
            y,
            FONT_FAMILY,
            style.size,
            anchor,
            baseline,
            paint,
            escape(text)
        ));
    } else {
        element.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" text-anchor="{}" dominant-baseline="{}" {}{}>{}</text>"#,
            x,
            y,
            FONT_FAMILY,
            style.size,
            anchor,
            baseline,
            paint,
            transform,
            escape(text)
        ));
    }
    element
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_stacks_between_contour_passes() {
        let mut doc = MapDocument::new(FigureSize::default(), 100.0, 100.0);
        let line = [(0.0, 0.0), (100.0, 100.0)];
        let square = vec![vec![(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)]];
        doc.polyline(DrawPass::DashedContours, &line, &LineStyle::dashed(Rgb::WHITE, 1.0));
        doc.polygon(DrawPass::Water, &square, &FillStyle {
            fill: Rgb::new(130, 180, 255),
            edge: None,
            edge_width: 0.0,
        });
        doc.polyline(DrawPass::LandContours, &line, &LineStyle::solid(Rgb::WHITE, 1.0));
        let svg = doc.to_svg();
        let land = svg.find(r#"id="land-contours""#).unwrap();
        let water = svg.find(r#"id="water""#).unwrap();
        let dashed = svg.find(r#"id="dashed-contours""#).unwrap();
        assert!(land < water && water < dashed);
    }

    #[test]
    fn test_frame_fits_wide_map() {
        let frame = MapFrame::fit(FigureSize::default(), 400_000.0, 200_000.0);
        assert!((frame.width - 460.8).abs() < 1e-9);
        assert!((frame.height - 230.4).abs() < 1e-9);
        assert!((frame.left - 57.6).abs() < 1e-9);
        // Centered vertically in the axes.
        assert!((frame.top - (57.6 + 115.2)).abs() < 1e-9);
    }

    #[test]
    fn test_to_page_flips_y() {
        let frame = MapFrame::fit(FigureSize::default(), 100.0, 100.0);
        let (x, y) = frame.to_page(0.0, 0.0);
        assert!((x - frame.left).abs() < 1e-9);
        assert!((y - frame.bottom()).abs() < 1e-9);
        let (x, y) = frame.to_page(100.0, 100.0);
        assert!((x - frame.right()).abs() < 1e-9);
        assert!((y - frame.top).abs() < 1e-9);
    }

    #[test]
    fn test_passes_emitted_in_order() {
        let mut doc = MapDocument::new(FigureSize::default(), 100.0, 100.0);
        let line = [(0.0, 0.0), (100.0, 100.0)];
        doc.polyline(DrawPass::ScaleBar, &line, &LineStyle::solid(Rgb::BLACK, 1.0));
        doc.polyline(DrawPass::LandContours, &line, &LineStyle::solid(Rgb::WHITE, 1.0));
        doc.polyline(DrawPass::DashedContours, &line, &LineStyle::dashed(Rgb::WHITE, 1.0));
        let svg = doc.to_svg();
        let land = svg.find(r#"id="land-contours""#).unwrap();
        let dashed = svg.find(r#"id="dashed-contours""#).unwrap();
        let scale = svg.find(r#"id="scale-bar""#).unwrap();
        assert!(land < dashed && dashed < scale);
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_text_is_escaped() {
        let el = text_element((1.0, 1.0), "A<B & C", &TextStyle::new(10.0));
        assert!(el.contains("A&lt;B &amp; C"));
    }

    #[test]
    fn test_title_lines_above_frame() {
        let mut doc = MapDocument::new(FigureSize::default(), 100.0, 100.0);
        doc.title("Line one\n second line", 10.0);
        let svg = doc.to_svg();
        assert!(svg.contains(">Line one</text>"));
        assert!(svg.contains(">second line</text>"));
    }
}
