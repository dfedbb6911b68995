//! Writing map documents to PDF, JPEG and PNG files.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::svg::{MapDocument, POINTS_PER_INCH};

/// JPEG quality used for map images.
pub const JPEG_QUALITY: u8 = 90;

/// Parse an SVG string with the system fonts available for text.
pub fn parse_svg(svg: &str) -> RenderResult<usvg::Tree> {
    let mut options = usvg::Options::default();
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    options.fontdb = Arc::new(fontdb);
    usvg::Tree::from_str(svg, &options).map_err(|e| RenderError::Svg(e.to_string()))
}

/// A parsed map page ready to be written in any output format.
pub struct MapOutput {
    tree: usvg::Tree,
}

impl MapOutput {
    pub fn from_document(document: &MapDocument) -> RenderResult<Self> {
        let start = Instant::now();
        let tree = parse_svg(&document.to_svg())?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Parsed map document");
        Ok(Self { tree })
    }

    /// Page size in points.
    pub fn page_size(&self) -> (f64, f64) {
        let size = self.tree.size();
        (size.width() as f64, size.height() as f64)
    }

    /// Rasterize onto a white background, `scale` pixels per point.
    pub fn rasterize(&self, scale: f64) -> RenderResult<RgbImage> {
        let (w_pt, h_pt) = self.page_size();
        let width = (w_pt * scale).round().max(1.0) as u32;
        let height = (h_pt * scale).round().max(1.0) as u32;
        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(
            &self.tree,
            tiny_skia::Transform::from_scale(scale as f32, scale as f32),
            &mut pixmap.as_mut(),
        );

        let mut image = RgbImage::new(width, height);
        for (pixel, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *pixel = image::Rgb([c.red(), c.green(), c.blue()]);
        }
        Ok(image)
    }

    /// Vector PDF with one point per SVG unit.
    pub fn save_pdf(&self, path: &Path) -> RenderResult<()> {
        let start = Instant::now();
        let pdf = svg2pdf::to_pdf(
            &self.tree,
            svg2pdf::ConversionOptions::default(),
            svg2pdf::PageOptions::default(),
        );
        std::fs::write(path, pdf)?;
        debug!(
            path = %path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Wrote PDF"
        );
        Ok(())
    }

    /// JPEG at the given resolution.
    pub fn save_jpeg(&self, path: &Path, dpi: f64) -> RenderResult<()> {
        let start = Instant::now();
        let image = self.rasterize(dpi / POINTS_PER_INCH)?;
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        encoder.encode_image(&image)?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Wrote JPEG"
        );
        Ok(())
    }

    /// PNG scaled so the page is `width_px` pixels wide.
    pub fn save_thumbnail(&self, path: &Path, width_px: u32) -> RenderResult<()> {
        let (w_pt, _) = self.page_size();
        let image = self.rasterize(width_px as f64 / w_pt)?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Wrote thumbnail"
        );
        Ok(())
    }
}
