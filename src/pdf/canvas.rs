//! One page's content stream.
//!
//! Callers work in a top-left origin, points. The canvas flips to PDF's
//! bottom-left origin when it writes operators.

use std::fmt::Write;

use crate::font::StandardFont;
use crate::image_loader::LoadedImage;
use crate::style::{Color, FontSpec};
use crate::text::{BuiltinFonts, TextMeasurer};

use super::{encode_text, PdfWriter};

const PLACEHOLDER_GREY: f64 = 0.9;

pub struct PdfCanvas<'w> {
    writer: &'w mut PdfWriter,
    width_pt: f64,
    height_pt: f64,
    stream: String,
    fonts: Vec<String>,
    images: Vec<String>,
}

impl<'w> PdfCanvas<'w> {
    pub fn new(writer: &'w mut PdfWriter, width_pt: f64, height_pt: f64) -> Self {
        Self {
            writer,
            width_pt,
            height_pt,
            stream: String::new(),
            fonts: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Width of `text` as this canvas will draw it, in points.
    pub fn text_width(text: &str, font: &FontSpec) -> f64 {
        BuiltinFonts.text_width(text, font)
    }

    /// Draw one line of text whose line box starts at `top` and is
    /// `line_height` tall. The baseline sits half-leading plus ascent below
    /// the top of the box.
    pub fn draw_text(
        &mut self,
        x: f64,
        top: f64,
        line_height: f64,
        text: &str,
        font: &FontSpec,
        color: Color,
    ) {
        if text.trim().is_empty() {
            return;
        }
        let face = StandardFont::for_spec(font);
        let resource = self.writer.font_resource(face);
        if !self.fonts.contains(&resource) {
            self.fonts.push(resource.clone());
        }

        let size = font.size_pt;
        let baseline = top + (line_height - size) / 2.0 + face.ascent() / 1000.0 * size;
        let _ = write!(
            self.stream,
            "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.2} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            color.r,
            color.g,
            color.b,
            resource,
            size,
            x,
            self.height_pt - baseline,
            encode_text(text)
        );
    }

    /// Draw an image scaled into the box at (`x`, `top`).
    pub fn draw_image(&mut self, key: &str, image: &LoadedImage, x: f64, top: f64, w: f64, h: f64) {
        let resource = self.writer.image_resource(key, image);
        if !self.images.contains(&resource) {
            self.images.push(resource.clone());
        }
        let _ = write!(
            self.stream,
            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
            w,
            h,
            x,
            self.height_pt - top - h,
            resource
        );
    }

    /// Grey box where an image could not be loaded.
    pub fn draw_placeholder(&mut self, x: f64, top: f64, w: f64, h: f64) {
        let _ = write!(
            self.stream,
            "q\n{g:.2} {g:.2} {g:.2} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            x,
            self.height_pt - top - h,
            w,
            h,
            g = PLACEHOLDER_GREY
        );
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Emit the page.
    pub fn finish(self) {
        self.writer.add_page(
            self.width_pt,
            self.height_pt,
            &self.stream,
            &self.fonts,
            &self.images,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Metadata;

    #[test]
    fn text_is_flipped_to_bottom_left_origin() {
        let mut writer = PdfWriter::new(Metadata::default());
        let mut canvas = PdfCanvas::new(&mut writer, 200.0, 300.0);
        let font = FontSpec::new("Helvetica", 10.0);
        canvas.draw_text(10.0, 0.0, 10.0, "Pane", &font, Color::BLACK);
        // baseline = 0 + 0 + 0.718 * 10 = 7.18 below the top
        assert!(canvas.stream.contains("10.00 292.82 Td"));
        assert!(canvas.stream.contains("(Pane) Tj"));
        assert_eq!(canvas.fonts, vec!["F0".to_string()]);
    }

    #[test]
    fn blank_text_draws_nothing() {
        let mut writer = PdfWriter::new(Metadata::default());
        let mut canvas = PdfCanvas::new(&mut writer, 200.0, 300.0);
        canvas.draw_text(0.0, 0.0, 12.0, "  ", &FontSpec::new("Helvetica", 10.0), Color::BLACK);
        assert!(canvas.is_empty());
        assert!(canvas.fonts.is_empty());
    }

    #[test]
    fn placeholder_is_a_filled_rect() {
        let mut writer = PdfWriter::new(Metadata::default());
        let mut canvas = PdfCanvas::new(&mut writer, 200.0, 300.0);
        canvas.draw_placeholder(5.0, 10.0, 20.0, 20.0);
        assert!(canvas.stream.contains("5.00 270.00 20.00 20.00 re"));
        canvas.finish();
        assert_eq!(writer.page_count(), 1);
    }

    #[test]
    fn text_width_uses_builtin_metrics() {
        let font = FontSpec::new("Helvetica", 10.0);
        // 'W' is 944/1000 em in Helvetica.
        assert!((PdfCanvas::text_width("W", &font) - 9.44).abs() < 1e-9);
    }
}
