//! # PDF Serializer
//!
//! A from-scratch PDF 1.7 writer for the subset a printed menu needs: pages,
//! Type1 standard fonts in WinAnsi encoding, and image XObjects.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages tree
//! 3 0 obj ... endobj  <- fonts, images, content streams, pages (in order of use)
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! [`render::render_pdf`] drives this writer from a page plan;
//! [`canvas::PdfCanvas`] builds one page's content stream.

pub mod canvas;
pub mod render;

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};

pub use canvas::PdfCanvas;
pub use render::render_pdf;

/// Document information written to the Info dictionary and the Catalog.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    /// BCP 47 tag, written as the Catalog's /Lang.
    pub language: Option<String>,
}

struct PdfObject {
    data: Vec<u8>,
}

/// Accumulates objects while pages are drawn, then serializes.
pub struct PdfWriter {
    objects: Vec<PdfObject>,
    /// Font object per face, named /F0, /F1, ... in registration order.
    fonts: Vec<(StandardFont, usize)>,
    /// Image object per asset key, named /Im0, /Im1, ...
    images: HashMap<String, (usize, usize)>,
    pages: Vec<usize>,
    metadata: Metadata,
}

impl PdfWriter {
    pub fn new(metadata: Metadata) -> Self {
        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages.
        let objects = (0..3).map(|_| PdfObject { data: Vec::new() }).collect();
        Self {
            objects,
            fonts: Vec::new(),
            images: HashMap::new(),
            pages: Vec::new(),
            metadata,
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }

    /// Resource name for a font, registering it on first use.
    pub fn font_resource(&mut self, font: StandardFont) -> String {
        if let Some(i) = self.fonts.iter().position(|(f, _)| *f == font) {
            return format!("F{}", i);
        }
        let dict = format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            font.pdf_name()
        );
        let id = self.push(dict.into_bytes());
        self.fonts.push((font, id));
        format!("F{}", self.fonts.len() - 1)
    }

    /// Resource name for an image, embedding it on first use under `key`.
    pub fn image_resource(&mut self, key: &str, image: &LoadedImage) -> String {
        if let Some((index, _)) = self.images.get(key) {
            return format!("Im{}", index);
        }
        let id = self.write_image_xobject(image);
        let index = self.images.len();
        self.images.insert(key.to_string(), (index, id));
        format!("Im{}", index)
    }

    /// Write one image as one or two XObjects. Returns the main object id.
    fn write_image_xobject(&mut self, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space,
                    data.len()
                );
                obj.extend_from_slice(data);
                obj.extend_from_slice(b"\nendstream");
                self.push(obj)
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, 6);
                    let mut obj: Vec<u8> = Vec::new();
                    let _ = write!(
                        obj,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode \
                         /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed.len()
                    );
                    obj.extend_from_slice(&compressed);
                    obj.extend_from_slice(b"\nendstream");
                    self.push(obj)
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode \
                     /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                );
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                self.push(obj)
            }
        }
    }

    /// Append a page. `fonts` and `images` are the resource names its
    /// content stream uses.
    pub fn add_page(
        &mut self,
        width_pt: f64,
        height_pt: f64,
        content: &str,
        fonts: &[String],
        images: &[String],
    ) {
        let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
        let mut stream: Vec<u8> = Vec::new();
        let _ = write!(
            stream,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        stream.extend_from_slice(&compressed);
        stream.extend_from_slice(b"\nendstream");
        let content_id = self.push(stream);

        let font_dict = fonts
            .iter()
            .filter_map(|name| {
                let index: usize = name.strip_prefix('F')?.parse().ok()?;
                let (_, id) = self.fonts.get(index)?;
                Some(format!("/{} {} 0 R", name, id))
            })
            .collect::<Vec<_>>()
            .join(" ");
        let image_dict = images
            .iter()
            .filter_map(|name| {
                let index: usize = name.strip_prefix("Im")?.parse().ok()?;
                let (_, id) = self.images.values().find(|(i, _)| *i == index)?;
                Some(format!("/{} {} 0 R", name, id))
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut resources = format!("/Font << {} >>", font_dict);
        if !image_dict.is_empty() {
            let _ = write!(resources, " /XObject << {} >>", image_dict);
        }

        let page = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Contents {} 0 R /Resources << {} >> >>",
            width_pt, height_pt, content_id, resources
        );
        let page_id = self.push(page.into_bytes());
        self.pages.push(page_id);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the catalog, page tree and trailer and return the file bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let mut catalog = String::from("<< /Type /Catalog /Pages 2 0 R");
        if let Some(lang) = &self.metadata.language {
            let _ = write!(catalog, " /Lang ({})", escape_pdf_string(lang));
        }
        catalog.push_str(" >>");
        self.objects[1].data = catalog.into_bytes();

        let kids = self
            .pages
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.pages.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(title) = &self.metadata.title {
            let _ = write!(info, "/Title ({}) ", encode_text(title));
        }
        info.push_str("/Producer (Carta) /Creator (Carta) >>");
        let info_id = self.push(info.into_bytes());

        self.serialize(info_id)
    }

    fn serialize(&self, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; self.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in self.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", self.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.objects.len(),
            info_id,
            xref_offset
        );

        output
    }
}

/// Escape special characters in a PDF string literal.
pub(crate) fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode text for a WinAnsi string literal: ASCII stays as is, other
/// encodable characters become octal escapes, the rest fold to a base
/// letter or '?'.
pub(crate) fn encode_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let byte = unicode_to_winansi(ch)
            .or_else(|| crate::font::metrics::fold_to_ascii(ch).map(|c| c as u8))
            .unwrap_or(b'?');
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{:03o}", byte);
            }
        }
    }
    out
}

/// Map a Unicode codepoint to its WinAnsiEncoding (Windows-1252) byte.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // Ellipsis
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91), // Quotes
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}
