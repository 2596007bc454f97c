//! # Asset Loading and Decoding
//!
//! Feature icons, allergen icons and the cover logo arrive as URLs. An
//! [`AssetResolver`] turns a URL into bytes; this module turns bytes into
//! something the PDF writer can embed:
//!
//! - JPEG passes through untouched (DCTDecode).
//! - PNG decodes to RGB plus an optional alpha channel (SMask).
//! - SVG rasterizes through resvg to the same RGB + alpha form.
//!
//! Nothing here aborts a render. [`AssetCache`] logs a failed load once and
//! reports it as missing, and callers draw a placeholder box instead.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{CartaError, Result};

/// Longest side, in pixels, an SVG icon is rasterized to.
pub const SVG_RASTER_PX: u32 = 256;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes
        rgb: Vec<u8>,
        /// width * height bytes. None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Turns an asset URL into raw bytes.
pub trait AssetResolver {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Resolves data URIs, inline assets supplied with the document, and local
/// file paths. Remote URLs are not fetched.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    assets: HashMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inline asset data keyed by URL (data URIs or raw base64).
    pub fn with_assets(mut self, assets: HashMap<String, String>) -> Self {
        self.assets = assets;
        self
    }

    /// Directory relative file paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}

impl AssetResolver for DefaultResolver {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url.trim();
        if let Some(inline) = self.assets.get(url) {
            return decode_inline(inline);
        }
        if url.starts_with("data:") {
            return decode_inline(url);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(CartaError::Asset(format!(
                "remote asset '{}' was not supplied inline",
                url
            )));
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        let path = match &self.base_dir {
            Some(base) if !path.starts_with('/') => base.join(path),
            _ => PathBuf::from(path),
        };
        std::fs::read(&path)
            .map_err(|e| CartaError::Asset(format!("failed to read '{}': {}", path.display(), e)))
    }
}

/// Decode a data URI or raw base64 string.
pub(crate) fn decode_inline(src: &str) -> Result<Vec<u8>> {
    let Some(rest) = src.strip_prefix("data:") else {
        return base64_decode(src);
    };
    let comma = rest
        .find(',')
        .ok_or_else(|| CartaError::Asset("invalid data URI: missing comma".to_string()))?;
    let (header, payload) = (&rest[..comma], &rest[comma + 1..]);
    if header.ends_with(";base64") {
        base64_decode(payload)
    } else {
        // Plain data URIs are how SVG icons usually travel.
        Ok(payload.as_bytes().to_vec())
    }
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| CartaError::Asset(format!("base64 decode error: {}", e)))
}

/// Fetch and decode an image.
pub fn load_image(resolver: &dyn AssetResolver, url: &str) -> Result<LoadedImage> {
    let bytes = resolver.fetch(url)?;
    decode_image_bytes(&bytes)
}

/// Detect the format from the leading bytes and decode.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage> {
    if data.len() < 4 {
        return Err(CartaError::Asset("image data too short".to_string()));
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else if is_svg(data) {
        rasterize_svg(data, SVG_RASTER_PX)
    } else {
        Err(CartaError::Asset(
            "unsupported image format (expected JPEG, PNG or SVG)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47]
}

fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CartaError::Asset(format!("JPEG format detection error: {}", e)))?
        .into_dimensions()
        .map_err(|e| CartaError::Asset(format!("failed to read JPEG dimensions: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Walk the JPEG markers to the SOF segment and read its component count.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    JpegColorSpace::DeviceRGB
}

fn decode_png(data: &[u8]) -> Result<LoadedImage> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CartaError::Asset(format!("PNG format detection error: {}", e)))?
        .decode()
        .map_err(|e| CartaError::Asset(format!("failed to decode PNG: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Ok(split_rgba(
        rgba.pixels().map(|p| [p[0], p[1], p[2], p[3]]),
        width,
        height,
    ))
}

/// Rasterize an SVG so its longest side is `max_side_px`.
pub fn rasterize_svg(data: &[u8], max_side_px: u32) -> Result<LoadedImage> {
    use resvg::{tiny_skia, usvg};

    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| CartaError::Asset(format!("failed to parse SVG: {}", e)))?;

    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !(w > 0.0 && h > 0.0) {
        return Err(CartaError::Asset("SVG has no size".to_string()));
    }
    let scale = max_side_px as f32 / w.max(h);
    let width = ((w * scale).round() as u32).max(1);
    let height = ((h * scale).round() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CartaError::Asset("failed to allocate SVG raster".to_string()))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    Ok(split_rgba(
        pixmap.pixels().iter().map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        }),
        width,
        height,
    ))
}

fn split_rgba(pixels: impl Iterator<Item = [u8; 4]>, width: u32, height: u32) -> LoadedImage {
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for [r, g, b, a] in pixels {
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
        has_transparency |= a != 255;
    }

    LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    }
}

/// Loads each URL at most once per render and remembers failures.
pub struct AssetCache<'a> {
    resolver: &'a dyn AssetResolver,
    loaded: RefCell<HashMap<String, Option<Rc<LoadedImage>>>>,
}

impl<'a> AssetCache<'a> {
    pub fn new(resolver: &'a dyn AssetResolver) -> Self {
        Self {
            resolver,
            loaded: RefCell::new(HashMap::new()),
        }
    }

    /// The decoded image, or `None` when it could not be loaded.
    pub fn get(&self, url: &str) -> Option<Rc<LoadedImage>> {
        if let Some(hit) = self.loaded.borrow().get(url) {
            return hit.clone();
        }
        let image = match load_image(self.resolver, url) {
            Ok(image) => Some(Rc::new(image)),
            Err(e) => {
                log::warn!("asset '{}' unavailable, drawing placeholder: {}", url, e);
                None
            }
        };
        self.loaded
            .borrow_mut()
            .insert(url.to_string(), image.clone());
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"><rect width="10" height="20" fill="#ff0000"/></svg>"##;

    #[test]
    fn test_relative_paths_use_base_dir() {
        let dir = std::env::temp_dir().join(format!("carta-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("leaf.svg"), SQUARE_SVG).unwrap();

        let resolver = DefaultResolver::new().with_base_dir(&dir);
        assert_eq!(resolver.fetch("leaf.svg").unwrap(), SQUARE_SVG.as_bytes());
        assert!(DefaultResolver::new().fetch("leaf.svg").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(is_svg(SQUARE_SVG.as_bytes()));
        assert!(is_svg(b"<?xml version=\"1.0\"?>\n<svg></svg>"));
        assert!(!is_svg(b"GIF89a"));
    }

    #[test]
    fn test_unsupported_and_short_data() {
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]).is_err());
    }

    #[test]
    fn test_decode_png_opaque_and_alpha() {
        let loaded = decode_image_bytes(&png_bytes([255, 0, 0, 255])).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, &[255, 0, 0]);
                assert!(alpha.is_none());
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }

        let loaded = decode_image_bytes(&png_bytes([255, 0, 0, 128])).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => assert_eq!(alpha.as_deref(), Some(&[128][..])),
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_decode_jpeg_passthrough() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert!(data.starts_with(&[0xFF, 0xD8]));
                assert_eq!(*color_space, JpegColorSpace::DeviceRGB);
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_svg_rasterizes_to_longest_side() {
        let loaded = rasterize_svg(SQUARE_SVG.as_bytes(), 64).unwrap();
        assert_eq!(loaded.height_px, 64);
        assert_eq!(loaded.width_px, 32);
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, .. } => {
                assert_eq!(rgb.len(), 32 * 64 * 3);
                assert_eq!(&rgb[..3], &[255, 0, 0]);
            }
            _ => panic!("SVG should rasterize to Decoded"),
        }
    }

    #[test]
    fn test_resolver_data_uris_and_inline_assets() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes([0, 255, 0, 255]));
        let mut assets = HashMap::new();
        assets.insert("https://cdn.example.com/vegan.png".to_string(), b64.clone());
        let resolver = DefaultResolver::new().with_assets(assets);

        let loaded = load_image(&resolver, "https://cdn.example.com/vegan.png").unwrap();
        assert_eq!(loaded.width_px, 1);

        let uri = format!("data:image/png;base64,{}", b64);
        assert!(load_image(&resolver, &uri).is_ok());

        let svg_uri = format!("data:image/svg+xml,{}", SQUARE_SVG);
        assert!(load_image(&resolver, &svg_uri).is_ok());
    }

    #[test]
    fn test_resolver_failures_are_asset_errors() {
        let resolver = DefaultResolver::new();
        assert!(matches!(
            resolver.fetch("https://cdn.example.com/missing.svg"),
            Err(CartaError::Asset(_))
        ));
        assert!(matches!(
            resolver.fetch("/definitely/not/here.png"),
            Err(CartaError::Asset(_))
        ));
        assert!(resolver.fetch("data:image/png;base64").is_err());
    }

    #[test]
    fn test_cache_remembers_failures() {
        let resolver = DefaultResolver::new();
        let cache = AssetCache::new(&resolver);
        assert!(cache.get("https://cdn.example.com/a.png").is_none());
        assert!(cache.get("https://cdn.example.com/a.png").is_none());
        assert_eq!(cache.loaded.borrow().len(), 1);
    }
}
