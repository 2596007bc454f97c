//! # Font Management
//!
//! Width metrics for everything the engine measures or draws.
//!
//! Two kinds of fonts exist. The twelve Latin faces built into every PDF
//! reader (Helvetica, Times, Courier in four styles each) need no data and
//! are what the PDF renderer always draws with. Custom TrueType/OpenType
//! fonts can be registered for measurement: the preview shapes them with
//! rustybuzz so a preview set in "Playfair Display" wraps the way a browser
//! would.
//!
//! Any family name that is not registered maps onto one of the built-in
//! families by a name heuristic (see [`StandardFamily::classify`]).

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::error::{CartaError, Result};
use crate::style::FontSpec;
use crate::text::shaping;

/// The three built-in font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFamily {
    /// Map an arbitrary family name onto a built-in family.
    ///
    /// Monospace-looking names go to Courier, serif-looking names to Times,
    /// everything else (including unknown names) to Helvetica.
    pub fn classify(family: &str) -> Self {
        let name = family.to_ascii_lowercase();
        const MONO: [&str; 5] = ["courier", "mono", "consol", "code", "typewriter"];
        const SERIF: [&str; 11] = [
            "times", "georgia", "garamond", "baskerville", "bodoni", "didot", "playfair",
            "merriweather", "lora", "cambria", "bookman",
        ];

        if MONO.iter().any(|m| name.contains(m)) {
            StandardFamily::Courier
        } else if name.contains("sans") {
            StandardFamily::Helvetica
        } else if name.contains("serif") || SERIF.iter().any(|s| name.contains(s)) {
            StandardFamily::Times
        } else {
            if !matches!(name.as_str(), "helvetica" | "arial") {
                log::debug!("font family '{}' mapped to Helvetica", family);
            }
            StandardFamily::Helvetica
        }
    }
}

/// The twelve built-in PDF faces the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    pub fn select(family: StandardFamily, bold: bool, italic: bool) -> Self {
        use StandardFamily as F;
        match (family, bold, italic) {
            (F::Helvetica, false, false) => Self::Helvetica,
            (F::Helvetica, true, false) => Self::HelveticaBold,
            (F::Helvetica, false, true) => Self::HelveticaOblique,
            (F::Helvetica, true, true) => Self::HelveticaBoldOblique,
            (F::Times, false, false) => Self::TimesRoman,
            (F::Times, true, false) => Self::TimesBold,
            (F::Times, false, true) => Self::TimesItalic,
            (F::Times, true, true) => Self::TimesBoldItalic,
            (F::Courier, false, false) => Self::Courier,
            (F::Courier, true, false) => Self::CourierBold,
            (F::Courier, false, true) => Self::CourierOblique,
            (F::Courier, true, true) => Self::CourierBoldOblique,
        }
    }

    /// The built-in face a font spec maps to.
    pub fn for_spec(spec: &FontSpec) -> Self {
        Self::select(StandardFamily::classify(&spec.family), spec.bold, spec.italic)
    }

    /// The PDF BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => StandardFontMetrics::helvetica(false),
            Self::HelveticaBold | Self::HelveticaBoldOblique => {
                StandardFontMetrics::helvetica(true)
            }
            Self::TimesRoman | Self::TimesItalic => StandardFontMetrics::times(false),
            Self::TimesBold | Self::TimesBoldItalic => StandardFontMetrics::times(true),
            _ => StandardFontMetrics::courier(),
        }
    }

    /// Ascent above the baseline, in 1/1000 em.
    pub fn ascent(&self) -> f64 {
        match self {
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => 683.0,
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => 629.0,
            _ => 718.0,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.trim().to_ascii_lowercase(),
            weight,
            italic,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl CustomFontMetrics {
    /// Advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin, Greek, Cyrillic and general punctuation cover menu text.
        for code in (0x20u32..=0x052F).chain(0x2000..=0x20CF) {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CustomFont {
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

/// What a font lookup resolved to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedFont<'a> {
    Standard(StandardFont),
    Custom(&'a CustomFont),
}

/// Registered custom fonts, keyed by family + weight + style.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: HashMap<FontKey, CustomFont>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a font. Unregistered families resolve to a built-in face.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> ResolvedFont<'_> {
        if let Some(font) = self.fonts.get(&FontKey::new(family, weight, italic)) {
            return ResolvedFont::Custom(font);
        }

        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        if let Some(font) = self.fonts.get(&FontKey::new(family, snapped_weight, italic)) {
            return ResolvedFont::Custom(font);
        }

        ResolvedFont::Standard(StandardFont::select(
            StandardFamily::classify(family),
            snapped_weight == 700,
            italic,
        ))
    }

    /// Register a custom font. Fails when the data is not a parseable font.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) -> Result<()> {
        let metrics = CustomFontMetrics::from_font_data(&data)
            .ok_or_else(|| CartaError::Font(format!("'{}' is not a valid TrueType/OpenType font", family)))?;
        log::debug!(
            "registered font '{}' weight {} italic {} ({} glyphs mapped)",
            family,
            weight,
            italic,
            metrics.advance_widths.len()
        );
        self.fonts
            .insert(FontKey::new(family, weight, italic), CustomFont { data, metrics });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Text measurement with real glyph metrics, shared by the preview and the
/// render-based measurer.
#[derive(Debug, Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            ResolvedFont::Standard(std_font) => std_font.metrics().char_width(ch, font.size_pt),
            ResolvedFont::Custom(custom) => custom.metrics.char_width(ch, font.size_pt),
        }
    }

    /// Width of a string in points.
    ///
    /// Custom fonts are shaped so kerning and ligatures count; built-in fonts
    /// sum their AFM advances.
    pub fn measure_string(&self, text: &str, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            ResolvedFont::Standard(std_font) => {
                std_font.metrics().measure_string(text, font.size_pt, 0.0)
            }
            ResolvedFont::Custom(custom) => {
                match shaping::shape_text(text, &custom.data) {
                    Some(glyphs) => {
                        shaping::shaped_width(&glyphs, custom.metrics.units_per_em, font.size_pt)
                    }
                    None => text
                        .chars()
                        .map(|ch| custom.metrics.char_width(ch, font.size_pt))
                        .sum(),
                }
            }
        }
    }

    pub fn resolve(&self, font: &FontSpec) -> ResolvedFont<'_> {
        self.registry.resolve(&font.family, font.weight(), font.italic)
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
