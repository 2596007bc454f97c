//! # Element Styles
//!
//! The visual vocabulary of a menu is small: every printable element (a
//! category title, a product description, a price, ...) is described by the
//! same record of font, color, alignment, margin box and visibility.
//!
//! Styles come in two shapes. [`Style`] is the partial record as it arrives in
//! the layout document, where every field is optional. [`ElementStyle`] is the
//! resolved record the rest of the engine works with: no `Option`, no
//! "inherit", every value concrete. Resolution always happens against an
//! explicit default record, so a missing field can never reach the measurer or
//! the renderer.

use serde::{Deserialize, Deserializer, Serialize};

/// Edge values (top, right, bottom, left) in millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn vertical_only(top: f64, bottom: f64) -> Self {
        Self {
            top,
            right: 0.0,
            bottom,
            left: 0.0,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Edge values where each side may be omitted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PartialEdges {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl PartialEdges {
    /// Fill missing sides from `fallback`. Negative values clamp to zero.
    pub fn resolve(&self, fallback: Edges) -> Edges {
        Edges {
            top: non_negative(self.top.unwrap_or(fallback.top)),
            right: non_negative(self.right.unwrap_or(fallback.right)),
            bottom: non_negative(self.bottom.unwrap_or(fallback.bottom)),
            left: non_negative(self.left.unwrap_or(fallback.left)),
        }
    }
}

pub(crate) fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// An RGBA color. Deserializes from `"#rrggbb"`, `"#rgb"` or `{ r, g, b, a }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;
        match hex.len() {
            3 if hex.is_ascii() => Self::rgb(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 if hex.is_ascii() => {
                Self::rgb(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]))
            }
            _ => Color::BLACK,
        }
    }

    /// CSS-style `#rrggbb` string, used by the preview scene.
    pub fn to_hex(&self) -> String {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.r), c(self.g), c(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorInput {
            Hex(String),
            Rgba {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "opaque")]
                a: f64,
            },
        }

        fn opaque() -> f64 {
            1.0
        }

        Ok(match ColorInput::deserialize(deserializer)? {
            ColorInput::Hex(s) => Color::hex(&s),
            ColorInput::Rgba { r, g, b, a } => Color { r, g, b, a },
        })
    }
}

/// A concrete font selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub size_pt: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: &str, size_pt: f64) -> Self {
        Self {
            family: family.to_string(),
            size_pt,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// CSS-style numeric weight.
    pub fn weight(&self) -> u32 {
        if self.bold {
            700
        } else {
            400
        }
    }
}

/// A partial element style as written in the layout document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub visible: Option<bool>,
    pub font_family: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
    pub align: Option<TextAlign>,
    /// Margin box in millimeters.
    pub margin: Option<PartialEdges>,
    /// Line height as a multiplier of font size.
    pub line_height: Option<f64>,
}

/// A fully resolved element style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub visible: bool,
    pub font: FontSpec,
    pub color: Color,
    pub align: TextAlign,
    pub margin: Edges,
    pub line_height: f64,
}

impl ElementStyle {
    pub fn new(font: FontSpec) -> Self {
        Self {
            visible: true,
            font,
            color: Color::BLACK,
            align: TextAlign::Left,
            margin: Edges::default(),
            line_height: 1.2,
        }
    }

    pub fn with_margin(mut self, margin: Edges) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// Height of one line of text in points.
    pub fn line_height_pt(&self) -> f64 {
        self.font.size_pt * self.line_height
    }

    /// Height of one line of text in millimeters.
    pub fn line_height_mm(&self) -> f64 {
        crate::units::pt_to_mm(self.line_height_pt())
    }
}

impl Style {
    /// Resolve this partial style against a default record.
    pub fn resolve(&self, defaults: &ElementStyle) -> ElementStyle {
        let size = self
            .font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(defaults.font.size_pt);
        let family = self
            .font_family
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| defaults.font.family.clone());

        ElementStyle {
            visible: self.visible.unwrap_or(defaults.visible),
            font: FontSpec {
                family,
                size_pt: size,
                bold: self.bold.unwrap_or(defaults.font.bold),
                italic: self.italic.unwrap_or(defaults.font.italic),
            },
            color: self.color.unwrap_or(defaults.color),
            align: self.align.unwrap_or(defaults.align),
            margin: self
                .margin
                .map(|m| m.resolve(defaults.margin))
                .unwrap_or(defaults.margin),
            line_height: self
                .line_height
                .filter(|l| l.is_finite() && *l > 0.0)
                .unwrap_or(defaults.line_height),
        }
    }
}
