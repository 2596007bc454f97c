//! # Layout Configuration
//!
//! Turns a partial, JSON-shaped layout description into a [`LayoutConfig`]
//! where every value is concrete.
//!
//! Two rules matter downstream:
//!
//! 1. Missing fields are never an error. They resolve from [`defaults`].
//! 2. Margin toggles are applied here, not at use time. When the document
//!    disables distinct odd/even margins, both content classes receive the
//!    general margin set; the same goes for cover and allergen pages. After
//!    resolution there is exactly one margin set per [`PageClass`], and no
//!    consumer ever looks at a toggle again.

pub mod defaults;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::style::{non_negative, Edges, ElementStyle, PartialEdges, Style};

/// The four page classes. Each has its own margins and height budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageClass {
    Cover,
    ContentOdd,
    ContentEven,
    Allergen,
}

impl PageClass {
    pub fn is_content(&self) -> bool {
        matches!(self, PageClass::ContentOdd | PageClass::ContentEven)
    }
}

// ── Raw (partial) configuration ─────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLayoutConfig {
    pub page: Option<RawPageSize>,
    pub margins: Option<RawMargins>,
    pub columns: Option<RawColumns>,
    pub block_spacing_mm: Option<f64>,

    pub category_title: Option<Style>,
    pub product_title: Option<Style>,
    pub product_description: Option<Style>,
    pub product_description_secondary: Option<Style>,
    pub allergen_list: Option<Style>,
    pub price: Option<Style>,
    pub price_suffix: Option<Style>,
    pub price_variant: Option<Style>,
    pub service_line: Option<Style>,
    pub cover_title: Option<Style>,
    pub cover_subtitle: Option<Style>,
    pub note_title: Option<Style>,
    pub note_text: Option<Style>,
    pub label: Option<Style>,
    pub allergen_legend_title: Option<Style>,
    pub allergen_legend_entry: Option<Style>,

    pub feature_icon: Option<RawFeatureIcon>,
    pub cover_logo: Option<RawCoverLogo>,
    pub cover: Option<RawToggle>,
    pub allergen_pages: Option<RawToggle>,
    pub service_line_placement: Option<RawServiceLinePlacement>,
    pub price_format: Option<RawPriceFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageSize {
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMargins {
    /// The content margin set. Also the fallback for every other class.
    pub general: Option<PartialEdges>,
    pub odd: Option<PartialEdges>,
    pub even: Option<PartialEdges>,
    pub cover: Option<PartialEdges>,
    pub allergen: Option<PartialEdges>,
    pub distinct_odd_even: Option<bool>,
    pub distinct_cover: Option<bool>,
    pub distinct_allergen: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawColumns {
    pub content_fraction: Option<f64>,
    pub price_fraction: Option<f64>,
    pub gap_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeatureIcon {
    pub visible: Option<bool>,
    pub size_mm: Option<f64>,
    pub spacing_mm: Option<f64>,
    pub margin_top_mm: Option<f64>,
    pub margin_bottom_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoverLogo {
    pub visible: Option<bool>,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub margin: Option<PartialEdges>,
    pub align: Option<crate::style::TextAlign>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawToggle {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServiceLinePlacement {
    pub placement: Option<ServiceLinePlacement>,
    pub reserve_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceFormat {
    pub currency_symbol: Option<String>,
    pub decimals: Option<u32>,
    pub decimal_separator: Option<String>,
    pub symbol_before: Option<bool>,
}

// ── Resolved configuration ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

/// One authoritative margin set per page class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginSets {
    pub cover: Edges,
    pub content_odd: Edges,
    pub content_even: Edges,
    pub allergen: Edges,
}

impl MarginSets {
    pub fn for_class(&self, class: PageClass) -> Edges {
        match class {
            PageClass::Cover => self.cover,
            PageClass::ContentOdd => self.content_odd,
            PageClass::ContentEven => self.content_even,
            PageClass::Allergen => self.allergen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    pub content_fraction: f64,
    pub price_fraction: f64,
    pub gap_mm: f64,
}

/// Every visual element's resolved style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Elements {
    pub category_title: ElementStyle,
    pub product_title: ElementStyle,
    pub product_description: ElementStyle,
    pub product_description_secondary: ElementStyle,
    pub allergen_list: ElementStyle,
    pub price: ElementStyle,
    pub price_suffix: ElementStyle,
    pub price_variant: ElementStyle,
    pub service_line: ElementStyle,
    pub cover_title: ElementStyle,
    pub cover_subtitle: ElementStyle,
    pub note_title: ElementStyle,
    pub note_text: ElementStyle,
    pub label: ElementStyle,
    pub allergen_legend_title: ElementStyle,
    pub allergen_legend_entry: ElementStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureIconStyle {
    pub visible: bool,
    pub size_mm: f64,
    pub spacing_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
}

impl FeatureIconStyle {
    /// Height of one icon row including its vertical margins.
    pub fn row_height_mm(&self) -> f64 {
        self.margin_top_mm + self.size_mm + self.margin_bottom_mm
    }

    /// How many icons fit side by side in `width_mm`. Always at least one.
    pub fn per_row(&self, width_mm: f64) -> usize {
        let step = self.size_mm + self.spacing_mm;
        if step <= 0.0 {
            return usize::MAX;
        }
        (((width_mm + self.spacing_mm) / step).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoStyle {
    pub visible: bool,
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin: Edges,
    pub align: crate::style::TextAlign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLinePlacement {
    /// A single ServiceLine block in the content flow.
    #[default]
    Inline,
    /// A reserved strip at the bottom of every content page.
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineConfig {
    pub placement: ServiceLinePlacement,
    pub reserve_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFormat {
    pub currency_symbol: String,
    pub decimals: u32,
    pub decimal_separator: String,
    pub symbol_before: bool,
}

impl PriceFormat {
    /// Format an amount, e.g. `€ 12,50` or `12.50 $`.
    pub fn format(&self, amount: f64) -> String {
        let amount = if amount.is_finite() { amount } else { 0.0 };
        let digits = format!("{:.*}", self.decimals as usize, amount);
        let digits = if self.decimal_separator != "." {
            digits.replacen('.', &self.decimal_separator, 1)
        } else {
            digits
        };
        if self.currency_symbol.is_empty() {
            digits
        } else if self.symbol_before {
            format!("{} {}", self.currency_symbol, digits)
        } else {
            format!("{} {}", digits, self.currency_symbol)
        }
    }
}

/// The fully resolved layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page: PageSize,
    pub margins: MarginSets,
    pub columns: Columns,
    pub block_spacing_mm: f64,
    pub elements: Elements,
    pub feature_icon: FeatureIconStyle,
    pub cover_logo: LogoStyle,
    pub cover_enabled: bool,
    pub allergen_pages_enabled: bool,
    pub service_line: ServiceLineConfig,
    pub price_format: PriceFormat,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig::resolve(&RawLayoutConfig::default())
    }
}

fn positive_or(v: Option<f64>, fallback: f64) -> f64 {
    v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

fn element(raw: &Option<Style>, default: fn() -> ElementStyle) -> ElementStyle {
    let defaults = default();
    match raw {
        Some(style) => style.resolve(&defaults),
        None => defaults,
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) layout document and resolve it.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawLayoutConfig = serde_json::from_str(json)?;
        Ok(Self::resolve(&raw))
    }

    /// Resolve a partial configuration. Never fails.
    pub fn resolve(raw: &RawLayoutConfig) -> Self {
        let page = raw.page.clone().unwrap_or_default();
        let page = PageSize {
            width_mm: positive_or(page.width_mm, defaults::PAGE_WIDTH_MM),
            height_mm: positive_or(page.height_mm, defaults::PAGE_HEIGHT_MM),
        };

        let margins = Self::resolve_margins(&raw.margins.clone().unwrap_or_default());
        let columns = Self::resolve_columns(&raw.columns.clone().unwrap_or_default());

        let elements = Elements {
            category_title: element(&raw.category_title, defaults::category_title),
            product_title: element(&raw.product_title, defaults::product_title),
            product_description: element(&raw.product_description, defaults::product_description),
            product_description_secondary: element(
                &raw.product_description_secondary,
                defaults::product_description_secondary,
            ),
            allergen_list: element(&raw.allergen_list, defaults::allergen_list),
            price: element(&raw.price, defaults::price),
            price_suffix: element(&raw.price_suffix, defaults::price_suffix),
            price_variant: element(&raw.price_variant, defaults::price_variant),
            service_line: element(&raw.service_line, defaults::service_line),
            cover_title: element(&raw.cover_title, defaults::cover_title),
            cover_subtitle: element(&raw.cover_subtitle, defaults::cover_subtitle),
            note_title: element(&raw.note_title, defaults::note_title),
            note_text: element(&raw.note_text, defaults::note_text),
            label: element(&raw.label, defaults::label),
            allergen_legend_title: element(
                &raw.allergen_legend_title,
                defaults::allergen_legend_title,
            ),
            allergen_legend_entry: element(
                &raw.allergen_legend_entry,
                defaults::allergen_legend_entry,
            ),
        };

        let icon = raw.feature_icon.clone().unwrap_or_default();
        let feature_icon = FeatureIconStyle {
            visible: icon.visible.unwrap_or(true),
            size_mm: positive_or(icon.size_mm, defaults::ICON_SIZE_MM),
            spacing_mm: non_negative(icon.spacing_mm.unwrap_or(defaults::ICON_SPACING_MM)),
            margin_top_mm: non_negative(icon.margin_top_mm.unwrap_or(defaults::ICON_MARGIN_TOP_MM)),
            margin_bottom_mm: non_negative(
                icon.margin_bottom_mm.unwrap_or(defaults::ICON_MARGIN_BOTTOM_MM),
            ),
        };

        let logo = raw.cover_logo.clone().unwrap_or_default();
        let cover_logo = LogoStyle {
            visible: logo.visible.unwrap_or(true),
            width_mm: positive_or(logo.width_mm, defaults::LOGO_WIDTH_MM),
            height_mm: positive_or(logo.height_mm, defaults::LOGO_HEIGHT_MM),
            margin: logo
                .margin
                .map(|m| m.resolve(Edges::vertical_only(20.0, 10.0)))
                .unwrap_or(Edges::vertical_only(20.0, 10.0)),
            align: logo.align.unwrap_or(crate::style::TextAlign::Center),
        };

        let service = raw.service_line_placement.clone().unwrap_or_default();
        let service_line = ServiceLineConfig {
            placement: service.placement.unwrap_or_default(),
            reserve_mm: non_negative(service.reserve_mm.unwrap_or(defaults::SERVICE_LINE_RESERVE_MM)),
        };

        let price = raw.price_format.clone().unwrap_or_default();
        let price_format = PriceFormat {
            currency_symbol: price
                .currency_symbol
                .unwrap_or_else(|| defaults::CURRENCY_SYMBOL.to_string()),
            decimals: price.decimals.unwrap_or(defaults::PRICE_DECIMALS).min(4),
            decimal_separator: price
                .decimal_separator
                .unwrap_or_else(|| defaults::DECIMAL_SEPARATOR.to_string()),
            symbol_before: price.symbol_before.unwrap_or(true),
        };

        LayoutConfig {
            page,
            margins,
            columns,
            block_spacing_mm: non_negative(
                raw.block_spacing_mm.unwrap_or(defaults::BLOCK_SPACING_MM),
            ),
            elements,
            feature_icon,
            cover_logo,
            cover_enabled: raw.cover.as_ref().and_then(|t| t.enabled).unwrap_or(true),
            allergen_pages_enabled: raw
                .allergen_pages
                .as_ref()
                .and_then(|t| t.enabled)
                .unwrap_or(true),
            service_line,
            price_format,
        }
    }

    fn resolve_margins(raw: &RawMargins) -> MarginSets {
        let general = raw
            .general
            .map(|m| m.resolve(Edges::uniform(defaults::PAGE_MARGIN_MM)))
            .unwrap_or(Edges::uniform(defaults::PAGE_MARGIN_MM));

        // A class-specific set only counts when its toggle is on; partial sets
        // fill their gaps from the general margins.
        let pick = |toggle: Option<bool>, set: Option<PartialEdges>| -> Edges {
            match (toggle.unwrap_or(false), set) {
                (true, Some(set)) => set.resolve(general),
                _ => general,
            }
        };

        MarginSets {
            cover: pick(raw.distinct_cover, raw.cover),
            content_odd: pick(raw.distinct_odd_even, raw.odd),
            content_even: pick(raw.distinct_odd_even, raw.even),
            allergen: pick(raw.distinct_allergen, raw.allergen),
        }
    }

    fn resolve_columns(raw: &RawColumns) -> Columns {
        let content = positive_or(raw.content_fraction, defaults::CONTENT_FRACTION);
        let price = match raw.price_fraction {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            _ if raw.content_fraction.is_some() => (1.0 - content).max(0.0),
            _ => defaults::PRICE_FRACTION,
        };
        let total = content + price;
        let (content, price) = if total > 0.0 {
            (content / total, price / total)
        } else {
            (defaults::CONTENT_FRACTION, defaults::PRICE_FRACTION)
        };
        Columns {
            content_fraction: content,
            price_fraction: price,
            gap_mm: non_negative(raw.gap_mm.unwrap_or(defaults::COLUMN_GAP_MM)),
        }
    }

    pub fn margins_for(&self, class: PageClass) -> Edges {
        self.margins.for_class(class)
    }

    /// Width between the left and right margins of a page class.
    pub fn content_width_mm(&self, class: PageClass) -> f64 {
        (self.page.width_mm - self.margins_for(class).horizontal()).max(0.0)
    }

    /// Height between the top and bottom margins of a page class.
    pub fn content_height_mm(&self, class: PageClass) -> f64 {
        (self.page.height_mm - self.margins_for(class).vertical()).max(0.0)
    }

    /// Width blocks are measured at for a page class.
    ///
    /// Content blocks are measured before they are assigned to an odd or even
    /// page, so both content classes measure at the narrower of the two.
    pub fn measure_width_mm(&self, class: PageClass) -> f64 {
        if class.is_content() {
            self.content_width_mm(PageClass::ContentOdd)
                .min(self.content_width_mm(PageClass::ContentEven))
        } else {
            self.content_width_mm(class)
        }
    }

    /// Split a total width into (text column, price column) widths.
    pub fn column_widths_mm(&self, total_width_mm: f64) -> (f64, f64) {
        let usable = (total_width_mm - self.columns.gap_mm).max(0.0);
        (
            usable * self.columns.content_fraction,
            usable * self.columns.price_fraction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_resolves_to_defaults() {
        let config = LayoutConfig::from_json("{}").unwrap();
        assert_eq!(config, LayoutConfig::default());
        assert_eq!(config.page.height_mm, 297.0);
        assert_eq!(config.margins.content_odd, Edges::uniform(20.0));
        assert!(config.elements.product_title.visible);
        assert_eq!(config.service_line.placement, ServiceLinePlacement::Inline);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config =
            LayoutConfig::from_json(r#"{ "somethingElse": 3, "productTitle": { "bogus": 1 } }"#)
                .unwrap();
        assert_eq!(config.elements.product_title, defaults::product_title());
    }

    #[test]
    fn distinct_margins_disabled_forces_general() {
        let json = r#"{
            "margins": {
                "general": { "top": 15, "bottom": 15, "left": 10, "right": 10 },
                "odd": { "left": 30 },
                "even": { "right": 30 },
                "distinctOddEven": false
            }
        }"#;
        let config = LayoutConfig::from_json(json).unwrap();
        let general = Edges {
            top: 15.0,
            right: 10.0,
            bottom: 15.0,
            left: 10.0,
        };
        assert_eq!(config.margins.content_odd, general);
        assert_eq!(config.margins.content_even, general);
        assert_eq!(config.margins.cover, general);
        assert_eq!(config.margins.allergen, general);
    }

    #[test]
    fn distinct_margins_enabled_fill_from_general() {
        let json = r#"{
            "margins": {
                "general": { "top": 15, "bottom": 15, "left": 10, "right": 10 },
                "odd": { "left": 30 },
                "even": { "right": 30 },
                "allergen": { "top": 40 },
                "distinctOddEven": true,
                "distinctAllergen": true
            }
        }"#;
        let config = LayoutConfig::from_json(json).unwrap();
        assert_eq!(config.margins.content_odd.left, 30.0);
        assert_eq!(config.margins.content_odd.right, 10.0);
        assert_eq!(config.margins.content_even.right, 30.0);
        assert_eq!(config.margins.content_even.left, 10.0);
        assert_eq!(config.margins.allergen.top, 40.0);
        assert_eq!(config.margins.allergen.bottom, 15.0);
        // Cover toggle is off.
        assert_eq!(config.margins.cover.top, 15.0);
    }

    #[test]
    fn measure_width_uses_narrower_content_class() {
        let json = r#"{
            "margins": {
                "odd": { "left": 30 },
                "distinctOddEven": true
            }
        }"#;
        let config = LayoutConfig::from_json(json).unwrap();
        assert_eq!(config.content_width_mm(PageClass::ContentOdd), 160.0);
        assert_eq!(config.content_width_mm(PageClass::ContentEven), 170.0);
        assert_eq!(config.measure_width_mm(PageClass::ContentEven), 160.0);
        assert_eq!(config.measure_width_mm(PageClass::Cover), 170.0);
    }

    #[test]
    fn column_fractions_normalize() {
        let config =
            LayoutConfig::from_json(r#"{ "columns": { "contentFraction": 3, "priceFraction": 1, "gapMm": 0 } }"#)
                .unwrap();
        assert!((config.columns.content_fraction - 0.75).abs() < 1e-9);
        let (text, price) = config.column_widths_mm(100.0);
        assert!((text - 75.0).abs() < 1e-9);
        assert!((price - 25.0).abs() < 1e-9);
    }

    #[test]
    fn default_column_split() {
        let config = LayoutConfig::default();
        let (text, price) = config.column_widths_mm(170.0);
        assert!((text - 166.0 * 0.85).abs() < 1e-9);
        assert!((price - 166.0 * 0.15).abs() < 1e-9);
    }

    #[test]
    fn price_format_variants() {
        let config = LayoutConfig::default();
        assert_eq!(config.price_format.format(12.5), "€ 12,50");
        let fmt = PriceFormat {
            currency_symbol: "$".to_string(),
            decimals: 2,
            decimal_separator: ".".to_string(),
            symbol_before: false,
        };
        assert_eq!(fmt.format(3.0), "3.00 $");
        assert_eq!(fmt.format(f64::NAN), "0.00 $");
    }

    #[test]
    fn icons_per_row() {
        let icon = LayoutConfig::default().feature_icon;
        // 4mm icons with 1.5mm spacing: 5.5mm per step, plus the trailing gap.
        assert_eq!(icon.per_row(21.5), 4);
        assert_eq!(icon.per_row(1.0), 1);
    }
}
