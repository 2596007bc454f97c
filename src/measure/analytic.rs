//! Analytic estimate: line counts from character counts.
//!
//! Each text element contributes `line_height × ceil(chars / chars_per_line)`
//! plus its vertical margins. Characters per line come from the built-in
//! face's metrics: the column width divided by the average advance of
//! [`CALIBRATION_SAMPLE`] at the element's size. For the default 11pt bold
//! title in the default column that is a little under 80 characters; 10pt
//! body text gets about 90.
//!
//! Registered custom fonts are not consulted; every family is estimated with
//! its built-in stand-in.

use crate::block::{BlockKind, ContentBlock};
use crate::config::LayoutConfig;
use crate::font::StandardFont;
use crate::style::{ElementStyle, FontSpec};
use crate::units::mm_to_pt;

use super::BlockMeasurer;

/// Menu copy whose letter mix sets the average advance per character.
pub const CALIBRATION_SAMPLE: &str = "Pane casereccio tostato, pomodoro fresco, basilico e olio extravergine. \
Toasted country bread with fresh tomato, basil and olive oil.";

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticMeasurer;

impl AnalyticMeasurer {
    pub fn new() -> Self {
        Self
    }

    /// Average advance of one character of [`CALIBRATION_SAMPLE`] in em.
    pub fn average_advance_em(font: &FontSpec) -> f64 {
        let metrics = StandardFont::for_spec(font).metrics();
        metrics.measure_string(CALIBRATION_SAMPLE, 1.0, 0.0) / CALIBRATION_SAMPLE.chars().count() as f64
    }

    pub fn chars_per_line(width_mm: f64, font: &FontSpec) -> f64 {
        if font.size_pt <= 0.0 {
            return f64::INFINITY;
        }
        let advance_pt = Self::average_advance_em(font) * font.size_pt;
        (mm_to_pt(width_mm) / advance_pt).max(1.0)
    }

    /// Estimated height of one text element in mm. Zero when invisible/empty.
    pub fn element_height(style: &ElementStyle, text: &str, width_mm: f64) -> f64 {
        if !style.visible || text.trim().is_empty() {
            return 0.0;
        }
        let avail = (width_mm - style.margin.horizontal()).max(0.0);
        let cpl = Self::chars_per_line(avail, &style.font);
        let lines: f64 = text
            .trim()
            .lines()
            .map(|line| (line.chars().count() as f64 / cpl).ceil().max(1.0))
            .sum();
        lines * style.line_height_mm() + style.margin.vertical()
    }
}

impl BlockMeasurer for AnalyticMeasurer {
    fn measure(&mut self, block: &ContentBlock, layout: &LayoutConfig, width_mm: f64) -> f64 {
        let el = &layout.elements;
        let h = Self::element_height;

        match block.kind() {
            BlockKind::Cover(cover) => {
                let logo = &layout.cover_logo;
                let logo_h = if cover.logo_url.is_some() {
                    logo.margin.top + logo.height_mm + logo.margin.bottom
                } else {
                    0.0
                };
                logo_h
                    + cover
                        .title
                        .as_deref()
                        .map_or(0.0, |t| h(&el.cover_title, t, width_mm))
                    + cover
                        .subtitle
                        .as_deref()
                        .map_or(0.0, |t| h(&el.cover_subtitle, t, width_mm))
            }
            BlockKind::CategoryHeader(header) => h(&el.category_title, &header.title, width_mm),
            BlockKind::Product(product) => {
                let (text_w, price_w) = layout.column_widths_mm(width_mm);

                let mut text = h(&el.product_title, product.title(), text_w);
                if let Some(label) = product.label() {
                    text += h(&el.label, &label.name, text_w);
                }
                text += product
                    .description()
                    .map_or(0.0, |d| h(&el.product_description, d, text_w));
                text += product
                    .description_secondary()
                    .map_or(0.0, |d| h(&el.product_description_secondary, d, text_w));
                text += product
                    .allergen_line
                    .as_deref()
                    .map_or(0.0, |a| h(&el.allergen_list, a, text_w));

                let icon = &layout.feature_icon;
                let features = product.features().len();
                if icon.visible && features > 0 {
                    let rows = features.div_ceil(icon.per_row(text_w));
                    text += rows as f64 * icon.row_height_mm();
                }

                let mut price = 0.0;
                if let Some(p) = &product.price {
                    price += h(&el.price, p, price_w);
                    price += product
                        .price_suffix
                        .as_deref()
                        .map_or(0.0, |s| h(&el.price_suffix, s, price_w));
                }
                for variant in &product.variants {
                    let lines: Vec<&str> = variant.lines().collect();
                    price += h(&el.price_variant, &lines.join("\n"), price_w);
                }

                text.max(price)
            }
            BlockKind::CategoryNote(note) => {
                note.title
                    .as_deref()
                    .map_or(0.0, |t| h(&el.note_title, t, width_mm))
                    + note
                        .text
                        .as_deref()
                        .map_or(0.0, |t| h(&el.note_text, t, width_mm))
            }
            BlockKind::ServiceLine(line) => h(&el.service_line, &line.text, width_mm),
            BlockKind::AllergenHeader(header) => h(&el.allergen_legend_title, &header.title, width_mm),
            BlockKind::AllergenEntry(allergen) => {
                let text = format!("{}  {}", allergen.code, allergen.name);
                let has_icon = crate::model::non_empty(&allergen.icon_url).is_some();
                let icon = if has_icon {
                    layout.feature_icon.row_height_mm()
                } else {
                    0.0
                };
                h(&el.allergen_legend_entry, &text, width_mm).max(icon)
            }
        }
    }

    fn name(&self) -> &'static str {
        "analytic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_per_line_scales_with_width_and_size() {
        let body = FontSpec::new("Helvetica", 10.0);
        let cpl = AnalyticMeasurer::chars_per_line(141.1, &body);
        assert!((cpl / 2.0 - AnalyticMeasurer::chars_per_line(141.1 / 2.0, &body)).abs() < 1e-9);
        let large = FontSpec::new("Helvetica", 20.0);
        assert!((cpl / 2.0 - AnalyticMeasurer::chars_per_line(141.1, &large)).abs() < 1e-9);
    }

    #[test]
    fn default_title_column_holds_about_seventy_chars() {
        let layout = LayoutConfig::default();
        let (text, _) = layout.column_widths_mm(170.0);
        let cpl = AnalyticMeasurer::chars_per_line(text, &layout.elements.product_title.font);
        assert!((70.0..85.0).contains(&cpl), "{cpl}");
    }

    #[test]
    fn bold_and_serif_faces_differ() {
        let regular = FontSpec::new("Helvetica", 10.0);
        let bold = FontSpec::new("Helvetica", 10.0).bold();
        let serif = FontSpec::new("Times New Roman", 10.0);
        let w = 141.1;
        assert!(AnalyticMeasurer::chars_per_line(w, &bold) < AnalyticMeasurer::chars_per_line(w, &regular));
        assert!(AnalyticMeasurer::chars_per_line(w, &serif) > AnalyticMeasurer::chars_per_line(w, &regular));
    }

    #[test]
    fn ninety_char_description_is_one_line() {
        let style = crate::config::defaults::product_description();
        let text = "Pane casereccio tostato, pomodoro fresco a cubetti, basilico, aglio e olio extravergine.";
        let h = AnalyticMeasurer::element_height(&style, text, 141.1);
        assert!((h - style.line_height_mm() - style.margin.vertical()).abs() < 1e-9);
    }

    #[test]
    fn element_height_counts_lines() {
        let style = crate::config::defaults::product_description();
        let one = AnalyticMeasurer::element_height(&style, &"x".repeat(40), 141.1);
        let three = AnalyticMeasurer::element_height(&style, &"x".repeat(200), 141.1);
        let lh = style.line_height_mm();
        assert!((three - one - 2.0 * lh).abs() < 1e-9);
    }

    #[test]
    fn hidden_or_empty_element_is_zero() {
        let mut style = crate::config::defaults::product_description();
        assert_eq!(AnalyticMeasurer::element_height(&style, "   ", 100.0), 0.0);
        style.visible = false;
        assert_eq!(AnalyticMeasurer::element_height(&style, "text", 100.0), 0.0);
    }
}
