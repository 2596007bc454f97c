//! Documented defaults for every field of the layout configuration.
//!
//! These are the values a menu prints with when the layout document says
//! nothing. Sizes are in points, margins and dimensions in millimeters.

use crate::style::{Color, Edges, ElementStyle, FontSpec, TextAlign};

pub const FONT_FAMILY: &str = "Helvetica";

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const PAGE_MARGIN_MM: f64 = 20.0;

pub const CONTENT_FRACTION: f64 = 0.85;
pub const PRICE_FRACTION: f64 = 0.15;
pub const COLUMN_GAP_MM: f64 = 4.0;

pub const BLOCK_SPACING_MM: f64 = 2.0;
pub const SERVICE_LINE_RESERVE_MM: f64 = 10.0;

pub const ICON_SIZE_MM: f64 = 4.0;
pub const ICON_SPACING_MM: f64 = 1.5;
pub const ICON_MARGIN_TOP_MM: f64 = 1.0;
pub const ICON_MARGIN_BOTTOM_MM: f64 = 0.5;

pub const LOGO_WIDTH_MM: f64 = 50.0;
pub const LOGO_HEIGHT_MM: f64 = 30.0;

pub const CURRENCY_SYMBOL: &str = "€";
pub const PRICE_DECIMALS: u32 = 2;
pub const DECIMAL_SEPARATOR: &str = ",";

fn grey(level: f64) -> Color {
    Color::rgb(level, level, level)
}

pub fn category_title() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 16.0).bold())
        .with_margin(Edges::vertical_only(4.0, 2.0))
}

pub fn product_title() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 11.0).bold())
        .with_margin(Edges::vertical_only(0.0, 0.5))
}

pub fn product_description() -> ElementStyle {
    let mut style = ElementStyle::new(FontSpec::new(FONT_FAMILY, 10.0))
        .with_color(grey(0.27))
        .with_margin(Edges::vertical_only(0.0, 0.5));
    style.line_height = 1.25;
    style
}

pub fn product_description_secondary() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 9.0).italic())
        .with_color(grey(0.4))
        .with_margin(Edges::vertical_only(0.0, 0.5))
}

pub fn allergen_list() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 8.0))
        .with_color(grey(0.4))
        .with_margin(Edges::vertical_only(0.5, 0.0))
}

pub fn price() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 11.0).bold()).with_align(TextAlign::Right)
}

pub fn price_suffix() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 8.0))
        .with_color(grey(0.4))
        .with_align(TextAlign::Right)
}

pub fn price_variant() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 9.0))
        .with_align(TextAlign::Right)
        .with_margin(Edges::vertical_only(0.0, 0.5))
}

pub fn service_line() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 9.0).italic())
        .with_align(TextAlign::Center)
        .with_margin(Edges::vertical_only(2.0, 2.0))
}

pub fn cover_title() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 28.0).bold())
        .with_align(TextAlign::Center)
        .with_margin(Edges::vertical_only(20.0, 4.0))
}

pub fn cover_subtitle() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 14.0))
        .with_color(grey(0.27))
        .with_align(TextAlign::Center)
}

pub fn note_title() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 10.0).bold())
        .with_margin(Edges::vertical_only(2.0, 0.5))
}

pub fn note_text() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 9.0).italic())
        .with_color(grey(0.27))
        .with_margin(Edges::vertical_only(0.0, 2.0))
}

pub fn label() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 7.0).bold()).with_color(Color::rgb(
        0.69, 0.23, 0.18,
    ))
}

pub fn allergen_legend_title() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 16.0).bold())
        .with_margin(Edges::vertical_only(0.0, 4.0))
}

pub fn allergen_legend_entry() -> ElementStyle {
    ElementStyle::new(FontSpec::new(FONT_FAMILY, 10.0))
        .with_margin(Edges::vertical_only(0.0, 1.0))
}
