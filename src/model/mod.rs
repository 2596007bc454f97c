//! # Menu Model
//!
//! The menu content as it arrives from the content manager. Everything here is
//! read-only from the engine's point of view: the data store owns it, the
//! translation pipeline has already resolved every display string for the
//! active language, and image storage has resolved icon and logo URLs.
//!
//! The one structural rule the engine relies on is ordering. Categories and
//! their products arrive in display order and are never re-sorted.

use serde::{Deserialize, Serialize};

use crate::config::RawLayoutConfig;
use crate::style::Color;

/// A complete input document: a menu plus the layout it should print with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDocument {
    #[serde(default)]
    pub layout: RawLayoutConfig,
    pub menu: Menu,
    /// Custom fonts to register before measurement.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    /// Inline asset data keyed by URL (data URIs or raw base64).
    #[serde(default)]
    pub assets: std::collections::HashMap<String, String>,
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name as used in the layout (e.g. "Playfair Display").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    /// BCP 47 tag of the language the strings are resolved for.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Notes attached to categories by `category_id`, in display order.
    #[serde(default)]
    pub notes: Vec<CategoryNote>,
    /// The allergen legend, in display order.
    #[serde(default)]
    pub allergens: Vec<Allergen>,
    /// Service / cover charge. Zero means no service line.
    #[serde(default)]
    pub service_charge: f64,
    #[serde(default)]
    pub labels: MenuLabels,
}

fn default_language() -> String {
    "en".to_string()
}

impl Menu {
    /// Notes attached to a category, in display order.
    pub fn notes_for<'a>(&'a self, category_id: &'a str) -> impl Iterator<Item = &'a CategoryNote> {
        self.notes.iter().filter(move |n| n.category_id == category_id)
    }

    pub fn has_service_charge(&self) -> bool {
        self.service_charge.is_finite() && self.service_charge > 0.0
    }
}

/// UI strings printed by the engine itself, already translated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuLabels {
    #[serde(default = "default_allergens_prefix")]
    pub allergens_prefix: String,
    #[serde(default = "default_service_charge")]
    pub service_charge: String,
    #[serde(default = "default_allergen_page_title")]
    pub allergen_page_title: String,
}

fn default_allergens_prefix() -> String {
    "Allergens:".to_string()
}

fn default_service_charge() -> String {
    "Service charge".to_string()
}

fn default_allergen_page_title() -> String {
    "Allergens".to_string()
}

impl Default for MenuLabels {
    fn default() -> Self {
        Self {
            allergens_prefix: default_allergens_prefix(),
            service_charge: default_service_charge(),
            allergen_page_title: default_allergen_page_title(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Description in the menu's secondary language, printed below the primary.
    #[serde(default)]
    pub description_secondary: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Printed after the price, e.g. "/ 100g".
    #[serde(default)]
    pub price_suffix: Option<String>,
    /// At most two variants are printed; extras are ignored.
    #[serde(default)]
    pub variants: Vec<PriceVariant>,
    #[serde(default)]
    pub allergens: Vec<Allergen>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub label: Option<Label>,
}

/// Maximum number of price variants a product prints.
pub const MAX_PRICE_VARIANTS: usize = 2;

impl Product {
    /// The variants that will actually print.
    pub fn printed_variants(&self) -> &[PriceVariant] {
        let n = self.variants.len().min(MAX_PRICE_VARIANTS);
        &self.variants[..n]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceVariant {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl PriceVariant {
    /// A variant with both a name and a value prints on two sub-lines.
    pub fn line_count(&self) -> usize {
        let has_name = self.name.as_deref().is_some_and(|n| !n.trim().is_empty());
        match (has_name, self.price.is_some()) {
            (true, true) => 2,
            (false, false) => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allergen {
    pub id: String,
    /// Short code printed in product allergen lists (e.g. "1", "G").
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNote {
    pub id: String,
    pub category_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Treat `None`, empty and whitespace-only strings alike.
pub(crate) fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
