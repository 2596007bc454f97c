//! # Content Blocks
//!
//! A content block is the unit of pagination: a category header, one product,
//! a category note, the service-charge line, and (on their own page classes)
//! the cover and the allergen legend. Blocks are atomic. The paginator may
//! move a block to the next page but never splits one.
//!
//! [`build_sequence`] linearizes a [`Menu`] into the exact order the pages
//! will print:
//!
//! ```text
//! [Cover]
//! CategoryHeader(A) Product(A1) .. Product(An) Note(A)*
//! ...
//! ServiceLine                      <- between the last two categories
//! CategoryHeader(Z) Product(Z1) .. Product(Zn) Note(Z)*
//! [AllergenHeader AllergenEntry*]
//! ```
//!
//! Each block carries the display strings it prints (prices already formatted,
//! the allergen line already joined), so the preview and the PDF renderer
//! print exactly the same text. Blocks are immutable once built; a change of
//! layout, content or language means building a new sequence.

use std::ops::Range;

use serde::Serialize;

use crate::config::{LayoutConfig, ServiceLinePlacement};
use crate::model::{non_empty, Allergen, CategoryNote, Feature, Label, Menu, Product};

/// Position of a block in its sequence.
pub type BlockId = usize;

/// The page-class family a block belongs to. Sections never share a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Cover,
    Content,
    Allergen,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    id: BlockId,
    language: String,
    kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Cover(CoverContent),
    CategoryHeader(CategoryHeaderContent),
    Product(ProductContent),
    CategoryNote(NoteContent),
    ServiceLine(ServiceLineContent),
    AllergenHeader(AllergenHeaderContent),
    AllergenEntry(Allergen),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHeaderContent {
    pub category_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContent {
    pub category_id: String,
    pub item: Product,
    /// e.g. "Allergens: 1, 7". `None` when the product lists no allergens.
    pub allergen_line: Option<String>,
    /// Formatted base price. `None` when variants replace it.
    pub price: Option<String>,
    pub price_suffix: Option<String>,
    pub variants: Vec<VariantText>,
}

impl ProductContent {
    pub fn title(&self) -> &str {
        self.item.name.trim()
    }

    pub fn label(&self) -> Option<&Label> {
        self.item.label.as_ref().filter(|l| !l.name.trim().is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(&self.item.description)
    }

    pub fn description_secondary(&self) -> Option<&str> {
        non_empty(&self.item.description_secondary)
    }

    pub fn features(&self) -> &[Feature] {
        &self.item.features
    }
}

/// A printed price variant: up to two sub-lines (name, value).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantText {
    pub name: Option<String>,
    pub price: Option<String>,
}

impl VariantText {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.name.as_deref().into_iter().chain(self.price.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteContent {
    pub note_id: String,
    pub category_id: String,
    pub title: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenHeaderContent {
    pub title: String,
}

impl ContentBlock {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn section(&self) -> Section {
        match self.kind {
            BlockKind::Cover(_) => Section::Cover,
            BlockKind::AllergenHeader(_) | BlockKind::AllergenEntry(_) => Section::Allergen,
            _ => Section::Content,
        }
    }

    /// Short human-readable name for logs and the preview scene.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Cover(_) => "Cover",
            BlockKind::CategoryHeader(_) => "CategoryHeader",
            BlockKind::Product(_) => "Product",
            BlockKind::CategoryNote(_) => "CategoryNote",
            BlockKind::ServiceLine(_) => "ServiceLine",
            BlockKind::AllergenHeader(_) => "AllergenHeader",
            BlockKind::AllergenEntry(_) => "AllergenEntry",
        }
    }
}

/// The ordered, immutable block sequence for one menu, layout and language.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSequence {
    language: String,
    blocks: Vec<ContentBlock>,
}

impl BlockSequence {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&ContentBlock> {
        self.blocks.get(id)
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentBlock> {
        self.blocks.iter()
    }

    /// Contiguous runs of blocks sharing a section, in sequence order.
    pub fn sections(&self) -> Vec<(Section, Range<usize>)> {
        let mut out: Vec<(Section, Range<usize>)> = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            match out.last_mut() {
                Some((section, range)) if *section == block.section() => range.end = i + 1,
                _ => out.push((block.section(), i..i + 1)),
            }
        }
        out
    }
}

/// Linearize a menu into its block sequence.
pub fn build_sequence(menu: &Menu, layout: &LayoutConfig) -> BlockSequence {
    let elements = &layout.elements;
    let mut kinds: Vec<BlockKind> = Vec::new();

    if let Some(cover) = cover_block(menu, layout) {
        kinds.push(cover);
    }

    let mut groups: Vec<Vec<BlockKind>> = Vec::new();
    for category in &menu.categories {
        let mut group = Vec::new();

        let notes: Vec<&CategoryNote> = menu
            .notes_for(&category.id)
            .filter(|n| note_prints(n, layout))
            .collect();
        if category.products.is_empty() && notes.is_empty() {
            log::debug!("skipping empty category '{}'", category.id);
            continue;
        }

        if elements.category_title.visible && !category.name.trim().is_empty() {
            group.push(BlockKind::CategoryHeader(CategoryHeaderContent {
                category_id: category.id.clone(),
                title: category.name.trim().to_string(),
            }));
        }

        for product in &category.products {
            group.push(BlockKind::Product(product_content(
                &category.id,
                product,
                menu,
                layout,
            )));
        }

        // Notes only ever follow the category's last product.
        for note in notes {
            group.push(BlockKind::CategoryNote(NoteContent {
                note_id: note.id.clone(),
                category_id: note.category_id.clone(),
                title: non_empty(&note.title).map(str::to_string),
                text: non_empty(&note.text).map(str::to_string),
            }));
        }

        groups.push(group);
    }

    if let Some(service) = inline_service_line(menu, layout) {
        if groups.len() >= 2 {
            let at = groups.len() - 1;
            groups.insert(at, vec![service]);
        } else {
            log::debug!("single category menu: inline service line not emitted");
        }
    }
    kinds.extend(groups.into_iter().flatten());

    if layout.allergen_pages_enabled && !menu.allergens.is_empty() {
        if elements.allergen_legend_title.visible
            && !menu.labels.allergen_page_title.trim().is_empty()
        {
            kinds.push(BlockKind::AllergenHeader(AllergenHeaderContent {
                title: menu.labels.allergen_page_title.trim().to_string(),
            }));
        }
        if elements.allergen_legend_entry.visible {
            kinds.extend(menu.allergens.iter().cloned().map(BlockKind::AllergenEntry));
        }
    }

    let blocks = kinds
        .into_iter()
        .enumerate()
        .map(|(id, kind)| ContentBlock {
            id,
            language: menu.language.clone(),
            kind,
        })
        .collect::<Vec<_>>();

    log::debug!(
        "built {} blocks for language '{}'",
        blocks.len(),
        menu.language
    );

    BlockSequence {
        language: menu.language.clone(),
        blocks,
    }
}

fn cover_block(menu: &Menu, layout: &LayoutConfig) -> Option<BlockKind> {
    if !layout.cover_enabled {
        return None;
    }
    let elements = &layout.elements;
    let title = non_empty(&menu.title)
        .filter(|_| elements.cover_title.visible)
        .map(str::to_string);
    let subtitle = non_empty(&menu.subtitle)
        .filter(|_| elements.cover_subtitle.visible)
        .map(str::to_string);
    let logo_url = non_empty(&menu.logo_url)
        .filter(|_| layout.cover_logo.visible)
        .map(str::to_string);

    if title.is_none() && subtitle.is_none() && logo_url.is_none() {
        return None;
    }
    Some(BlockKind::Cover(CoverContent {
        title,
        subtitle,
        logo_url,
    }))
}

fn note_prints(note: &CategoryNote, layout: &LayoutConfig) -> bool {
    let title = layout.elements.note_title.visible && non_empty(&note.title).is_some();
    let text = layout.elements.note_text.visible && non_empty(&note.text).is_some();
    title || text
}

fn product_content(
    category_id: &str,
    product: &Product,
    menu: &Menu,
    layout: &LayoutConfig,
) -> ProductContent {
    let fmt = &layout.price_format;

    let allergen_line = if product.allergens.is_empty() {
        None
    } else {
        let codes = product
            .allergens
            .iter()
            .map(|a| a.code.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if codes.is_empty() {
            None
        } else {
            let prefix = menu.labels.allergens_prefix.trim();
            Some(if prefix.is_empty() {
                codes
            } else {
                format!("{} {}", prefix, codes)
            })
        }
    };

    let variants: Vec<VariantText> = product
        .printed_variants()
        .iter()
        .filter(|v| v.line_count() > 0)
        .map(|v| VariantText {
            name: non_empty(&v.name).map(str::to_string),
            price: v.price.map(|p| fmt.format(p)),
        })
        .collect();

    let price = if variants.is_empty() {
        product.price.map(|p| fmt.format(p))
    } else {
        None
    };
    let price_suffix = price
        .as_ref()
        .and_then(|_| non_empty(&product.price_suffix))
        .map(str::to_string);

    ProductContent {
        category_id: category_id.to_string(),
        item: product.clone(),
        allergen_line,
        price,
        price_suffix,
        variants,
    }
}

fn inline_service_line(menu: &Menu, layout: &LayoutConfig) -> Option<BlockKind> {
    if layout.service_line.placement != ServiceLinePlacement::Inline
        || !menu.has_service_charge()
        || !layout.elements.service_line.visible
    {
        return None;
    }
    Some(BlockKind::ServiceLine(ServiceLineContent {
        text: service_line_text(menu, layout),
    }))
}

/// The printed service-charge text, shared by inline blocks and page footers.
pub fn service_line_text(menu: &Menu, layout: &LayoutConfig) -> String {
    let amount = layout.price_format.format(menu.service_charge);
    let label = menu.labels.service_charge.trim();
    if label.is_empty() {
        amount
    } else {
        format!("{} {}", label, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, PriceVariant};

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Dish {id}"),
            price: Some(10.0),
            ..Default::default()
        }
    }

    fn category(id: &str, products: &[&str]) -> Category {
        Category {
            id: id.to_string(),
            name: format!("Category {id}"),
            products: products.iter().map(|p| product(p)).collect(),
        }
    }

    fn note(id: &str, category_id: &str) -> CategoryNote {
        CategoryNote {
            id: id.to_string(),
            category_id: category_id.to_string(),
            title: Some("Note".to_string()),
            text: Some("All pasta is made in house.".to_string()),
        }
    }

    fn kinds(seq: &BlockSequence) -> Vec<&'static str> {
        seq.iter().map(|b| b.kind_name()).collect()
    }

    #[test]
    fn header_products_then_notes() {
        let menu = Menu {
            language: "it".to_string(),
            categories: vec![category("a", &["1", "2"]), category("b", &["3"])],
            notes: vec![note("n1", "a"), note("n2", "b")],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        assert_eq!(
            kinds(&seq),
            vec![
                "CategoryHeader",
                "Product",
                "Product",
                "CategoryNote",
                "CategoryHeader",
                "Product",
                "CategoryNote"
            ]
        );
        assert!(seq.iter().all(|b| b.language() == "it"));
        assert!(seq.iter().enumerate().all(|(i, b)| b.id() == i));
    }

    #[test]
    fn note_never_precedes_last_product_of_its_category() {
        // Notes listed before the products in the input still print after them.
        let menu = Menu {
            notes: vec![note("n1", "a"), note("n2", "a")],
            categories: vec![category("a", &["1", "2", "3"])],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        let last_product = seq
            .iter()
            .rposition(|b| matches!(b.kind(), BlockKind::Product(_)))
            .unwrap();
        let first_note = seq
            .iter()
            .position(|b| matches!(b.kind(), BlockKind::CategoryNote(_)))
            .unwrap();
        assert!(first_note > last_product);
    }

    #[test]
    fn service_line_sits_between_last_two_categories() {
        let menu = Menu {
            categories: vec![
                category("a", &["1"]),
                category("b", &["2"]),
                category("c", &["3"]),
            ],
            service_charge: 2.0,
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        let names = kinds(&seq);
        assert_eq!(names.iter().filter(|k| **k == "ServiceLine").count(), 1);
        let pos = names.iter().position(|k| *k == "ServiceLine").unwrap();
        assert_eq!(names[pos + 1], "CategoryHeader");
        assert_ne!(names.last(), Some(&"ServiceLine"));
        match seq.get(pos).unwrap().kind() {
            BlockKind::ServiceLine(s) => assert_eq!(s.text, "Service charge € 2,00"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_service_line_without_charge_or_single_category() {
        let mut menu = Menu {
            categories: vec![category("a", &["1"]), category("b", &["2"])],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        assert!(!kinds(&seq).contains(&"ServiceLine"));

        menu.service_charge = 1.5;
        menu.categories.truncate(1);
        let seq = build_sequence(&menu, &LayoutConfig::default());
        assert!(!kinds(&seq).contains(&"ServiceLine"));
    }

    #[test]
    fn footer_placement_emits_no_block() {
        let menu = Menu {
            categories: vec![category("a", &["1"]), category("b", &["2"])],
            service_charge: 2.0,
            ..Default::default()
        };
        let layout =
            LayoutConfig::from_json(r#"{ "serviceLinePlacement": { "placement": "footer" } }"#)
                .unwrap();
        let seq = build_sequence(&menu, &layout);
        assert!(!kinds(&seq).contains(&"ServiceLine"));
    }

    #[test]
    fn invisible_category_title_skips_headers() {
        let menu = Menu {
            categories: vec![category("a", &["1"])],
            ..Default::default()
        };
        let layout = LayoutConfig::from_json(r#"{ "categoryTitle": { "visible": false } }"#).unwrap();
        let seq = build_sequence(&menu, &layout);
        assert_eq!(kinds(&seq), vec!["Product"]);
    }

    #[test]
    fn empty_categories_are_skipped() {
        let menu = Menu {
            categories: vec![category("a", &[]), category("b", &["1"])],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        assert_eq!(kinds(&seq), vec!["CategoryHeader", "Product"]);
    }

    #[test]
    fn cover_and_allergen_sections() {
        let menu = Menu {
            title: Some("Trattoria".to_string()),
            categories: vec![category("a", &["1"])],
            allergens: vec![
                Allergen {
                    id: "g".into(),
                    code: "1".into(),
                    name: "Gluten".into(),
                    icon_url: None,
                },
                Allergen {
                    id: "m".into(),
                    code: "7".into(),
                    name: "Milk".into(),
                    icon_url: None,
                },
            ],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        let sections = seq.sections();
        assert_eq!(
            sections,
            vec![
                (Section::Cover, 0..1),
                (Section::Content, 1..3),
                (Section::Allergen, 3..6)
            ]
        );

        let layout = LayoutConfig::from_json(
            r#"{ "cover": { "enabled": false }, "allergenPages": { "enabled": false } }"#,
        )
        .unwrap();
        let seq = build_sequence(&menu, &layout);
        assert_eq!(seq.sections(), vec![(Section::Content, 0..2)]);
    }

    #[test]
    fn product_strings_are_resolved() {
        let mut p = product("1");
        p.allergens = vec![
            Allergen {
                id: "g".into(),
                code: "1".into(),
                name: "Gluten".into(),
                icon_url: None,
            },
            Allergen {
                id: "e".into(),
                code: "3".into(),
                name: "Eggs".into(),
                icon_url: None,
            },
        ];
        p.price_suffix = Some("/ 100g".to_string());
        let menu = Menu {
            categories: vec![Category {
                id: "a".into(),
                name: "A".into(),
                products: vec![p.clone()],
            }],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        let BlockKind::Product(content) = seq.get(1).unwrap().kind() else {
            panic!("expected product");
        };
        assert_eq!(content.allergen_line.as_deref(), Some("Allergens: 1, 3"));
        assert_eq!(content.price.as_deref(), Some("€ 10,00"));
        assert_eq!(content.price_suffix.as_deref(), Some("/ 100g"));

        // Variants replace the base price.
        p.variants = vec![
            PriceVariant {
                name: Some("Small".into()),
                price: Some(6.0),
            },
            PriceVariant {
                name: None,
                price: Some(9.0),
            },
            PriceVariant {
                name: Some("Ignored".into()),
                price: Some(12.0),
            },
        ];
        let menu = Menu {
            categories: vec![Category {
                id: "a".into(),
                name: "A".into(),
                products: vec![p],
            }],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &LayoutConfig::default());
        let BlockKind::Product(content) = seq.get(1).unwrap().kind() else {
            panic!("expected product");
        };
        assert!(content.price.is_none());
        assert!(content.price_suffix.is_none());
        assert_eq!(content.variants.len(), 2);
        assert_eq!(content.variants[0].lines().count(), 2);
        assert_eq!(content.variants[1].lines().count(), 1);
    }

    #[test]
    fn sequence_is_deterministic() {
        let menu = Menu {
            categories: vec![category("a", &["1", "2"]), category("b", &["3"])],
            notes: vec![note("n", "a")],
            service_charge: 3.0,
            ..Default::default()
        };
        let layout = LayoutConfig::default();
        assert_eq!(build_sequence(&menu, &layout), build_sequence(&menu, &layout));
    }
}
