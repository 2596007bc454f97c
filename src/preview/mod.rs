//! # Preview Rendering
//!
//! The preview is the visual truth the paginator trusts: a scene of
//! positioned text lines and image boxes in screen pixels (96 dpi) that a UI
//! can draw one-to-one.
//!
//! [`layout_block`] lays out a single block at a given width. It is generic
//! over the [`TextMeasurer`] so the same geometry code serves three callers:
//!
//! - the render-based measurer mounts blocks through it and reads the height;
//! - [`render_preview`] places the blocks of a page plan;
//! - the PDF renderer draws from it with built-in font metrics.
//!
//! ```text
//!  ┌──────────────── block width ────────────────┐
//!  │ text column (85%)              │gap│ price  │
//!  │ LABEL                          │   │ € 9,50 │
//!  │ Product title                  │   │ /100g  │
//!  │ description, wrapped ...       │   │        │
//!  │ [i][i][i] feature icons        │   │        │
//!  └─────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::block::{BlockId, BlockKind, ContentBlock, ProductContent};
use crate::config::{LayoutConfig, PageClass};
use crate::error::Result;
use crate::layout::PagePlan;
use crate::model::{Allergen, Feature};
use crate::pipeline::PaginationResult;
use crate::style::{Color, ElementStyle, FontSpec, TextAlign};
use crate::text::{break_into_lines, TextMeasurer};
use crate::units::{mm_to_px, pt_to_px, px_to_pt};

/// A laid-out block. Coordinates are px relative to the block's top-left.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBox {
    pub width: f64,
    pub height: f64,
    pub items: Vec<BoxItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoxItem {
    Text(TextItem),
    Image(ImageItem),
}

/// One line of text. `y` is the top of the line box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub line_height: f64,
    pub text: String,
    pub font: FontSpec,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageRole {
    FeatureIcon,
    AllergenIcon,
    Logo,
}

/// A reserved image box. The box is laid out whether or not the asset loads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub url: Option<String>,
    pub alt: String,
    pub role: ImageRole,
}

impl BlockBox {
    /// Bottom edge in px: the box height or the lowest item, whichever is
    /// further down.
    pub fn extent(&self) -> f64 {
        self.items
            .iter()
            .map(|item| match item {
                BoxItem::Text(t) => t.y + t.line_height,
                BoxItem::Image(i) => i.y + i.height,
            })
            .fold(self.height, f64::max)
    }
}

impl BoxItem {
    fn shift(&mut self, dx: f64, dy: f64) {
        match self {
            BoxItem::Text(t) => {
                t.x += dx;
                t.y += dy;
            }
            BoxItem::Image(i) => {
                i.x += dx;
                i.y += dy;
            }
        }
    }
}

/// Collects items while a column is laid out top to bottom.
struct Composer<'m, M: TextMeasurer> {
    measurer: &'m M,
    items: Vec<BoxItem>,
}

impl<'m, M: TextMeasurer> Composer<'m, M> {
    fn new(measurer: &'m M) -> Self {
        Self {
            measurer,
            items: Vec::new(),
        }
    }

    /// Lay out a text element inside `[x, x + width]` starting at `y`.
    /// Returns the y below the element, margins included. Invisible or empty
    /// elements take no space at all.
    fn text(&mut self, style: &ElementStyle, text: &str, x: f64, y: f64, width: f64) -> f64 {
        if !style.visible || text.trim().is_empty() {
            return y;
        }
        let margin = style.margin;
        let inner_x = x + mm_to_px(margin.left);
        let avail = (width - mm_to_px(margin.horizontal())).max(0.0);

        let lines = break_into_lines(self.measurer, text.trim(), px_to_pt(avail), &style.font);
        if lines.is_empty() {
            return y;
        }

        let line_height = pt_to_px(style.line_height_pt());
        let mut cursor = y + mm_to_px(margin.top);
        for line in lines {
            let line_width = pt_to_px(line.width);
            let offset = match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((avail - line_width) / 2.0).max(0.0),
                TextAlign::Right => (avail - line_width).max(0.0),
            };
            self.items.push(BoxItem::Text(TextItem {
                x: inner_x + offset,
                y: cursor,
                width: line_width,
                line_height,
                text: line.text,
                font: style.font.clone(),
                color: style.color,
            }));
            cursor += line_height;
        }
        cursor + mm_to_px(margin.bottom)
    }

    /// Lay out feature icons in rows. Returns the y below the last row.
    fn icons(&mut self, features: &[Feature], layout: &LayoutConfig, x: f64, y: f64, width: f64) -> f64 {
        let icon = &layout.feature_icon;
        if !icon.visible || features.is_empty() {
            return y;
        }
        let per_row = icon.per_row(crate::units::px_to_mm(width));
        let size = mm_to_px(icon.size_mm);
        let step = size + mm_to_px(icon.spacing_mm);
        let row_height = mm_to_px(icon.row_height_mm());

        let mut rows = 0;
        for (row, chunk) in features.chunks(per_row).enumerate() {
            let top = y + row as f64 * row_height + mm_to_px(icon.margin_top_mm);
            for (col, feature) in chunk.iter().enumerate() {
                self.items.push(BoxItem::Image(ImageItem {
                    x: x + col as f64 * step,
                    y: top,
                    width: size,
                    height: size,
                    url: crate::model::non_empty(&feature.icon_url).map(str::to_string),
                    alt: feature.name.clone(),
                    role: ImageRole::FeatureIcon,
                }));
            }
            rows += 1;
        }
        y + rows as f64 * row_height
    }

    fn finish(self, width: f64, height: f64) -> BlockBox {
        BlockBox {
            width,
            height,
            items: self.items,
        }
    }
}

/// Lay out one block at `width_px`.
pub fn layout_block<M: TextMeasurer>(
    block: &ContentBlock,
    layout: &LayoutConfig,
    width_px: f64,
    measurer: &M,
) -> BlockBox {
    let el = &layout.elements;
    let mut c = Composer::new(measurer);
    let w = width_px.max(0.0);

    let height = match block.kind() {
        BlockKind::Cover(cover) => {
            let mut y = 0.0;
            if let Some(url) = &cover.logo_url {
                let logo = &layout.cover_logo;
                let (lw, lh) = (mm_to_px(logo.width_mm), mm_to_px(logo.height_mm));
                let avail = w - mm_to_px(logo.margin.horizontal());
                let offset = match logo.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => ((avail - lw) / 2.0).max(0.0),
                    TextAlign::Right => (avail - lw).max(0.0),
                };
                y += mm_to_px(logo.margin.top);
                c.items.push(BoxItem::Image(ImageItem {
                    x: mm_to_px(logo.margin.left) + offset,
                    y,
                    width: lw,
                    height: lh,
                    url: Some(url.clone()),
                    alt: "logo".to_string(),
                    role: ImageRole::Logo,
                }));
                y += lh + mm_to_px(logo.margin.bottom);
            }
            if let Some(title) = &cover.title {
                y = c.text(&el.cover_title, title, 0.0, y, w);
            }
            if let Some(subtitle) = &cover.subtitle {
                y = c.text(&el.cover_subtitle, subtitle, 0.0, y, w);
            }
            y
        }
        BlockKind::CategoryHeader(header) => c.text(&el.category_title, &header.title, 0.0, 0.0, w),
        BlockKind::Product(product) => layout_product(&mut c, product, layout, w),
        BlockKind::CategoryNote(note) => {
            let mut y = 0.0;
            if let Some(title) = &note.title {
                y = c.text(&el.note_title, title, 0.0, y, w);
            }
            if let Some(text) = &note.text {
                y = c.text(&el.note_text, text, 0.0, y, w);
            }
            y
        }
        BlockKind::ServiceLine(line) => c.text(&el.service_line, &line.text, 0.0, 0.0, w),
        BlockKind::AllergenHeader(header) => {
            c.text(&el.allergen_legend_title, &header.title, 0.0, 0.0, w)
        }
        BlockKind::AllergenEntry(allergen) => layout_allergen_entry(&mut c, allergen, layout, w),
    };

    c.finish(w, height)
}

fn layout_product<M: TextMeasurer>(
    c: &mut Composer<'_, M>,
    product: &ProductContent,
    layout: &LayoutConfig,
    width: f64,
) -> f64 {
    let el = &layout.elements;
    let (text_mm, price_mm) = layout.column_widths_mm(crate::units::px_to_mm(width));
    let (text_w, price_w) = (mm_to_px(text_mm), mm_to_px(price_mm));
    let price_x = width - price_w;

    let mut y = 0.0;
    if let Some(label) = product.label() {
        let mut style = el.label.clone();
        if let Some(color) = label.color {
            style.color = color;
        }
        y = c.text(&style, &label.name.to_uppercase(), 0.0, y, text_w);
    }
    y = c.text(&el.product_title, product.title(), 0.0, y, text_w);
    if let Some(description) = product.description() {
        y = c.text(&el.product_description, description, 0.0, y, text_w);
    }
    if let Some(secondary) = product.description_secondary() {
        y = c.text(&el.product_description_secondary, secondary, 0.0, y, text_w);
    }
    if let Some(allergens) = &product.allergen_line {
        y = c.text(&el.allergen_list, allergens, 0.0, y, text_w);
    }
    let text_height = c.icons(product.features(), layout, 0.0, y, text_w);

    let mut price_y = 0.0;
    if let Some(price) = &product.price {
        price_y = c.text(&el.price, price, price_x, price_y, price_w);
        if let Some(suffix) = &product.price_suffix {
            price_y = c.text(&el.price_suffix, suffix, price_x, price_y, price_w);
        }
    }
    for variant in &product.variants {
        let lines: Vec<&str> = variant.lines().collect();
        price_y = c.text(&el.price_variant, &lines.join("\n"), price_x, price_y, price_w);
    }

    text_height.max(price_y)
}

fn layout_allergen_entry<M: TextMeasurer>(
    c: &mut Composer<'_, M>,
    allergen: &Allergen,
    layout: &LayoutConfig,
    width: f64,
) -> f64 {
    let icon = &layout.feature_icon;
    let mut text_x = 0.0;
    let mut icon_bottom = 0.0;
    if let Some(url) = crate::model::non_empty(&allergen.icon_url) {
        let size = mm_to_px(icon.size_mm);
        c.items.push(BoxItem::Image(ImageItem {
            x: 0.0,
            y: mm_to_px(icon.margin_top_mm),
            width: size,
            height: size,
            url: Some(url.to_string()),
            alt: allergen.name.clone(),
            role: ImageRole::AllergenIcon,
        }));
        text_x = size + mm_to_px(icon.spacing_mm) * 2.0;
        icon_bottom = mm_to_px(icon.row_height_mm());
    }
    let text = if allergen.code.trim().is_empty() {
        allergen.name.trim().to_string()
    } else {
        format!("{}  {}", allergen.code.trim(), allergen.name.trim())
    };
    let text_bottom = c.text(
        &layout.elements.allergen_legend_entry,
        &text,
        text_x,
        0.0,
        (width - text_x).max(0.0),
    );
    text_bottom.max(icon_bottom)
}

// ── Page scene ──────────────────────────────────────────────────────

/// The whole preview: every page of the plan with its blocks placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub language: String,
    pub pages: Vec<PreviewPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPage {
    pub number: usize,
    pub class: PageClass,
    pub width: f64,
    pub height: f64,
    pub overflow: bool,
    pub blocks: Vec<PlacedBlock>,
    /// Footer-placed service line, when one is reserved on this page.
    pub footer: Option<BlockBox>,
}

/// A block positioned on a page (page coordinates, px).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBlock {
    pub block_id: BlockId,
    pub kind: &'static str,
    pub x: f64,
    pub y: f64,
    /// Height the paginator reserved for this block.
    pub reserved_height: f64,
    #[serde(rename = "box")]
    pub content: BlockBox,
}

/// Vertical offset (mm, from the top margin) of each block on its page.
pub fn block_offsets_mm(plan: &PagePlan, heights: &[f64], spacing_mm: f64) -> Vec<f64> {
    let mut offsets = vec![0.0; heights.len()];
    for page in &plan.pages {
        let mut y = 0.0;
        for id in page.blocks.clone() {
            if id > page.blocks.start {
                y += spacing_mm;
            }
            if let Some(slot) = offsets.get_mut(id) {
                *slot = y;
            }
            y += heights.get(id).copied().unwrap_or(0.0);
        }
    }
    offsets
}

/// Lay out the service-line footer strip of a content page, in page px.
pub(crate) fn layout_footer<M: TextMeasurer>(
    text: &str,
    layout: &LayoutConfig,
    class: PageClass,
    reserve_mm: f64,
    measurer: &M,
) -> BlockBox {
    let margins = layout.margins_for(class);
    let width = mm_to_px(layout.measure_width_mm(class));
    let mut c = Composer::new(measurer);
    let top = layout.page.height_mm - margins.bottom - reserve_mm;
    let bottom = c.text(&layout.elements.service_line, text, 0.0, 0.0, width);
    // Center the line in the reserved strip.
    let dy = mm_to_px(top) + ((mm_to_px(reserve_mm) - bottom) / 2.0).max(0.0);
    let dx = mm_to_px(margins.left);
    for item in &mut c.items {
        item.shift(dx, dy);
    }
    c.finish(width, bottom)
}

/// Position every block of a pagination result on its page.
pub fn render_preview<M: TextMeasurer>(
    result: &PaginationResult,
    layout: &LayoutConfig,
    measurer: &M,
) -> Result<PreviewDocument> {
    let offsets = block_offsets_mm(&result.plan, &result.heights, layout.block_spacing_mm);
    let page_w = mm_to_px(layout.page.width_mm);
    let page_h = mm_to_px(layout.page.height_mm);

    let pages = result
        .plan
        .pages
        .iter()
        .map(|page| {
            let width = mm_to_px(layout.measure_width_mm(page.class));
            let x = mm_to_px(page.margins.left);
            let blocks = page
                .blocks
                .clone()
                .filter_map(|id| result.sequence.get(id))
                .map(|block| {
                    let content = layout_block(block, layout, width, measurer);
                    PlacedBlock {
                        block_id: block.id(),
                        kind: block.kind_name(),
                        x,
                        y: mm_to_px(page.margins.top + offsets[block.id()]),
                        reserved_height: mm_to_px(result.heights[block.id()]),
                        content,
                    }
                })
                .collect();

            let footer = match (&result.footer_text, page.class.is_content()) {
                (Some(text), true) if result.budgets.footer_reserve_mm > 0.0 => Some(layout_footer(
                    text,
                    layout,
                    page.class,
                    result.budgets.footer_reserve_mm,
                    measurer,
                )),
                _ => None,
            };

            PreviewPage {
                number: page.number,
                class: page.class,
                width: page_w,
                height: page_h,
                overflow: page.overflow,
                blocks,
                footer,
            }
        })
        .collect();

    Ok(PreviewDocument {
        language: result.sequence.language().to_string(),
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build_sequence;
    use crate::model::{Category, Menu, Product};
    use crate::text::BuiltinFonts;
    use crate::units::px_to_mm;

    fn product_menu(product: Product) -> Menu {
        Menu {
            categories: vec![Category {
                id: "c".into(),
                name: "Pizza".into(),
                products: vec![product],
            }],
            ..Default::default()
        }
    }

    fn product_box(product: Product, layout: &LayoutConfig) -> BlockBox {
        let seq = build_sequence(&product_menu(product), layout);
        let width = mm_to_px(layout.measure_width_mm(PageClass::ContentOdd));
        layout_block(seq.get(1).unwrap(), layout, width, &BuiltinFonts)
    }

    #[test]
    fn title_only_product_is_one_line() {
        let layout = LayoutConfig::default();
        let bx = product_box(
            Product {
                id: "p".into(),
                name: "Margherita".into(),
                ..Default::default()
            },
            &layout,
        );
        let title = &layout.elements.product_title;
        let expected = title.line_height_mm() + title.margin.vertical();
        assert!((px_to_mm(bx.height) - expected).abs() < 1e-6);
    }

    #[test]
    fn price_sits_in_price_column_right_aligned() {
        let layout = LayoutConfig::default();
        let bx = product_box(
            Product {
                id: "p".into(),
                name: "Margherita".into(),
                price: Some(8.5),
                ..Default::default()
            },
            &layout,
        );
        let price = bx
            .items
            .iter()
            .find_map(|i| match i {
                BoxItem::Text(t) if t.text == "€ 8,50" => Some(t),
                _ => None,
            })
            .unwrap();
        assert!((price.x + price.width - bx.width).abs() < 1e-6);
    }

    #[test]
    fn block_height_is_taller_column() {
        let layout = LayoutConfig::default();
        let variants = vec![
            crate::model::PriceVariant {
                name: Some("Small".into()),
                price: Some(7.0),
            },
            crate::model::PriceVariant {
                name: Some("Large".into()),
                price: Some(11.0),
            },
        ];
        let bx = product_box(
            Product {
                id: "p".into(),
                name: "Pizza".into(),
                variants,
                ..Default::default()
            },
            &layout,
        );
        let v = &layout.elements.price_variant;
        let price_column = 2.0 * (2.0 * v.line_height_mm() + v.margin.vertical());
        assert!((px_to_mm(bx.height) - price_column).abs() < 1e-6);
    }

    #[test]
    fn invisible_elements_take_no_space() {
        let layout = LayoutConfig::from_json(r#"{ "productDescription": { "visible": false } }"#).unwrap();
        let with_desc = Product {
            id: "p".into(),
            name: "Pizza".into(),
            description: Some("Tomato, mozzarella, basil".into()),
            ..Default::default()
        };
        let without = Product {
            description: None,
            ..with_desc.clone()
        };
        assert_eq!(
            product_box(with_desc, &layout).height,
            product_box(without, &layout).height
        );
    }

    #[test]
    fn feature_icons_wrap_into_rows() {
        let layout = LayoutConfig::default();
        let features: Vec<Feature> = (0..40)
            .map(|i| Feature {
                id: format!("f{i}"),
                name: format!("F{i}"),
                icon_url: None,
            })
            .collect();
        let bx = product_box(
            Product {
                id: "p".into(),
                name: "Pizza".into(),
                features,
                ..Default::default()
            },
            &layout,
        );
        let icons: Vec<_> = bx
            .items
            .iter()
            .filter_map(|i| match i {
                BoxItem::Image(img) => Some(img),
                _ => None,
            })
            .collect();
        assert_eq!(icons.len(), 40);
        let text_w = layout.column_widths_mm(layout.measure_width_mm(PageClass::ContentOdd)).0;
        let per_row = layout.feature_icon.per_row(text_w);
        let rows = 40usize.div_ceil(per_row);
        assert!(rows >= 2);
        let title = &layout.elements.product_title;
        let expected = title.line_height_mm()
            + title.margin.vertical()
            + rows as f64 * layout.feature_icon.row_height_mm();
        assert!((px_to_mm(bx.height) - expected).abs() < 1e-6);
    }

    #[test]
    fn centered_cover_title() {
        let layout = LayoutConfig::default();
        let menu = Menu {
            title: Some("Trattoria".into()),
            ..Default::default()
        };
        let seq = build_sequence(&menu, &layout);
        let width = mm_to_px(170.0);
        let bx = layout_block(seq.get(0).unwrap(), &layout, width, &BuiltinFonts);
        let BoxItem::Text(line) = &bx.items[0] else {
            panic!("expected text");
        };
        let left = line.x;
        let right = width - line.x - line.width;
        assert!((left - right).abs() < 1e-6);
    }

    #[test]
    fn offsets_follow_spacing() {
        let plan = PagePlan {
            pages: vec![crate::layout::Page {
                number: 1,
                class: PageClass::ContentOdd,
                blocks: 0..3,
                margins: crate::style::Edges::uniform(20.0),
                budget_mm: 257.0,
                used_mm: 34.0,
                overflow: false,
            }],
        };
        let offsets = block_offsets_mm(&plan, &[10.0, 10.0, 10.0], 2.0);
        assert_eq!(offsets, vec![0.0, 12.0, 24.0]);
    }
}
