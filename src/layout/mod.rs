//! # Pagination
//!
//! Assigns every block of a [`BlockSequence`] to exactly one page.
//!
//! The algorithm is first-fit greedy, one pass, no lookahead:
//!
//! 1. Walk the sequence in order with a cursor on the current page.
//! 2. Ask [`page_break::decide`] whether the next block fits in what is left
//!    of the page's height budget (spacing counted between blocks only).
//! 3. Place it, or close the page and open a new one.
//!
//! Sections (cover, content, allergen) are hard boundaries: a new section
//! always opens a new page. Content pages alternate odd/even, starting with
//! odd, and each page takes its class's margins and budget.
//!
//! Pagination is a pure function of (sequence, heights, budgets). Nothing is
//! measured here.

pub mod page_break;

use std::ops::Range;

use serde::Serialize;

use crate::block::{BlockId, BlockSequence, Section};
use crate::config::{LayoutConfig, PageClass, ServiceLinePlacement};
use crate::style::Edges;
use page_break::BreakDecision;

/// A page in the plan. Blocks are a contiguous range of the sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number across the whole document.
    pub number: usize,
    pub class: PageClass,
    pub blocks: Range<usize>,
    pub margins: Edges,
    pub budget_mm: f64,
    pub used_mm: f64,
    /// The page holds a single block taller than its budget.
    pub overflow: bool,
}

impl Page {
    pub fn block_ids(&self) -> Range<BlockId> {
        self.blocks.clone()
    }

    pub fn remaining_mm(&self) -> f64 {
        (self.budget_mm - self.used_mm).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    pub pages: Vec<Page>,
}

impl PagePlan {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Index of the page holding `block`.
    pub fn page_of(&self, block: BlockId) -> Option<usize> {
        self.pages.iter().position(|p| p.blocks.contains(&block))
    }

    /// Page index for each block, in sequence order.
    pub fn assignment(&self) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.blocks.clone().map(move |_| i))
            .collect()
    }

    pub fn overflow_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.overflow)
    }
}

/// Usable height per page class, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBudgets {
    pub cover: f64,
    pub content_odd: f64,
    pub content_even: f64,
    pub allergen: f64,
    /// Strip reserved at the bottom of each content page for the service line.
    pub footer_reserve_mm: f64,
}

impl PageBudgets {
    /// Budgets for a layout. The footer strip is only reserved when the
    /// service line is placed in the footer and there is a charge to print.
    pub fn from_layout(layout: &LayoutConfig, has_service_charge: bool) -> Self {
        let footer_reserve_mm = if layout.service_line.placement == ServiceLinePlacement::Footer
            && has_service_charge
            && layout.elements.service_line.visible
        {
            layout.service_line.reserve_mm
        } else {
            0.0
        };

        let content = |class| (layout.content_height_mm(class) - footer_reserve_mm).max(0.0);
        Self {
            cover: layout.content_height_mm(PageClass::Cover),
            content_odd: content(PageClass::ContentOdd),
            content_even: content(PageClass::ContentEven),
            allergen: layout.content_height_mm(PageClass::Allergen),
            footer_reserve_mm,
        }
    }

    pub fn for_class(&self, class: PageClass) -> f64 {
        match class {
            PageClass::Cover => self.cover,
            PageClass::ContentOdd => self.content_odd,
            PageClass::ContentEven => self.content_even,
            PageClass::Allergen => self.allergen,
        }
    }
}

/// Tracks the page being filled.
struct PageCursor {
    class: PageClass,
    start: usize,
    end: usize,
    used: f64,
    budget: f64,
    overflow: bool,
}

impl PageCursor {
    fn new(class: PageClass, start: usize, budget: f64) -> Self {
        Self {
            class,
            start,
            end: start,
            used: 0.0,
            budget,
            overflow: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn place(&mut self, height: f64, spacing: f64) {
        if !self.is_empty() {
            self.used += spacing;
        }
        self.used += height;
        self.end += 1;
    }
}

pub struct Paginator<'a> {
    layout: &'a LayoutConfig,
}

impl<'a> Paginator<'a> {
    pub fn new(layout: &'a LayoutConfig) -> Self {
        Self { layout }
    }

    /// Assign blocks to pages. `heights[i]` is the measured height of block
    /// `i` in millimeters.
    pub fn paginate(&self, seq: &BlockSequence, heights: &[f64], budgets: &PageBudgets) -> PagePlan {
        debug_assert_eq!(seq.len(), heights.len());
        let spacing = self.layout.block_spacing_mm;
        let mut pages: Vec<Page> = Vec::new();
        let mut content_pages = 0usize;

        for (section, range) in seq.sections() {
            let mut next_class = || match section {
                Section::Cover => PageClass::Cover,
                Section::Allergen => PageClass::Allergen,
                Section::Content => {
                    content_pages += 1;
                    if content_pages % 2 == 1 {
                        PageClass::ContentOdd
                    } else {
                        PageClass::ContentEven
                    }
                }
            };

            let class = next_class();
            let mut cursor = PageCursor::new(class, range.start, budgets.for_class(class));

            for id in range {
                let height = heights.get(id).copied().unwrap_or(0.0).max(0.0);
                let mut decision =
                    page_break::decide(cursor.used, height, spacing, cursor.budget, cursor.is_empty());

                // Whatever did not fit here is judged again against the next
                // page, whose class (and budget) may differ.
                if decision != BreakDecision::Place && !cursor.is_empty() {
                    self.close(&mut pages, &cursor);
                    let class = next_class();
                    cursor = PageCursor::new(class, id, budgets.for_class(class));
                    decision = page_break::decide(0.0, height, spacing, cursor.budget, true);
                }

                if decision == BreakDecision::Place {
                    cursor.place(height, spacing);
                    continue;
                }

                log::info!(
                    "block {} ({}) is {:.1}mm, taller than the {:.1}mm budget; isolating it",
                    id,
                    seq.get(id).map(|b| b.kind_name()).unwrap_or("?"),
                    height,
                    cursor.budget
                );
                cursor.place(height, spacing);
                cursor.overflow = true;
                self.close(&mut pages, &cursor);
                let class = next_class();
                cursor = PageCursor::new(class, id + 1, budgets.for_class(class));
            }

            if !cursor.is_empty() {
                self.close(&mut pages, &cursor);
            } else if section == Section::Content {
                // The trailing cursor was opened after an isolated block and
                // never used; give its parity back.
                content_pages -= 1;
            }
        }

        log::debug!("paginated {} blocks onto {} pages", seq.len(), pages.len());
        PagePlan { pages }
    }

    fn close(&self, pages: &mut Vec<Page>, cursor: &PageCursor) {
        let page = Page {
            number: pages.len() + 1,
            class: cursor.class,
            blocks: cursor.start..cursor.end,
            margins: self.layout.margins_for(cursor.class),
            budget_mm: cursor.budget,
            used_mm: cursor.used,
            overflow: cursor.overflow,
        };
        log::debug!(
            "page {} ({:?}) holds blocks {:?}, {:.1}mm left",
            page.number,
            page.class,
            page.blocks,
            page.remaining_mm()
        );
        pages.push(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build_sequence;
    use crate::model::{Category, Menu, Product};

    fn menu_with(products: usize) -> Menu {
        Menu {
            categories: vec![Category {
                id: "c".into(),
                name: "Mains".into(),
                products: (0..products)
                    .map(|i| Product {
                        id: format!("p{i}"),
                        name: format!("Dish {i}"),
                        ..Default::default()
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn a4_default_budget() {
        let budgets = PageBudgets::from_layout(&LayoutConfig::default(), false);
        assert!((budgets.content_odd - 257.0).abs() < 1e-9);
        assert!((budgets.content_even - 257.0).abs() < 1e-9);
        assert_eq!(budgets.footer_reserve_mm, 0.0);
    }

    #[test]
    fn footer_reservation_only_with_charge() {
        let layout =
            LayoutConfig::from_json(r#"{ "serviceLinePlacement": { "placement": "footer", "reserveMm": 12 } }"#)
                .unwrap();
        let with = PageBudgets::from_layout(&layout, true);
        assert!((with.content_odd - 245.0).abs() < 1e-9);
        assert!((with.allergen - 257.0).abs() < 1e-9);
        let without = PageBudgets::from_layout(&layout, false);
        assert!((without.content_odd - 257.0).abs() < 1e-9);
    }

    #[test]
    fn fourth_product_breaks() {
        // Header 20mm, products 60mm, 2mm spacing, 257mm budget:
        // 20 + 3 * (2 + 60) = 206, a fourth would need 268.
        let layout = LayoutConfig::default();
        let seq = build_sequence(&menu_with(5), &layout);
        let heights = vec![20.0, 60.0, 60.0, 60.0, 60.0, 60.0];
        let budgets = PageBudgets::from_layout(&layout, false);
        let plan = Paginator::new(&layout).paginate(&seq, &heights, &budgets);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.pages[0].blocks, 0..4);
        assert_eq!(plan.pages[1].blocks, 4..6);
        assert!((plan.pages[0].used_mm - 206.0).abs() < 1e-9);
        assert_eq!(plan.pages[0].class, PageClass::ContentOdd);
        assert_eq!(plan.pages[1].class, PageClass::ContentEven);
    }

    #[test]
    fn over_height_block_isolated_and_parity_continues() {
        let layout = LayoutConfig::default();
        let seq = build_sequence(&menu_with(3), &layout);
        let heights = vec![10.0, 50.0, 400.0, 50.0];
        let budgets = PageBudgets::from_layout(&layout, false);
        let plan = Paginator::new(&layout).paginate(&seq, &heights, &budgets);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.pages[1].blocks, 2..3);
        assert!(plan.pages[1].overflow);
        assert_eq!(plan.pages[1].class, PageClass::ContentEven);
        assert_eq!(plan.pages[2].class, PageClass::ContentOdd);
        assert_eq!(plan.overflow_pages().count(), 1);
    }

    fn odd_even_layout() -> LayoutConfig {
        // Odd pages keep the 257mm budget, even pages drop to 217mm.
        LayoutConfig::from_json(
            r#"{ "margins": { "distinctOddEven": true, "even": { "top": 60, "right": 20, "bottom": 20, "left": 20 } } }"#,
        )
        .unwrap()
    }

    #[test]
    fn moved_block_is_checked_against_the_next_page_budget() {
        let layout = odd_even_layout();
        let budgets = PageBudgets::from_layout(&layout, false);
        assert!((budgets.content_even - 217.0).abs() < 1e-9);

        let seq = build_sequence(&menu_with(2), &layout);
        let plan = Paginator::new(&layout).paginate(&seq, &[100.0, 100.0, 240.0], &budgets);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.pages[0].blocks, 0..2);
        assert!(!plan.pages[0].overflow);
        assert_eq!(plan.pages[1].class, PageClass::ContentEven);
        assert_eq!(plan.pages[1].blocks, 2..3);
        assert!(plan.pages[1].overflow);
        assert!(plan.pages[1].used_mm > plan.pages[1].budget_mm);
        assert_eq!(plan.pages[1].remaining_mm(), 0.0);
    }

    #[test]
    fn block_too_tall_for_even_page_fits_next_odd_page() {
        let layout = odd_even_layout();
        let budgets = PageBudgets::from_layout(&layout, false);
        let seq = build_sequence(&menu_with(3), &layout);
        // Page 1 takes the first two, page 2 (even) the third; the 240mm block
        // is over the even budget but within the odd one.
        let plan = Paginator::new(&layout).paginate(&seq, &[100.0, 150.0, 100.0, 240.0], &budgets);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.pages[1].class, PageClass::ContentEven);
        assert_eq!(plan.pages[1].blocks, 2..3);
        assert_eq!(plan.pages[2].class, PageClass::ContentOdd);
        assert_eq!(plan.pages[2].blocks, 3..4);
        assert_eq!(plan.overflow_pages().count(), 0);
        assert!((plan.pages[2].remaining_mm() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn isolated_last_block_leaves_no_empty_page() {
        let layout = LayoutConfig::default();
        let seq = build_sequence(&menu_with(1), &layout);
        let plan = Paginator::new(&layout).paginate(
            &seq,
            &[10.0, 300.0],
            &PageBudgets::from_layout(&layout, false),
        );
        assert_eq!(plan.len(), 2);
        assert!(plan.pages.iter().all(|p| !p.blocks.is_empty()));
    }

    #[test]
    fn sections_never_share_pages() {
        let layout = LayoutConfig::default();
        let mut menu = menu_with(1);
        menu.title = Some("Osteria".into());
        menu.allergens = vec![crate::model::Allergen {
            id: "g".into(),
            code: "1".into(),
            name: "Gluten".into(),
            icon_url: None,
        }];
        let seq = build_sequence(&menu, &layout);
        let heights = vec![5.0; seq.len()];
        let plan = Paginator::new(&layout).paginate(
            &seq,
            &heights,
            &PageBudgets::from_layout(&layout, false),
        );
        let classes: Vec<_> = plan.pages.iter().map(|p| p.class).collect();
        assert_eq!(
            classes,
            vec![PageClass::Cover, PageClass::ContentOdd, PageClass::Allergen]
        );
        assert_eq!(plan.assignment(), vec![0, 1, 1, 2, 2]);
        assert_eq!(plan.page_of(4), Some(2));
        let numbers: Vec<_> = plan.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn empty_sequence_has_no_pages() {
        let layout = LayoutConfig::default();
        let plan = Paginator::new(&layout).paginate(
            &BlockSequence::default(),
            &[],
            &PageBudgets::from_layout(&layout, false),
        );
        assert!(plan.is_empty());
    }
}
