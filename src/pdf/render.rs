//! Draw a paginated plan into a PDF.
//!
//! Blocks are laid out by the same [`layout_block`] the preview uses, at the
//! same measure width, but with [`BuiltinFonts`] metrics because the PDF only
//! embeds the standard faces. The plan is drawn as given; nothing here moves
//! a block to another page. A block that draws taller than the height it was
//! paginated with is logged at `warn`, since it can run into the next block
//! or past the bottom margin.

use crate::block::BlockId;
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::image_loader::{AssetCache, AssetResolver};
use crate::pipeline::PaginationResult;
use crate::preview::{block_offsets_mm, layout_block, layout_footer, BlockBox, BoxItem};
use crate::text::BuiltinFonts;
use crate::units::{mm_to_pt, mm_to_px, px_to_mm, px_to_pt};

use super::{Metadata, PdfCanvas, PdfWriter};

/// Drawn heights may exceed reserved ones by this much (mm) before a block
/// counts as overdrawn.
const OVERDRAW_EPSILON_MM: f64 = 0.01;

/// Render every page of `result.plan` and return the PDF bytes.
pub fn render_pdf(
    result: &PaginationResult,
    layout: &LayoutConfig,
    assets: &dyn AssetResolver,
    metadata: Metadata,
) -> Result<Vec<u8>> {
    let (pdf, overdrawn) = render_pages(result, layout, assets, metadata);
    if !overdrawn.is_empty() {
        log::warn!(
            "{} block(s) drawn taller than their reserved height: {:?}",
            overdrawn.len(),
            overdrawn
        );
    }
    Ok(pdf)
}

/// Draw every page; also returns the blocks that came out taller than the
/// height the plan reserved for them.
fn render_pages(
    result: &PaginationResult,
    layout: &LayoutConfig,
    assets: &dyn AssetResolver,
    metadata: Metadata,
) -> (Vec<u8>, Vec<BlockId>) {
    let measurer = BuiltinFonts;
    let cache = AssetCache::new(assets);
    let offsets = block_offsets_mm(&result.plan, &result.heights, layout.block_spacing_mm);
    let page_w = mm_to_pt(layout.page.width_mm);
    let page_h = mm_to_pt(layout.page.height_mm);

    let mut writer = PdfWriter::new(metadata);
    let mut overdrawn = Vec::new();

    for page in &result.plan.pages {
        let mut canvas = PdfCanvas::new(&mut writer, page_w, page_h);
        let width_px = mm_to_px(layout.measure_width_mm(page.class));
        let left = mm_to_pt(page.margins.left);

        for id in page.block_ids() {
            let Some(block) = result.sequence.get(id) else {
                continue;
            };
            let content = layout_block(block, layout, width_px, &measurer);

            let drawn_mm = px_to_mm(content.extent());
            let reserved_mm = result.heights.get(id).copied().unwrap_or(0.0);
            if exceeds_reserved(drawn_mm, reserved_mm) {
                log::warn!(
                    "block {} ({}) on page {} draws {:.2}mm but {:.2}mm were reserved",
                    id,
                    block.kind_name(),
                    page.number,
                    drawn_mm,
                    reserved_mm
                );
                overdrawn.push(id);
            }

            let top = mm_to_pt(page.margins.top + offsets.get(id).copied().unwrap_or(0.0));
            draw_box(&mut canvas, &content, left, top, &cache);
        }

        if let (Some(text), true) = (&result.footer_text, page.class.is_content()) {
            let reserve = result.budgets.footer_reserve_mm;
            if reserve > 0.0 {
                let footer = layout_footer(text, layout, page.class, reserve, &measurer);
                draw_box(&mut canvas, &footer, 0.0, 0.0, &cache);
            }
        }

        log::debug!("pdf page {} ({:?}) drawn", page.number, page.class);
        canvas.finish();
    }

    log::debug!("pdf written with {} pages", writer.page_count());
    (writer.finish(), overdrawn)
}

fn exceeds_reserved(drawn_mm: f64, reserved_mm: f64) -> bool {
    drawn_mm > reserved_mm + OVERDRAW_EPSILON_MM
}

/// Draw a laid-out box with its top-left corner at (`left`, `top`) points.
fn draw_box(canvas: &mut PdfCanvas<'_>, content: &BlockBox, left: f64, top: f64, cache: &AssetCache<'_>) {
    for item in &content.items {
        match item {
            BoxItem::Text(t) => canvas.draw_text(
                left + px_to_pt(t.x),
                top + px_to_pt(t.y),
                px_to_pt(t.line_height),
                &t.text,
                &t.font,
                t.color,
            ),
            BoxItem::Image(i) => {
                let (x, y) = (left + px_to_pt(i.x), top + px_to_pt(i.y));
                let (w, h) = (px_to_pt(i.width), px_to_pt(i.height));
                match i.url.as_deref().and_then(|url| cache.get(url).map(|img| (url, img))) {
                    Some((url, image)) => canvas.draw_image(url, &image, x, y, w, h),
                    None => canvas.draw_placeholder(x, y, w, h),
                }
            }
        }
    }
}
