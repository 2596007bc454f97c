//! Render-and-measure: mount the block off-screen, read the realized box.

use std::time::Duration;

use crate::block::ContentBlock;
use crate::config::LayoutConfig;
use crate::font::FontContext;
use crate::preview::{layout_block, BlockBox};
use crate::units::{mm_to_px, px_to_mm};

use super::BlockMeasurer;

/// Multiplier applied to every realized height to absorb renderer rounding.
pub const SAFETY_FACTOR: f64 = 1.03;

/// The off-screen surface blocks are mounted on while being measured.
///
/// Owned by the caller for the duration of one pass: acquire it before
/// measuring, release it after. It is never shared between passes, and holds
/// at most one mounted block at a time.
#[derive(Debug)]
pub struct MeasurementContext {
    mounted: Option<BlockBox>,
    settle: Duration,
    mounts: usize,
}

impl MeasurementContext {
    pub fn acquire() -> Self {
        log::debug!("measurement context acquired");
        Self {
            mounted: None,
            settle: Duration::ZERO,
            mounts: 0,
        }
    }

    /// Wait this long after mounting before reading the box.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn mounts(&self) -> usize {
        self.mounts
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_none()
    }

    fn mount(&mut self, content: BlockBox) {
        debug_assert!(self.mounted.is_none(), "one block at a time");
        self.mounted = Some(content);
        self.mounts += 1;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
    }

    /// Height of the mounted block's bounding box, in px.
    fn realized_height(&self) -> f64 {
        self.mounted.as_ref().map_or(0.0, BlockBox::extent)
    }

    fn unmount(&mut self) {
        self.mounted = None;
    }

    pub fn release(self) {
        log::debug!("measurement context released after {} mounts", self.mounts);
    }
}

/// Measures blocks by laying them out through the preview renderer.
pub struct RenderMeasurer<'a> {
    fonts: &'a FontContext,
    context: &'a mut MeasurementContext,
}

impl<'a> RenderMeasurer<'a> {
    pub fn new(fonts: &'a FontContext, context: &'a mut MeasurementContext) -> Self {
        Self { fonts, context }
    }
}

impl BlockMeasurer for RenderMeasurer<'_> {
    fn measure(&mut self, block: &ContentBlock, layout: &LayoutConfig, width_mm: f64) -> f64 {
        let content = layout_block(block, layout, mm_to_px(width_mm), self.fonts);
        self.context.mount(content);
        let height_px = self.context.realized_height();
        self.context.unmount();
        px_to_mm(height_px) * SAFETY_FACTOR
    }

    fn name(&self) -> &'static str {
        "render"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build_sequence;
    use crate::model::{Category, Menu, Product};

    #[test]
    fn measures_with_safety_factor_and_unmounts() {
        let layout = LayoutConfig::default();
        let menu = Menu {
            categories: vec![Category {
                id: "c".into(),
                name: "Antipasti".into(),
                products: vec![Product {
                    id: "p".into(),
                    name: "Bruschetta".into(),
                    ..Default::default()
                }],
            }],
            ..Default::default()
        };
        let seq = build_sequence(&menu, &layout);
        let fonts = FontContext::new();
        let mut ctx = MeasurementContext::acquire();

        let h = {
            let mut m = RenderMeasurer::new(&fonts, &mut ctx);
            m.measure(seq.get(1).unwrap(), &layout, 170.0)
        };
        let title = &layout.elements.product_title;
        let expected = (title.line_height_mm() + title.margin.vertical()) * SAFETY_FACTOR;
        assert!((h - expected).abs() < 1e-6);
        assert!(ctx.is_empty());
        assert_eq!(ctx.mounts(), 1);
        ctx.release();
    }
}
