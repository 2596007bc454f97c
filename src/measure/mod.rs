//! # Measurement Oracle
//!
//! Answers one question: how tall is this block, in millimeters, under this
//! layout? Pagination is only as good as this answer.
//!
//! Two strategies implement [`BlockMeasurer`]:
//!
//! - [`RenderMeasurer`] mounts the block on an off-screen
//!   [`MeasurementContext`] through the preview renderer and reads back the
//!   realized height. This is the accurate one.
//! - [`AnalyticMeasurer`] estimates line counts from character counts. It
//!   needs no fonts and serves as fallback and as a sanity check.
//!
//! [`MeasurementOracle`] caches results per block for one layout, and
//! [`cross_check`] reports blocks where the two strategies disagree.

pub mod analytic;
pub mod render;

use std::collections::HashMap;

use serde::Serialize;

use crate::block::{BlockId, BlockSequence, ContentBlock, Section};
use crate::config::{LayoutConfig, PageClass};

pub use analytic::AnalyticMeasurer;
pub use render::{MeasurementContext, RenderMeasurer};

/// Relative difference above which strategies are reported as diverging.
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Measures the height of a single block.
pub trait BlockMeasurer {
    /// Height in millimeters, vertical margins included, at `width_mm`.
    fn measure(&mut self, block: &ContentBlock, layout: &LayoutConfig, width_mm: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// The width a block is measured at.
pub fn measure_width_mm(block: &ContentBlock, layout: &LayoutConfig) -> f64 {
    let class = match block.section() {
        Section::Cover => PageClass::Cover,
        Section::Content => PageClass::ContentOdd,
        Section::Allergen => PageClass::Allergen,
    };
    layout.measure_width_mm(class)
}

/// A measuring strategy with a per-block cache for one layout.
///
/// The cache is keyed by block id, which is only stable within one sequence
/// and one layout; build a new oracle when either changes.
pub struct MeasurementOracle<'l, M: BlockMeasurer> {
    strategy: M,
    layout: &'l LayoutConfig,
    cache: HashMap<BlockId, f64>,
}

impl<'l, M: BlockMeasurer> MeasurementOracle<'l, M> {
    pub fn new(strategy: M, layout: &'l LayoutConfig) -> Self {
        Self {
            strategy,
            layout,
            cache: HashMap::new(),
        }
    }

    /// Height of one block, measured at most once.
    pub fn height(&mut self, block: &ContentBlock) -> f64 {
        if let Some(h) = self.cache.get(&block.id()) {
            return *h;
        }
        let width = measure_width_mm(block, self.layout);
        let h = self.strategy.measure(block, self.layout, width);
        let h = if h.is_finite() { h.max(0.0) } else { 0.0 };
        log::debug!(
            "{} measured block {} ({}) at {:.2}mm",
            self.strategy.name(),
            block.id(),
            block.kind_name(),
            h
        );
        self.cache.insert(block.id(), h);
        h
    }

    /// Heights of every block in order, one block at a time.
    pub fn heights(&mut self, seq: &BlockSequence) -> Vec<f64> {
        seq.iter().map(|block| self.height(block)).collect()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn into_strategy(self) -> M {
        self.strategy
    }
}

/// A block whose two measurements differ by more than the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub block_id: BlockId,
    pub kind: &'static str,
    pub primary_mm: f64,
    pub secondary_mm: f64,
    /// |a - b| / max(a, b)
    pub relative: f64,
}

/// Relative difference of two heights. Two zeros agree.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let largest = a.abs().max(b.abs());
    if largest == 0.0 {
        0.0
    } else {
        (a - b).abs() / largest
    }
}

/// Measure every block with both strategies and report the disagreements.
pub fn cross_check(
    primary: &mut dyn BlockMeasurer,
    secondary: &mut dyn BlockMeasurer,
    seq: &BlockSequence,
    layout: &LayoutConfig,
    tolerance: f64,
) -> Vec<Divergence> {
    let mut out = Vec::new();
    for block in seq.iter() {
        let width = measure_width_mm(block, layout);
        let a = primary.measure(block, layout, width);
        let b = secondary.measure(block, layout, width);
        let relative = relative_difference(a, b);
        if relative > tolerance {
            log::warn!(
                "block {} ({}): {} says {:.2}mm, {} says {:.2}mm ({:.0}% apart)",
                block.id(),
                block.kind_name(),
                primary.name(),
                a,
                secondary.name(),
                b,
                relative * 100.0
            );
            out.push(Divergence {
                block_id: block.id(),
                kind: block.kind_name(),
                primary_mm: a,
                secondary_mm: b,
                relative,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build_sequence;
    use crate::model::{Category, Menu, Product};

    /// Counts calls; reports a fixed height per block.
    struct Counting {
        calls: usize,
        height: f64,
    }

    impl BlockMeasurer for Counting {
        fn measure(&mut self, _: &ContentBlock, _: &LayoutConfig, _: f64) -> f64 {
            self.calls += 1;
            self.height
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn seq() -> BlockSequence {
        let menu = Menu {
            categories: vec![Category {
                id: "c".into(),
                name: "Dolci".into(),
                products: vec![
                    Product {
                        id: "p1".into(),
                        name: "Tiramisu".into(),
                        ..Default::default()
                    },
                    Product {
                        id: "p2".into(),
                        name: "Panna cotta".into(),
                        ..Default::default()
                    },
                ],
            }],
            ..Default::default()
        };
        build_sequence(&menu, &LayoutConfig::default())
    }

    #[test]
    fn oracle_measures_each_block_once() {
        let layout = LayoutConfig::default();
        let seq = seq();
        let mut oracle = MeasurementOracle::new(
            Counting {
                calls: 0,
                height: 12.0,
            },
            &layout,
        );
        let first = oracle.heights(&seq);
        let second = oracle.heights(&seq);
        assert_eq!(first, second);
        assert_eq!(oracle.cached(), 3);
        assert_eq!(oracle.into_strategy().calls, 3);
    }

    #[test]
    fn oracle_sanitizes_nonsense() {
        let layout = LayoutConfig::default();
        let seq = seq();
        let mut oracle = MeasurementOracle::new(
            Counting {
                calls: 0,
                height: f64::NAN,
            },
            &layout,
        );
        assert!(oracle.heights(&seq).iter().all(|h| *h == 0.0));
    }

    #[test]
    fn cross_check_reports_only_large_gaps() {
        let layout = LayoutConfig::default();
        let seq = seq();
        let mut a = Counting {
            calls: 0,
            height: 10.0,
        };
        let mut close = Counting {
            calls: 0,
            height: 10.5,
        };
        let mut far = Counting {
            calls: 0,
            height: 15.0,
        };
        assert!(cross_check(&mut a, &mut close, &seq, &layout, DEFAULT_TOLERANCE).is_empty());
        let divergences = cross_check(&mut a, &mut far, &seq, &layout, DEFAULT_TOLERANCE);
        assert_eq!(divergences.len(), 3);
        assert!((divergences[0].relative - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn relative_difference_edges() {
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert_eq!(relative_difference(0.0, 5.0), 1.0);
        assert!((relative_difference(9.0, 10.0) - 0.1).abs() < 1e-12);
    }
}
