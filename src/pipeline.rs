//! # Pipeline
//!
//! Wires the stages together for one menu and one layout:
//!
//! ```text
//! Menu + LayoutConfig
//!       ↓
//!   build_sequence      (block)
//!       ↓
//!   MeasurementOracle   (measure, one block at a time)
//!       ↓
//!   Paginator           (layout)
//!       ↓
//!   PaginationResult ──→ render_preview / render_pdf
//! ```
//!
//! A [`PaginationResult`] is immutable once built; the preview and the PDF
//! both read it and neither can change the page assignment.
//!
//! Layout edits can arrive faster than passes finish. [`PassGuard`] hands out
//! a token per pass and only the newest token is accepted when results come
//! back.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::block::{build_sequence, service_line_text, BlockSequence};
use crate::config::LayoutConfig;
use crate::error::{CartaError, Result};
use crate::font::FontContext;
use crate::image_loader::{decode_inline, AssetResolver, DefaultResolver};
use crate::layout::{PageBudgets, PagePlan, Paginator};
use crate::measure::{
    cross_check, AnalyticMeasurer, Divergence, MeasurementContext, MeasurementOracle,
    RenderMeasurer,
};
use crate::model::{FontEntry, Menu, MenuDocument};
use crate::pdf::{self, Metadata};
use crate::preview::{render_preview, PreviewDocument};

/// Which measurer feeds the paginator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lay each block out off-screen and read its height.
    #[default]
    Render,
    /// Estimate line counts from character counts.
    Analytic,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "render" => Ok(Strategy::Render),
            "analytic" => Ok(Strategy::Analytic),
            other => Err(format!("unknown strategy '{}' (expected render or analytic)", other)),
        }
    }
}

/// Everything one pass produced, in the order it was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub sequence: BlockSequence,
    /// Height in mm per block, indexed by block id.
    pub heights: Vec<f64>,
    pub plan: PagePlan,
    pub budgets: PageBudgets,
    /// Service line drawn in the footer strip of content pages, if any.
    pub footer_text: Option<String>,
    pub strategy: Strategy,
}

impl PaginationResult {
    pub fn page_count(&self) -> usize {
        self.plan.len()
    }
}

/// Fonts, assets and measuring strategy for a run.
pub struct Engine {
    fonts: FontContext,
    assets: Box<dyn AssetResolver>,
    strategy: Strategy,
    settle: Duration,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
            assets: Box::new(DefaultResolver::new()),
            strategy: Strategy::default(),
            settle: Duration::ZERO,
        }
    }

    /// An engine for a parsed input document: its fonts registered and its
    /// inline assets available to the resolver.
    pub fn for_document(doc: &MenuDocument) -> Result<Self> {
        let mut engine = Self::new()
            .with_assets(Box::new(DefaultResolver::new().with_assets(doc.assets.clone())));
        engine.register_fonts(&doc.fonts)?;
        Ok(engine)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_assets(mut self, assets: Box<dyn AssetResolver>) -> Self {
        self.assets = assets;
        self
    }

    /// Delay between mounting a block and reading its height.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    pub fn assets(&self) -> &dyn AssetResolver {
        self.assets.as_ref()
    }

    /// Register custom fonts. Weight follows the `bold` flag.
    pub fn register_fonts(&mut self, entries: &[FontEntry]) -> Result<()> {
        for entry in entries {
            let data = decode_inline(&entry.src)
                .map_err(|e| CartaError::Font(format!("font '{}': {}", entry.family, e)))?;
            let weight = if entry.bold { 700 } else { 400 };
            self.fonts
                .registry_mut()
                .register(&entry.family, weight, entry.italic, data)?;
        }
        Ok(())
    }

    /// Block heights for a sequence with the configured strategy.
    pub fn measure(&self, seq: &BlockSequence, layout: &LayoutConfig) -> Vec<f64> {
        match self.strategy {
            Strategy::Render => {
                let mut context = MeasurementContext::acquire().with_settle(self.settle);
                let heights = {
                    let measurer = RenderMeasurer::new(&self.fonts, &mut context);
                    MeasurementOracle::new(measurer, layout).heights(seq)
                };
                context.release();
                heights
            }
            Strategy::Analytic => MeasurementOracle::new(AnalyticMeasurer::new(), layout).heights(seq),
        }
    }

    /// Build, measure and paginate.
    pub fn paginate(&self, menu: &Menu, layout: &LayoutConfig) -> PaginationResult {
        let sequence = build_sequence(menu, layout);
        let heights = self.measure(&sequence, layout);
        let budgets = PageBudgets::from_layout(layout, menu.has_service_charge());
        let plan = Paginator::new(layout).paginate(&sequence, &heights, &budgets);
        let footer_text = (budgets.footer_reserve_mm > 0.0).then(|| service_line_text(menu, layout));

        log::info!(
            "paginated {} blocks into {} pages ({:?} measurement)",
            sequence.len(),
            plan.len(),
            self.strategy
        );

        PaginationResult {
            sequence,
            heights,
            plan,
            budgets,
            footer_text,
            strategy: self.strategy,
        }
    }

    pub fn preview(&self, result: &PaginationResult, layout: &LayoutConfig) -> Result<PreviewDocument> {
        render_preview(result, layout, &self.fonts)
    }

    pub fn render_pdf(&self, result: &PaginationResult, layout: &LayoutConfig, menu: &Menu) -> Result<Vec<u8>> {
        let metadata = Metadata {
            title: menu.title.clone(),
            language: Some(menu.language.clone()).filter(|l| !l.trim().is_empty()),
        };
        pdf::render_pdf(result, layout, self.assets.as_ref(), metadata)
    }

    /// Measure with both strategies and report blocks that disagree by more
    /// than `tolerance`.
    pub fn cross_check(&self, seq: &BlockSequence, layout: &LayoutConfig, tolerance: f64) -> Vec<Divergence> {
        let mut context = MeasurementContext::acquire();
        let divergences = {
            let mut render = RenderMeasurer::new(&self.fonts, &mut context);
            let mut analytic = AnalyticMeasurer::new();
            cross_check(&mut render, &mut analytic, seq, layout, tolerance)
        };
        context.release();
        divergences
    }
}

/// Identifies one pagination pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassToken(u64);

/// Accepts only the result of the most recently started pass.
#[derive(Debug, Default)]
pub struct PassGuard {
    latest: u64,
}

impl PassGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass. Any pass started earlier becomes stale.
    pub fn begin(&mut self) -> PassToken {
        self.latest += 1;
        PassToken(self.latest)
    }

    pub fn is_current(&self, token: PassToken) -> bool {
        token.0 == self.latest
    }

    /// Whether a finished pass may publish its result.
    pub fn accept(&self, token: PassToken) -> bool {
        let current = self.is_current(token);
        if !current {
            log::debug!("discarding stale pass {} (latest is {})", token.0, self.latest);
        }
        current
    }
}
