//! # Carta
//!
//! A print-layout engine for restaurant menus.
//!
//! A menu is a list of atomic blocks: category headers, products, notes,
//! a service line. None of them may be split across a page. Carta measures
//! every block once, assigns blocks to pages in a single forward pass, and
//! then draws that same assignment twice: as a positioned preview a UI can
//! show, and as a PDF. The two cannot disagree about which block lands on
//! which page because neither of them paginates.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [config]   — Partial layout resolved into concrete margins and styles
//!       ↓
//!   [block]    — Menu flattened into an ordered block sequence
//!       ↓
//!   [measure]  — Height of each block in mm (render or analytic)
//!       ↓
//!   [layout]   — Blocks assigned to pages
//!       ↓
//!   [preview] / [pdf]
//! ```

pub mod units;
pub mod error;
pub mod style;
pub mod config;
pub mod model;
pub mod block;
pub mod font;
pub mod text;
pub mod image_loader;
pub mod preview;
pub mod measure;
pub mod layout;
pub mod pdf;
pub mod pipeline;

pub use error::{CartaError, Result};
pub use pipeline::{Engine, PaginationResult, PassGuard, Strategy};

use config::LayoutConfig;
use model::MenuDocument;
use preview::PreviewDocument;

/// Parse an input document and resolve its layout.
pub fn parse_document(json: &str) -> Result<(MenuDocument, LayoutConfig)> {
    let doc: MenuDocument = serde_json::from_str(json)?;
    let layout = LayoutConfig::resolve(&doc.layout);
    Ok((doc, layout))
}

/// Paginate a menu document described as JSON.
pub fn paginate_json(json: &str, strategy: Strategy) -> Result<PaginationResult> {
    let (doc, layout) = parse_document(json)?;
    let engine = Engine::for_document(&doc)?.with_strategy(strategy);
    Ok(engine.paginate(&doc.menu, &layout))
}

/// Paginate and render the preview scene for a JSON menu document.
pub fn preview_json(json: &str, strategy: Strategy) -> Result<PreviewDocument> {
    let (doc, layout) = parse_document(json)?;
    let engine = Engine::for_document(&doc)?.with_strategy(strategy);
    let result = engine.paginate(&doc.menu, &layout);
    engine.preview(&result, &layout)
}

/// Paginate and render a JSON menu document to PDF bytes.
pub fn render_json(json: &str, strategy: Strategy) -> Result<Vec<u8>> {
    let (doc, layout) = parse_document(json)?;
    let engine = Engine::for_document(&doc)?.with_strategy(strategy);
    let result = engine.paginate(&doc.menu, &layout);
    engine.render_pdf(&result, &layout, &doc.menu)
}
