//! # Page Break Decisions
//!
//! The per-block rule the paginator applies. Blocks are atomic, so there is
//! no split case: a block either lands on the current page, moves to the
//! next one, or (when it could never fit anywhere) gets a page to itself.

/// What to do with the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// The block fits on the current page.
    Place,
    /// Close the current page and start the block on a fresh one.
    MoveToNextPage,
    /// The block is taller than an empty page. It goes alone on its own
    /// page, which is flagged as overflowing.
    Isolate,
}

/// Decide where a block of `block_height` goes.
///
/// `used` is the height already consumed on the current page. Spacing is only
/// charged between blocks, never before the first block of a page.
pub fn decide(used: f64, block_height: f64, spacing: f64, budget: f64, page_empty: bool) -> BreakDecision {
    if block_height > budget {
        return BreakDecision::Isolate;
    }

    let needed = if page_empty {
        block_height
    } else {
        used + spacing + block_height
    };

    if needed <= budget {
        BreakDecision::Place
    } else {
        BreakDecision::MoveToNextPage
    }
}
