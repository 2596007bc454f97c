//! # Text Layout
//!
//! Greedy line breaking on UAX#14 break opportunities.
//!
//! The breaker is generic over a [`TextMeasurer`] so the preview (which
//! measures with the full [`FontContext`], custom fonts included) and the PDF
//! renderer (which only ever draws with built-in faces, see [`BuiltinFonts`])
//! run the same algorithm on their own metrics.

pub mod shaping;

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontContext, ResolvedFont, StandardFont};
use crate::style::FontSpec;

/// Per-character advance widths in points.
pub trait TextMeasurer {
    fn char_widths(&self, text: &str, font: &FontSpec) -> Vec<f64>;

    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        self.char_widths(text, font).iter().sum()
    }
}

impl TextMeasurer for FontContext {
    fn char_widths(&self, text: &str, font: &FontSpec) -> Vec<f64> {
        match self.resolve(font) {
            ResolvedFont::Standard(std_font) => std_font_widths(std_font, text, font.size_pt),
            ResolvedFont::Custom(custom) => match shaping::shape_text(text, &custom.data) {
                Some(glyphs) => shaping::cluster_widths(
                    text,
                    &glyphs,
                    custom.metrics.units_per_em,
                    font.size_pt,
                ),
                None => text
                    .chars()
                    .map(|ch| custom.metrics.char_width(ch, font.size_pt))
                    .collect(),
            },
        }
    }
}

/// Metrics of the built-in PDF faces only. Registered custom fonts are
/// ignored and every family maps through [`StandardFont::for_spec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFonts;

impl TextMeasurer for BuiltinFonts {
    fn char_widths(&self, text: &str, font: &FontSpec) -> Vec<f64> {
        std_font_widths(StandardFont::for_spec(font), text, font.size_pt)
    }
}

fn std_font_widths(font: StandardFont, text: &str, size: f64) -> Vec<f64> {
    let metrics = font.metrics();
    text.chars().map(|ch| metrics.char_width(ch, size)).collect()
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in points, trailing whitespace excluded.
    pub width: f64,
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Break opportunities indexed by char position: entry `i` is the
/// opportunity *before* `chars[i]`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    BrokenLine {
        text: chars[..end].iter().collect(),
        width: widths[..end].iter().sum(),
    }
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Breaks at the last UAX#14 opportunity before the overflow; a word wider
/// than the line is split at the overflowing character. Explicit newlines
/// always break. Empty or whitespace-only text yields no lines.
pub fn break_into_lines(
    measurer: &impl TextMeasurer,
    text: &str,
    max_width: f64,
    font: &FontSpec,
) -> Vec<BrokenLine> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut widths = measurer.char_widths(text, font);
    widths.resize(chars.len(), 0.0);
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                    lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
                    line_start = i;
                    line_width = 0.0;
                    last_break = None;
                }
                Some(BreakOpportunity::Allowed) => last_break = Some(i),
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        let w = widths[i];
        if line_width + w > max_width && line_start < i && !ch.is_whitespace() {
            match last_break.filter(|bp| *bp > line_start) {
                Some(bp) => {
                    lines.push(make_line(&chars[line_start..bp], &widths[line_start..bp]));
                    line_start = bp;
                    line_width = widths[bp..=i].iter().sum();
                }
                None => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                    line_start = i;
                    line_width = w;
                }
            }
            last_break = None;
            continue;
        }

        line_width += w;
    }

    if line_start < chars.len() {
        let end = chars.len() - usize::from(is_newline(chars[chars.len() - 1]));
        if line_start < end {
            lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
        }
    }

    lines
}
