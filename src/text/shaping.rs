//! # OpenType Shaping
//!
//! Wraps rustybuzz so registered custom fonts measure with their real
//! advances, kerning and ligatures.
//!
//! Built-in PDF fonts bypass shaping entirely. They have no GSUB/GPOS tables
//! and are measured from their AFM widths.

/// A single glyph produced by OpenType shaping.
#[derive(Debug, Clone)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Byte offset of the first input character mapped to this glyph.
    pub cluster: u32,
    /// Horizontal advance in font units.
    pub x_advance: i32,
}

/// Shape text using the given font data.
///
/// Returns `None` if the font data can't be parsed.
pub fn shape_text(text: &str, font_data: &[u8]) -> Option<Vec<ShapedGlyph>> {
    let face = rustybuzz::Face::from_slice(font_data, 0)?;
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);

    let output = rustybuzz::shape(&face, &[], buffer);

    let glyphs = output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions().iter())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            cluster: info.cluster,
            x_advance: pos.x_advance,
        })
        .collect();

    Some(glyphs)
}

/// Total advance width of shaped glyphs in points.
pub fn shaped_width(glyphs: &[ShapedGlyph], units_per_em: u16, font_size: f64) -> f64 {
    let scale = font_size / units_per_em as f64;
    glyphs.iter().map(|g| g.x_advance as f64 * scale).sum()
}

/// Per-character widths in points from shaped glyphs.
///
/// The first character of a cluster carries the whole cluster's advance;
/// the other characters of a ligature get zero.
pub fn cluster_widths(text: &str, glyphs: &[ShapedGlyph], units_per_em: u16, font_size: f64) -> Vec<f64> {
    let scale = font_size / units_per_em as f64;

    // Cluster values are byte offsets.
    let mut byte_to_char = vec![usize::MAX; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }

    let mut widths = vec![0.0_f64; text.chars().count()];
    for glyph in glyphs {
        let char_idx = byte_to_char
            .get(glyph.cluster as usize)
            .copied()
            .unwrap_or(usize::MAX);
        if let Some(w) = widths.get_mut(char_idx) {
            *w += glyph.x_advance as f64 * scale;
        }
    }
    widths
}
