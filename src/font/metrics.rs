//! Glyph advance widths for the built-in PDF fonts.
//!
//! Widths come from the Adobe Font Metrics files shipped with every PDF
//! reader, in 1/1000 em, for printable ASCII (0x20..=0x7E). Characters
//! outside ASCII fold to their base letter when one exists (é → e), the euro
//! sign takes the figure width, and anything else falls back to the font's
//! default advance.
//!
//! Oblique and italic faces reuse the upright tables. For Helvetica and
//! Courier that is exact; Times-Italic is within a few percent of Roman.

/// Helvetica, 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

const COURIER: [u16; 95] = [600; 95];

/// Width table for one built-in face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
}

impl StandardFontMetrics {
    pub(crate) const fn helvetica(bold: bool) -> Self {
        if bold {
            Self {
                widths: &HELVETICA_BOLD,
                default_width: 556,
            }
        } else {
            Self {
                widths: &HELVETICA,
                default_width: 556,
            }
        }
    }

    pub(crate) const fn times(bold: bool) -> Self {
        if bold {
            Self {
                widths: &TIMES_BOLD,
                default_width: 500,
            }
        } else {
            Self {
                widths: &TIMES_ROMAN,
                default_width: 500,
            }
        }
    }

    pub(crate) const fn courier() -> Self {
        Self {
            widths: &COURIER,
            default_width: 600,
        }
    }

    /// Advance of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        match ch {
            ' '..='~' => self.widths[ch as usize - 0x20],
            '\u{00A0}' => self.widths[0],
            // Euro, en dash and figure-like symbols share the digit width.
            '€' | '–' | '£' | '¥' => self.widths['0' as usize - 0x20],
            '—' => 1000,
            '‘' | '’' | '‚' => self.widths['\'' as usize - 0x20],
            '“' | '”' | '„' => self.widths['"' as usize - 0x20],
            '•' | '·' => self.widths['.' as usize - 0x20],
            '\u{00AD}' | '\u{200B}' => 0,
            _ => match fold_to_ascii(ch) {
                Some(base) => self.widths[base as usize - 0x20],
                None => self.default_width,
            },
        }
    }

    /// Width of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

/// Map accented Latin letters to the ASCII letter they are drawn on.
pub(crate) fn fold_to_ascii(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ß' => 'b',
        'Š' => 'S',
        'š' => 's',
        'Ž' => 'Z',
        'ž' => 'z',
        _ => return None,
    };
    Some(base)
}
