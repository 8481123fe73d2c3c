//! Font handling for the report writer.
//!
//! Reports are set in the built-in Helvetica faces that every PDF viewer
//! ships with, so no font files have to be located or embedded.  printpdf
//! carries no glyph metrics for those faces, so this module provides the
//! widths needed to align and wrap text before it is drawn.

mod metrics;

use printpdf::BuiltinFont;
use serde::{Deserialize, Serialize};

/// Cap height of Helvetica as a fraction of the font size.
pub const CAP_HEIGHT: f64 = 0.718;

/// Byte substituted for characters that WinAnsi cannot represent.
const REPLACEMENT_BYTE: u8 = b'?';

/// The faces of the standard Helvetica family used by the report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    /// The printpdf built-in font drawn for this face.
    pub fn builtin_font(self) -> BuiltinFont {
        match self {
            FontWeight::Regular => BuiltinFont::Helvetica,
            FontWeight::Bold => BuiltinFont::HelveticaBold,
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontWeight::Regular => &metrics::HELVETICA,
            FontWeight::Bold => &metrics::HELVETICA_BOLD,
        }
    }

    fn glyph_width(self, byte: u8) -> u16 {
        byte.checked_sub(metrics::FIRST_CHAR)
            .and_then(|index| self.widths().get(usize::from(index)))
            .copied()
            .unwrap_or(metrics::FALLBACK_WIDTH)
    }
}

/// Returns the rendered width of `text` in points.
pub fn text_width(text: &str, weight: FontWeight, size: f64) -> f64 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|byte| u32::from(weight.glyph_width(byte)))
        .sum();
    f64::from(units) * size / 1000.0
}

/// Maps `text` to the `/WinAnsiEncoding` bytes printpdf writes for built-in fonts.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        ' '..='~' | '\u{a0}'..='\u{ff}' => ch as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        '\t' => b' ',
        _ => REPLACEMENT_BYTE,
    }
}

/// Breaks `text` into lines no wider than `max_width` points.
///
/// Lines break at whitespace; a single word wider than the limit is split
/// between characters.  The result always holds at least one line.
pub fn wrap_text(text: &str, weight: FontWeight, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, weight, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, weight, size) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = split_word(word, weight, size, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_word(word: &str, weight: FontWeight, size: f64, max_width: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && text_width(&current, weight, size) > max_width {
            current.pop();
            pieces.push(std::mem::replace(&mut current, ch.to_string()));
        }
    }
    pieces.push(current);
    pieces
}
