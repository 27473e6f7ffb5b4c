//! Text metrics.
//!
//! Glyph shaping lives outside this crate. Renderers only need ascent,
//! descent and advance width, and the raster backend optionally glyph
//! outlines, all of which come through [`TextLayout`].

use crate::types::{BezPoint, Font};

/// The text-layout service renderers measure strings with.
pub trait TextLayout {
    /// Distance from baseline to the top of the line box.
    fn ascent(&self, font: &Font, height: f64) -> f64;

    /// Distance from baseline to the bottom of the line box.
    fn descent(&self, font: &Font, height: f64) -> f64;

    /// Advance width of `text` set in `font` at `height`.
    fn string_width(&self, text: &str, font: &Font, height: f64) -> f64;

    /// Outlines of the glyphs of `text`, relative to a baseline origin at
    /// (0, 0). Services that cannot shape return an empty list.
    fn glyph_outlines(&self, _text: &str, _font: &Font, _height: f64) -> Vec<Vec<BezPoint>> {
        Vec::new()
    }
}

/// Advance widths of the printable ASCII characters, in hundredths of an
/// average character.
const AW_CHAR: [u8; 95] = [
    45, 55, 62, 115, 90, 132, 125, 40, //
    55, 55, 71, 115, 45, 48, 45, 50, //
    91, 91, 91, 91, 91, 91, 91, 91, //
    91, 91, 50, 50, 120, 120, 120, 78, //
    142, 102, 105, 110, 115, 105, 98, 105, //
    125, 58, 58, 107, 95, 145, 125, 115, //
    95, 115, 107, 95, 97, 118, 102, 150, //
    100, 93, 100, 58, 50, 58, 119, 72, //
    72, 86, 92, 80, 92, 85, 52, 92, //
    92, 47, 47, 88, 48, 135, 92, 86, //
    92, 92, 69, 75, 58, 92, 80, 121, //
    81, 80, 76, 91, 49, 91, 118,
];

/// Metrics from a fixed proportional width table.
///
/// Good enough for layout when no real font machinery is around: every
/// font is measured like a generic sans face, non-ASCII characters count
/// as one average character.
#[derive(Clone, Copy, Debug)]
pub struct ProportionalMetrics {
    /// Width of an average character as a fraction of the font height.
    pub char_width: f64,
}

impl Default for ProportionalMetrics {
    fn default() -> Self {
        Self { char_width: 0.55 }
    }
}

impl ProportionalMetrics {
    /// Sum of the table widths of `text`, in hundredths of a character.
    pub fn text_length(text: &str) -> u32 {
        text.chars()
            .map(|c| {
                if (' '..='~').contains(&c) {
                    AW_CHAR[c as usize - 0x20] as u32
                } else {
                    100
                }
            })
            .sum()
    }
}

impl TextLayout for ProportionalMetrics {
    fn ascent(&self, _font: &Font, height: f64) -> f64 {
        height * 0.8
    }

    fn descent(&self, _font: &Font, height: f64) -> f64 {
        height * 0.2
    }

    fn string_width(&self, text: &str, _font: &Font, height: f64) -> f64 {
        Self::text_length(text) as f64 * 0.01 * self.char_width * height
    }
}
