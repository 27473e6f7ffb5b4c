//! Dash pattern synthesis.
//!
//! Every backend turns `(LineStyle, dash_length)` into on/off runs with the
//! same arithmetic. What differs is how long a "dot" is relative to a dash
//! and how short a gap may get, so those two numbers travel together as a
//! [`DashConvention`].

use crate::types::LineStyle;

/// Dash lengths below this are raised to it before any pattern is built.
pub const MIN_DASH_LENGTH: f64 = 0.001;

/// Per-backend constants for dash synthesis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashConvention {
    /// Dot length as a fraction of the dash length.
    pub dot_factor: f64,
    /// Smallest gap emitted between runs, in output units.
    pub min_hole: f64,
}

impl DashConvention {
    /// PostScript, SVG and PSTricks: dot is a fifth of the dash.
    pub const DOCUMENT: DashConvention = DashConvention {
        dot_factor: 0.2,
        min_hole: 0.001,
    };

    /// Pixel surfaces: dot is a tenth of the dash, gaps at least one pixel.
    pub const RASTER: DashConvention = DashConvention {
        dot_factor: 0.1,
        min_hole: 1.0,
    };

    /// MetaPost, whose dots are drawn with a round pen and look larger.
    pub const METAPOST: DashConvention = DashConvention {
        dot_factor: 0.05,
        min_hole: 0.001,
    };

    pub fn dot_length(&self, dash_length: f64) -> f64 {
        clamp_dash_length(dash_length) * self.dot_factor
    }

    /// On/off run lengths for `style`. Solid yields an empty pattern.
    pub fn pattern(&self, style: LineStyle, dash_length: f64) -> Vec<f64> {
        let dash = clamp_dash_length(dash_length);
        self.runs(style, dash, dash * self.dot_factor)
    }

    /// Runs for already-resolved dash and dot lengths. Only the gaps are
    /// derived here.
    pub fn runs(&self, style: LineStyle, dash: f64, dot: f64) -> Vec<f64> {
        match style {
            LineStyle::Solid => Vec::new(),
            LineStyle::Dashed => vec![dash, dash],
            LineStyle::Dotted => vec![dot, dot],
            LineStyle::DashDot => {
                let hole = self.hole((dash - dot) / 2.0);
                vec![dash, hole, dot, hole]
            }
            LineStyle::DashDotDot => {
                let hole = self.hole((dash - 2.0 * dot) / 3.0);
                vec![dash, hole, dot, hole, dot, hole]
            }
        }
    }

    fn hole(&self, len: f64) -> f64 {
        len.max(self.min_hole)
    }
}

/// Raise a dash length to [`MIN_DASH_LENGTH`].
pub fn clamp_dash_length(len: f64) -> f64 {
    if len < MIN_DASH_LENGTH || len.is_nan() {
        MIN_DASH_LENGTH
    } else {
        len
    }
}

/// Number of runs a style produces.
pub fn pattern_len(style: LineStyle) -> usize {
    match style {
        LineStyle::Solid => 0,
        LineStyle::Dashed | LineStyle::Dotted => 2,
        LineStyle::DashDot => 4,
        LineStyle::DashDotDot => 6,
    }
}
