//! Value types shared by every renderer: points, colors, Bezier path
//! elements, rectangles, stroke enums, fonts and images.
//!
//! Coordinates are diagram units with y growing downward. Backends with a
//! bottom-up convention flip on output.

use std::sync::Arc;

use bitflags::bitflags;

use crate::errors::RenderError;

/// A position in diagram units.
pub type Point = glam::DVec2;

// ============================================================================
// Color
// ============================================================================

/// RGBA color with channels in `0.0..=1.0`.
///
/// Equality is exact component comparison; the lazy color caches in the
/// text backends rely on that.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue, alpha: 1.0 }
    }

    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Channels scaled to 0..=255, rounding to nearest.
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.red), c(self.green), c(self.blue), c(self.alpha)]
    }

    /// `#rrggbb`, rounding channels up like the SVG exporter always has.
    pub fn to_hex(self) -> String {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).ceil() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.red), c(self.green), c(self.blue))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

// ============================================================================
// Bezier paths
// ============================================================================

/// One element of a Bezier path.
///
/// A path starts with `MoveTo`. Further `MoveTo`s open additional subpaths,
/// which only backends advertising [`Capabilities::HOLES`] render as such.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BezPoint {
    MoveTo(Point),
    LineTo(Point),
    /// Two control points, then the end point.
    CurveTo(Point, Point, Point),
}

impl BezPoint {
    /// The point this element ends on.
    pub fn end(&self) -> Point {
        match *self {
            BezPoint::MoveTo(p) | BezPoint::LineTo(p) => p,
            BezPoint::CurveTo(_, _, p) => p,
        }
    }

    /// Apply `f` to every point carried by this element.
    pub fn map(self, f: impl Fn(Point) -> Point) -> BezPoint {
        match self {
            BezPoint::MoveTo(p) => BezPoint::MoveTo(f(p)),
            BezPoint::LineTo(p) => BezPoint::LineTo(f(p)),
            BezPoint::CurveTo(a, b, p) => BezPoint::CurveTo(f(a), f(b), f(p)),
        }
    }

    /// The same element ending at `p` instead.
    pub fn with_end(self, p: Point) -> BezPoint {
        match self {
            BezPoint::MoveTo(_) => BezPoint::MoveTo(p),
            BezPoint::LineTo(_) => BezPoint::LineTo(p),
            BezPoint::CurveTo(c1, c2, _) => BezPoint::CurveTo(c1, c2, p),
        }
    }

    pub fn is_move_to(&self) -> bool {
        matches!(self, BezPoint::MoveTo(_))
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle; `top < bottom` in diagram space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Smallest rect containing both corners, whatever their order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

// ============================================================================
// Stroke and fill enums
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineCaps {
    #[default]
    Butt,
    Round,
    Projecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    DashDotDot,
    Dotted,
}

/// Fill mode. `Pattern` needs [`Capabilities::PATTERN`]; other backends
/// fall back to `Solid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FillStyle {
    #[default]
    Solid,
    Pattern,
}

/// Horizontal text anchor relative to the drawing position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Horizontal shift for a string of the given width.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => -width / 2.0,
            Alignment::Right => -width,
        }
    }
}

bitflags! {
    /// Optional features a renderer may support.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Multiple subpaths in one Bezier path, filled even-odd.
        const HOLES = 1 << 0;
        /// Color alpha is honoured.
        const ALPHA = 1 << 1;
        /// Arbitrary affine transforms.
        const AFFINE = 1 << 2;
        /// Pattern and gradient fills.
        const PATTERN = 1 << 3;
    }
}

// ============================================================================
// Fonts
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Opaque font handle handed to the text-layout service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Font {
    pub family: Arc<str>,
    pub slant: FontSlant,
    pub weight: FontWeight,
}

impl Font {
    pub fn new(family: &str) -> Self {
        Self {
            family: Arc::from(family),
            slant: FontSlant::Normal,
            weight: FontWeight::Normal,
        }
    }

    pub fn with_slant(mut self, slant: FontSlant) -> Self {
        self.slant = slant;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    /// PostScript font name, e.g. `Helvetica-BoldOblique`.
    ///
    /// The generic families map onto the standard 35 fonts; anything else
    /// keeps its family name with spaces removed.
    pub fn ps_name(&self) -> String {
        let (base, italic) = match self.family.to_ascii_lowercase().as_str() {
            "sans" | "sans-serif" | "helvetica" | "arial" => ("Helvetica", "Oblique"),
            "serif" | "times" | "times new roman" => ("Times", "Italic"),
            "monospace" | "courier" => ("Courier", "Oblique"),
            _ => return self.family.replace(' ', ""),
        };
        let bold = self.weight == FontWeight::Bold;
        let slanted = self.slant != FontSlant::Normal;
        match (bold, slanted, base) {
            (false, false, "Times") => "Times-Roman".to_string(),
            (false, false, _) => base.to_string(),
            (true, false, _) => format!("{base}-Bold"),
            (false, true, _) => format!("{base}-{italic}"),
            (true, true, _) => format!("{base}-Bold{italic}"),
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Font::new("sans")
    }
}

// ============================================================================
// Images
// ============================================================================

/// Decoded bitmap: packed 8-bit RGB plus an optional 8-bit coverage mask.
///
/// Decoding from files happens elsewhere; this is only the pixel payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    mask: Option<Vec<u8>>,
    filename: Option<String>,
}

impl Image {
    /// Wrap RGB pixel data, checking it matches `width * height * 3`.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(RenderError::ImageSize {
                width,
                height,
                expected,
                actual: rgb.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgb,
            mask: None,
            filename: None,
        })
    }

    /// Attach a coverage mask of `width * height` bytes.
    pub fn with_mask(mut self, mask: Vec<u8>) -> Result<Self, RenderError> {
        let expected = self.width as usize * self.height as usize;
        if mask.len() != expected {
            return Err(RenderError::ImageSize {
                width: self.width,
                height: self.height,
                expected,
                actual: mask.len(),
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    /// Remember where the image came from, for backends that link
    /// instead of embedding.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB pixels with the mask applied over a white background.
    pub fn composited_rgb(&self) -> Vec<u8> {
        let Some(mask) = &self.mask else {
            return self.rgb.clone();
        };
        self.rgb
            .chunks_exact(3)
            .zip(mask)
            .flat_map(|(px, &m)| {
                let m = m as u32;
                px.iter()
                    .map(move |&c| (255 - m * (255 - c as u32) / 255) as u8)
            })
            .collect()
    }
}

// ============================================================================
// Arrows
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowKind {
    /// Two open strokes.
    Lines,
    FilledTriangle,
    HollowTriangle,
}

/// Arrow head drawn at the end of an open path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrow {
    pub kind: ArrowKind,
    pub length: f64,
    pub width: f64,
}

impl Arrow {
    pub fn new(kind: ArrowKind, length: f64, width: f64) -> Self {
        Self { kind, length, width }
    }
}
