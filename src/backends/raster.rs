//! Pixel output through tiny-skia.
//!
//! Diagram coordinates are mapped to device pixels before any path is
//! built, so arc tessellation and dash runs work in pixels.

use std::sync::Arc;

use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap as SkLineCap, LineJoin as SkLineJoin, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, Rect as SkRect, Stroke, StrokeDash, Transform,
};

use crate::backends::Pass;
use crate::errors::RenderError;
use crate::geometry::{tessellate_arc, tessellate_pie};
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::stroke::{DashConvention, clamp_dash_length};
use crate::text::{ProportionalMetrics, TextLayout};
use crate::types::{
    Alignment, BezPoint, Capabilities, Color, Image, LineCaps, LineJoin, LineStyle, Point, Rect,
};

/// Surface size and mapping.
#[derive(Clone, Debug)]
pub struct RasterOptions {
    pub width: u32,
    pub height: u32,
    pub pixels_per_unit: f64,
    pub background: Color,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            pixels_per_unit: 20.0,
            background: Color::WHITE,
        }
    }
}

impl RasterOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_pixels_per_unit(mut self, pixels_per_unit: f64) -> Self {
        self.pixels_per_unit = pixels_per_unit;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }
}

/// Dash runs in pixels. Dash and dot are each kept within 1 to 255 pixels
/// before the gaps are worked out from them.
pub fn device_dash(style: LineStyle, dash_length: f64, pixels_per_unit: f64) -> Vec<f32> {
    let conv = DashConvention::RASTER;
    let len = clamp_dash_length(dash_length) * pixels_per_unit;
    let dash = len.clamp(1.0, 255.0);
    let dot = (len * conv.dot_factor).clamp(1.0, 255.0);
    conv.runs(style, dash, dot)
        .into_iter()
        .map(|run| run as f32)
        .collect()
}

fn paint(color: &Color) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Renders into an owned pixmap.
pub struct RasterRenderer {
    pixmap: Pixmap,
    options: RasterOptions,
    state: RenderState,
    pass: Pass,
    origin: Point,
    layout: Box<dyn TextLayout>,
}

impl RasterRenderer {
    pub fn new(options: RasterOptions) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(options.width, options.height).ok_or(RenderError::Surface {
            width: options.width,
            height: options.height,
        })?;
        Ok(Self {
            pixmap,
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            origin: Point::ZERO,
            layout: Box::new(ProportionalMetrics::default()),
        })
    }

    /// Use `layout` for glyph outlines instead of the metrics-only default.
    pub fn with_text_layout(mut self, layout: Box<dyn TextLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap.encode_png().map_err(|err| RenderError::Encode {
            message: err.to_string(),
        })
    }

    fn device(&self, p: Point) -> (f32, f32) {
        let d = (p - self.origin) * self.options.pixels_per_unit;
        (d.x as f32, d.y as f32)
    }

    fn scaled(&self, len: f64) -> f64 {
        len * self.options.pixels_per_unit
    }

    fn polyline_path(&self, points: &[Point], close: bool) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for (i, &p) in points.iter().enumerate() {
            let (x, y) = self.device(p);
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        if close {
            pb.close();
        }
        pb.finish()
    }

    fn bezier_path(&self, points: &[BezPoint], offset: Point, close: bool) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for (i, bp) in points.iter().enumerate() {
            match *bp {
                BezPoint::MoveTo(p) => {
                    if i > 0 && close {
                        pb.close();
                    }
                    let (x, y) = self.device(p + offset);
                    pb.move_to(x, y);
                }
                BezPoint::LineTo(p) => {
                    let (x, y) = self.device(p + offset);
                    if i == 0 {
                        warn!("first BezPoint must be a MoveTo");
                        pb.move_to(x, y);
                    } else {
                        pb.line_to(x, y);
                    }
                }
                BezPoint::CurveTo(c1, c2, p) => {
                    let (x1, y1) = self.device(c1 + offset);
                    let (x2, y2) = self.device(c2 + offset);
                    let (x, y) = self.device(p + offset);
                    pb.cubic_to(x1, y1, x2, y2, x, y);
                }
            }
        }
        if close {
            pb.close();
        }
        pb.finish()
    }

    fn stroke(&self) -> Stroke {
        let state = &self.state.stroke;
        let runs = device_dash(state.style, state.dash_length, self.options.pixels_per_unit);
        Stroke {
            width: self.scaled(state.width) as f32,
            line_cap: match state.caps {
                LineCaps::Butt => SkLineCap::Butt,
                LineCaps::Round => SkLineCap::Round,
                LineCaps::Projecting => SkLineCap::Square,
            },
            line_join: match state.join {
                LineJoin::Miter => SkLineJoin::Miter,
                LineJoin::Round => SkLineJoin::Round,
                LineJoin::Bevel => SkLineJoin::Bevel,
            },
            dash: if runs.is_empty() {
                None
            } else {
                StrokeDash::new(runs, 0.0)
            },
            ..Stroke::default()
        }
    }

    fn stroke_path(&mut self, path: Option<Path>, color: &Color) {
        let Some(path) = path else { return };
        let stroke = self.stroke();
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    fn fill_path(&mut self, path: Option<&Path>, color: &Color, rule: FillRule) {
        let Some(path) = path else { return };
        self.pixmap
            .fill_path(path, &paint(color), rule, Transform::identity(), None);
    }
}

impl Renderer for RasterRenderer {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::HOLES | Capabilities::ALPHA
    }

    fn begin_render(&mut self, region: Option<Rect>) -> Result<(), RenderError> {
        self.pass.begin()?;
        self.origin = region.map_or(Point::ZERO, |r| Point::new(r.left, r.top));
        let [r, g, b, a] = self.options.background.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        debug!(
            width = self.options.width,
            height = self.options.height,
            "raster pass"
        );
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        let path = self.polyline_path(&[start, end], false);
        self.stroke_path(path, color);
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        let path = self.polyline_path(points, false);
        self.stroke_path(path, color);
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        let path = self.polyline_path(points, true);
        if let Some(fill) = fill {
            self.fill_path(path.as_ref(), fill, FillRule::EvenOdd);
        }
        if let Some(stroke) = stroke {
            self.stroke_path(path, stroke);
        }
    }

    fn draw_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
        color: &Color,
    ) {
        // tessellate in pixels so segment length is a device length
        let ppu = self.options.pixels_per_unit;
        let points: Vec<Point> =
            tessellate_arc(center * ppu, width * ppu, height * ppu, angle1, angle2)
                .into_iter()
                .map(|p| p / ppu)
                .collect();
        let path = self.polyline_path(&points, false);
        self.stroke_path(path, color);
    }

    fn fill_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
        color: &Color,
    ) {
        let ppu = self.options.pixels_per_unit;
        let points: Vec<Point> =
            tessellate_pie(center * ppu, width * ppu, height * ppu, angle1, angle2)
                .into_iter()
                .map(|p| p / ppu)
                .collect();
        let path = self.polyline_path(&points, true);
        self.fill_path(path.as_ref(), color, FillRule::Winding);
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        let (x, y) = self.device(center - Point::new(width, height) / 2.0);
        let bounds = SkRect::from_xywh(x, y, self.scaled(width) as f32, self.scaled(height) as f32);
        let path = bounds.and_then(PathBuilder::from_oval);
        if let Some(fill) = fill {
            self.fill_path(path.as_ref(), fill, FillRule::Winding);
        }
        if let Some(stroke) = stroke {
            self.stroke_path(path, stroke);
        }
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        let path = self.bezier_path(points, Point::ZERO, false);
        self.stroke_path(path, color);
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        let path = self.bezier_path(points, Point::ZERO, true);
        if let Some(fill) = fill {
            self.fill_path(path.as_ref(), fill, FillRule::EvenOdd);
        }
        if let Some(stroke) = stroke {
            self.stroke_path(path, stroke);
        }
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        let font = self.state.font.clone().unwrap_or_default();
        let height = self.state.font_height;
        let outlines = self.layout.glyph_outlines(text, &font, height);
        if outlines.is_empty() {
            debug!(text, "no glyph outlines from text layout, skipping string");
            return;
        }
        let width = self.layout.string_width(text, &font, height);
        let offset = pos + Point::new(alignment.offset(width), 0.0);
        let glyphs: Vec<BezPoint> = outlines.into_iter().flatten().collect();
        let path = self.bezier_path(&glyphs, offset, true);
        self.fill_path(path.as_ref(), color, FillRule::Winding);
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() {
            return;
        }
        let (w, h) = (image.width(), image.height());
        let Some(mut src) = Pixmap::new(w, h) else {
            warn!(w, h, "cannot allocate image surface, skipping");
            return;
        };
        let rgb = image.rgb();
        let mask = image.mask();
        for (i, px) in src.pixels_mut().iter_mut().enumerate() {
            let alpha = mask.map_or(255, |m| m[i]);
            let (r, g, b) = (rgb[i * 3], rgb[i * 3 + 1], rgb[i * 3 + 2]);
            *px = ColorU8::from_rgba(r, g, b, alpha).premultiply();
        }

        let (x, y) = self.device(pos);
        let sx = self.scaled(width) / w as f64;
        let sy = self.scaled(height) / h as f64;
        let transform = Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, x, y);
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }
}
