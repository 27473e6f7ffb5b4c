//! MetaPost macro output.
//!
//! Coordinates are written as multiples of the units `x` and `y`, which
//! the figure preamble defines in centimetres with `y` negative, so the
//! diagram's top-down space comes out right side up. Pen, cap, join and
//! color go through `drawoptions` and assignments that are only emitted
//! when they change; the dash pattern is appended to each `draw`.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use glam::dvec2;

use crate::backends::{Lazy, Output, Pass, TexOptions};
use crate::errors::RenderError;
use crate::geometry::arc_to_bezier;
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::stroke::DashConvention;
use crate::types::{Alignment, BezPoint, Color, Image, LineCaps, LineJoin, Point, Rect};

/// MetaPost writer.
pub struct MetapostRenderer<W: Write> {
    out: Output<W>,
    options: TexOptions,
    state: RenderState,
    pass: Pass,
    color: Lazy<Color>,
    width: Lazy<f64>,
    caps: Lazy<LineCaps>,
    join: Lazy<LineJoin>,
}

fn pt(p: Point) -> String {
    format!("({:.6}x,{:.6}y)", p.x, p.y)
}

fn rgb(c: &Color) -> String {
    format!("({:.6},{:.6},{:.6})", c.red, c.green, c.blue)
}

/// A path in MetaPost syntax. Extra subpaths cannot be expressed and are
/// joined with straight segments.
fn path_expr(points: &[BezPoint]) -> String {
    let mut s = String::new();
    for (i, bp) in points.iter().enumerate() {
        match *bp {
            BezPoint::MoveTo(p) if i == 0 => s.push_str(&pt(p)),
            BezPoint::LineTo(p) if i == 0 => {
                warn!("first BezPoint must be a MoveTo");
                s.push_str(&pt(p));
            }
            BezPoint::MoveTo(p) => {
                warn!("only the first BezPoint can be a MoveTo");
                let _ = write!(s, "--{}", pt(p));
            }
            BezPoint::LineTo(p) => {
                let _ = write!(s, "--{}", pt(p));
            }
            BezPoint::CurveTo(c1, c2, p) => {
                let _ = write!(s, "..controls {} and {}\n ..{}", pt(c1), pt(c2), pt(p));
            }
        }
    }
    s
}

fn ellipse_expr(center: Point, width: f64, height: f64) -> String {
    let (rx, ry) = (width / 2.0, height / 2.0);
    format!(
        "{}..{}..{}..{}..cycle",
        pt(dvec2(center.x + rx, center.y)),
        pt(dvec2(center.x, center.y + ry)),
        pt(dvec2(center.x - rx, center.y)),
        pt(dvec2(center.x, center.y - ry))
    )
}

impl<W: Write> MetapostRenderer<W> {
    pub fn new(sink: W, options: TexOptions) -> Self {
        Self {
            out: Output::new(sink),
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            color: Lazy::default(),
            width: Lazy::default(),
            caps: Lazy::default(),
            join: Lazy::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn set_color(&mut self, color: &Color) {
        if self.color.update(color) {
            write!(self.out, "drawoptions(withcolor {});\n", rgb(color));
        }
    }

    fn sync_pen(&mut self) {
        let stroke = self.state.stroke.clone();
        if self.width.update(&stroke.width) {
            write!(
                self.out,
                "drawoptions (withpen pencircle scaled {:.6}x);\n",
                stroke.width
            );
        }
        if self.caps.update(&stroke.caps) {
            let cap = match stroke.caps {
                LineCaps::Butt => "butt",
                LineCaps::Round => "rounded",
                LineCaps::Projecting => "squared",
            };
            write!(self.out, "linecap:={cap};\n");
        }
        if self.join.update(&stroke.join) {
            let join = match stroke.join {
                LineJoin::Miter => "mitered",
                LineJoin::Round => "rounded",
                LineJoin::Bevel => "beveled",
            };
            write!(self.out, "linejoin:={join};\n");
        }
    }

    /// Stroke `path` with the current pen, color and dash pattern.
    fn draw(&mut self, path: &str, color: &Color) {
        self.sync_pen();
        self.set_color(color);
        let stroke = &self.state.stroke;
        let runs = DashConvention::METAPOST.pattern(stroke.style, stroke.dash_length);
        let mut dash = String::new();
        if !runs.is_empty() {
            dash.push_str("\n dashed dashpattern (");
            for (i, pair) in runs.chunks(2).enumerate() {
                let sep = if i == 0 { "" } else { " " };
                let _ = write!(dash, "{sep}on {:.6}x off {:.6}x", pair[0], pair[1]);
            }
            dash.push(')');
        }
        write!(self.out, "draw {path}{dash};\n");
    }

    fn fill(&mut self, path: &str, color: &Color) {
        write!(self.out, "path p;\np = {path};\nfill p withcolor {};\n", rgb(color));
    }
}

impl<W: Write> Renderer for MetapostRenderer<W> {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn begin_render(&mut self, region: Option<Rect>) -> Result<(), RenderError> {
        self.pass.begin()?;
        let extent = region.unwrap_or_default();
        let scale = self.options.scale;
        debug!(scale, "metapost pass");

        write!(self.out, "% Metapost TeX macro\n");
        if let Some(title) = &self.options.title {
            let title = title.clone();
            write!(self.out, "% Title: {title}\n");
        }
        write!(self.out, "% Creator: drawstream\n\n\nbeginfig(1);\n");
        write!(
            self.out,
            "% picture({:.6},{:.6})({:.6},{:.6})\n",
            extent.left * scale,
            -extent.bottom * scale,
            extent.right * scale,
            -extent.top * scale
        );
        write!(self.out, "x = {:.6}cm; y = {:.6}cm;\n\n", scale, -scale);

        self.color.reset();
        self.width.reset();
        self.caps.reset();
        self.join.reset();
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()?;
        write!(self.out, "endfig;\nend;\n");
        self.out.finish()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        let path = format!("{}--{}", pt(start), pt(end));
        self.draw(&path, color);
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        if points.len() < 2 {
            return;
        }
        let path: Vec<String> = points.iter().map(|&p| pt(p)).collect();
        self.draw(&path.join("--"), color);
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        if points.len() < 2 {
            return;
        }
        let mut path: Vec<String> = points.iter().map(|&p| pt(p)).collect();
        path.push("cycle".to_string());
        let path = path.join("--");
        if let Some(fill) = fill {
            self.fill(&path, fill);
        }
        if let Some(stroke) = stroke {
            self.draw(&path, stroke);
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
        let path = arc_to_bezier(center, width, height, angle1, angle2, false);
        self.draw(&path_expr(&path), color);
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
        let path = arc_to_bezier(center, width, height, angle1, angle2, true);
        // the pie ends back on its start point, which `cycle` already does
        let open = path.split_last().map_or(&path[..], |(_, rest)| rest);
        self.fill(&format!("{}--cycle", path_expr(open)), color);
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        let path = ellipse_expr(center, width, height);
        if let Some(fill) = fill {
            self.fill(&path, fill);
        }
        if let Some(stroke) = stroke {
            self.draw(&path, stroke);
        }
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        if points.is_empty() {
            return;
        }
        self.draw(&path_expr(points), color);
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        if points.is_empty() {
            return;
        }
        let path = format!("{}--cycle", path_expr(points));
        if let Some(fill) = fill {
            self.fill(&path, fill);
        }
        if let Some(stroke) = stroke {
            self.draw(&path, stroke);
        }
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        self.set_color(color);
        let label = match alignment {
            Alignment::Left => "label.rt",
            Alignment::Center => "label",
            Alignment::Right => "label.lft",
        };
        write!(self.out, "{label}(btex {text} etex,{});\n", pt(pos));
    }

    fn draw_image(&mut self, _pos: Point, _width: f64, _height: f64, _image: &Arc<Image>) {
        warn!("metapost output does not support images, skipping");
    }
}
