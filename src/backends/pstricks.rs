//! PSTricks macro output for inclusion in LaTeX documents.
//!
//! The picture is wrapped in `\psscalebox{s -s}`, so drawing commands use
//! diagram coordinates directly and only text needs flipping back.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use crate::backends::{Lazy, Output, Pass, TexOptions};
use crate::errors::RenderError;
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::stroke::DashConvention;
use crate::types::{
    Alignment, BezPoint, Capabilities, Color, Font, Image, LineCaps, LineJoin, LineStyle, Point,
    Rect,
};

const LINE_COLOR: &str = "dslinecolor";
const FILL_COLOR: &str = "dsfillcolor";

const PREAMBLE: &str = "\
\\ifx\\setlinejoinmode\\undefined
  \\newcommand{\\setlinejoinmode}[1]{}
\\fi
\\ifx\\setlinecaps\\undefined
  \\newcommand{\\setlinecaps}[1]{}
\\fi
\\ifx\\setfont\\undefined
  \\newcommand{\\setfont}[2]{}
\\fi
";

/// PSTricks writer.
pub struct PstricksRenderer<W: Write> {
    out: Output<W>,
    options: TexOptions,
    state: RenderState,
    pass: Pass,
    line_color: Lazy<Color>,
    fill_color: Lazy<Color>,
    width: Lazy<f64>,
    caps: Lazy<LineCaps>,
    join: Lazy<LineJoin>,
    dash: Lazy<(LineStyle, f64)>,
    font: Lazy<(Font, f64)>,
}

fn pt(p: Point) -> String {
    format!("({:.6},{:.6})", p.x, p.y)
}

fn points(points: &[Point]) -> String {
    points.iter().map(|&p| pt(p)).collect()
}

/// Escape the characters LaTeX treats specially. Strings starting with
/// `\tex` are raw TeX and pass through untouched.
pub fn tex_escape(text: &str) -> String {
    if text.starts_with("\\tex") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' | '#' | '$' | '&' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\~{}"),
            '^' => out.push_str("\\^{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            '[' => out.push_str("\\ensuremath{\\left[\\right.}"),
            ']' => out.push_str("\\ensuremath{\\left.\\right]}"),
            _ => out.push(c),
        }
    }
    out
}

impl<W: Write> PstricksRenderer<W> {
    pub fn new(sink: W, options: TexOptions) -> Self {
        Self {
            out: Output::new(sink),
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            line_color: Lazy::default(),
            fill_color: Lazy::default(),
            width: Lazy::default(),
            caps: Lazy::default(),
            join: Lazy::default(),
            dash: Lazy::default(),
            font: Lazy::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn set_line_color(&mut self, color: &Color) {
        if self.line_color.update(color) {
            write!(
                self.out,
                "\\newrgbcolor{{{LINE_COLOR}}}{{{:.6} {:.6} {:.6}}}%\n\\psset{{linecolor={LINE_COLOR}}}\n",
                color.red, color.green, color.blue
            );
        }
    }

    fn set_fill_color(&mut self, color: &Color) {
        if self.fill_color.update(color) {
            write!(
                self.out,
                "\\newrgbcolor{{{FILL_COLOR}}}{{{:.6} {:.6} {:.6}}}%\n\\psset{{fillcolor={FILL_COLOR}}}\n",
                color.red, color.green, color.blue
            );
        }
    }

    fn sync_stroke(&mut self) {
        let stroke = self.state.stroke.clone();
        if self.width.update(&stroke.width) {
            let width = if stroke.width > 0.0 { stroke.width } else { 0.01 };
            write!(self.out, "\\psset{{linewidth={width:.6}cm}}\n");
        }
        if self.caps.update(&stroke.caps) {
            let caps = match stroke.caps {
                LineCaps::Butt => 0,
                LineCaps::Round => 1,
                LineCaps::Projecting => 2,
            };
            write!(self.out, "\\setlinecaps{{{caps}}}\n");
        }
        if self.join.update(&stroke.join) {
            let join = match stroke.join {
                LineJoin::Miter => 0,
                LineJoin::Round => 1,
                LineJoin::Bevel => 2,
            };
            write!(self.out, "\\setlinejoinmode{{{join}}}\n");
        }
        if self.dash.update(&(stroke.style, stroke.dash_length)) {
            let convention = DashConvention::DOCUMENT;
            match stroke.style {
                LineStyle::Solid => write!(self.out, "\\psset{{linestyle=solid}}\n"),
                LineStyle::Dotted => write!(
                    self.out,
                    "\\psset{{linestyle=dotted,dotsep={:.6}}}\n",
                    convention.dot_length(stroke.dash_length)
                ),
                style => {
                    let mut runs = String::new();
                    let pattern = convention.pattern(style, stroke.dash_length);
                    for (i, run) in pattern.iter().enumerate() {
                        let sep = if i == 0 { "" } else { " " };
                        let _ = write!(runs, "{sep}{run:.6}");
                    }
                    write!(self.out, "\\psset{{linestyle=dashed,dash={runs}}}\n");
                }
            }
        }
    }

    fn sync_font(&mut self) {
        let font = self.state.font.clone().unwrap_or_default();
        let height = self.state.font_height;
        if self.font.update(&(font.clone(), height)) {
            write!(self.out, "\\setfont{{{}}}{{{height:.6}}}\n", font.ps_name());
        }
    }

    /// The `\pscustom` body for a path.
    fn custom_path(points: &[BezPoint]) -> String {
        let mut s = String::from("\\pscustom{\n\\newpath\n");
        for (i, bp) in points.iter().enumerate() {
            match *bp {
                BezPoint::MoveTo(p) => {
                    let _ = writeln!(s, "\\moveto{}", pt(p));
                }
                BezPoint::LineTo(p) if i == 0 => {
                    warn!("first BezPoint must be a MoveTo");
                    let _ = writeln!(s, "\\moveto{}", pt(p));
                }
                BezPoint::LineTo(p) => {
                    let _ = writeln!(s, "\\lineto{}", pt(p));
                }
                BezPoint::CurveTo(c1, c2, p) => {
                    let _ = writeln!(s, "\\curveto{}{}{}", pt(c1), pt(c2), pt(p));
                }
            }
        }
        s
    }

    /// Fill options for an ellipse, syncing whatever attributes it uses.
    fn ellipse_opts(&mut self, fill: Option<&Color>, stroke: Option<&Color>) -> &'static str {
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_line_color(stroke);
        }
        match (fill, stroke) {
            (Some(fill), Some(_)) => {
                self.set_fill_color(fill);
                "[fillstyle=solid,fillcolor=dsfillcolor]"
            }
            (Some(fill), None) => {
                self.set_fill_color(fill);
                "[linestyle=none,fillstyle=solid,fillcolor=dsfillcolor]"
            }
            _ => "",
        }
    }

    fn wedge_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
        opts: &str,
    ) {
        let (rx, ry) = (width / 2.0, height / 2.0);
        let (mut a1, mut a2) = (angle1, angle2);
        while a2 < a1 {
            a2 += 360.0;
        }
        // y is flipped by the scalebox, so angles run the other way
        (a1, a2) = (360.0 - a2, 360.0 - a1);
        let radius = (rx * rx + ry * ry).sqrt();
        write!(
            self.out,
            "\\psclip{{\\pswedge[linestyle=none,fillstyle=none]{}{{{radius:.6}}}{{{a1:.6}}}{{{a2:.6}}}}}\n\
             \\psellipse{opts}{}({rx:.6},{ry:.6})\n\\endpsclip\n",
            pt(center),
            pt(center)
        );
    }
}

impl<W: Write> Renderer for PstricksRenderer<W> {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::HOLES
    }

    fn begin_render(&mut self, region: Option<Rect>) -> Result<(), RenderError> {
        self.pass.begin()?;
        let extent = region.unwrap_or_default();
        let scale = self.options.scale;
        debug!(scale, "pstricks pass");

        write!(self.out, "% PSTricks TeX macro\n");
        if let Some(title) = self.options.title.clone() {
            write!(self.out, "% Title: {title}\n");
        }
        write!(self.out, "% Creator: drawstream\n%\n{PREAMBLE}");
        write!(
            self.out,
            "\\pspicture({:.6},{:.6})({:.6},{:.6})\n\\psscalebox{{{scale:.6} {:.6}}}{{\n",
            extent.left * scale,
            -extent.bottom * scale,
            extent.right * scale,
            -extent.top * scale,
            -scale
        );

        self.line_color.reset();
        self.fill_color.reset();
        self.width.reset();
        self.caps.reset();
        self.join.reset();
        self.dash.reset();
        self.font.reset();
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()?;
        write!(self.out, "}}\\endpspicture\n");
        self.out.finish()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.sync_stroke();
        self.set_line_color(color);
        write!(self.out, "\\psline{}{}\n", pt(start), pt(end));
    }

    fn draw_polyline(&mut self, pts: &[Point], color: &Color) {
        if pts.len() < 2 {
            return;
        }
        self.sync_stroke();
        self.set_line_color(color);
        write!(self.out, "\\psline{}\n", points(pts));
    }

    fn draw_polygon(&mut self, pts: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        if pts.len() < 2 {
            return;
        }
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_line_color(stroke);
        }
        let opts = match (fill, stroke) {
            (Some(fill), Some(_)) => {
                self.set_fill_color(fill);
                "[fillstyle=eofill,fillcolor=dsfillcolor,linecolor=dslinecolor]"
            }
            (Some(fill), None) => {
                self.set_fill_color(fill);
                "[linestyle=none,fillstyle=eofill,fillcolor=dsfillcolor]"
            }
            (None, Some(_)) => "",
            (None, None) => return,
        };
        write!(self.out, "\\pspolygon{opts}{}\n", points(pts));
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
        self.sync_stroke();
        self.set_line_color(color);
        self.wedge_arc(center, width, height, angle1, angle2, "");
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
        self.set_fill_color(color);
        self.wedge_arc(
            center,
            width,
            height,
            angle1,
            angle2,
            "[linestyle=none,fillstyle=solid,fillcolor=dsfillcolor]",
        );
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        let opts = self.ellipse_opts(fill, stroke);
        write!(
            self.out,
            "\\psellipse{opts}{}({:.6},{:.6})\n",
            pt(center),
            width / 2.0,
            height / 2.0
        );
    }

    fn draw_bezier(&mut self, pts: &[BezPoint], color: &Color) {
        if pts.is_empty() {
            return;
        }
        self.sync_stroke();
        self.set_line_color(color);
        let path = Self::custom_path(pts);
        write!(self.out, "{path}\\stroke}}\n");
    }

    fn draw_beziergon(&mut self, pts: &[BezPoint], fill: Option<&Color>, stroke: Option<&Color>) {
        if pts.is_empty() || (fill.is_none() && stroke.is_none()) {
            return;
        }
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_line_color(stroke);
        }
        if let Some(fill) = fill {
            self.set_fill_color(fill);
        }
        let mut body = Self::custom_path(pts);
        body.push_str("\\closepath\n");
        if fill.is_some() {
            body.push_str("\\fill[fillstyle=eofill,fillcolor=dsfillcolor]");
            if stroke.is_some() {
                body.push('\n');
            }
        }
        if stroke.is_some() {
            body.push_str("\\stroke");
        }
        write!(self.out, "{body}}}\n");
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        self.sync_font();
        self.set_fill_color(color);
        let anchor = match alignment {
            Alignment::Left => "[l]",
            Alignment::Center => "",
            Alignment::Right => "[r]",
        };
        write!(
            self.out,
            "\\rput{anchor}{}{{\\psscalebox{{1 -1}}{{{}}}}}\n",
            pt(pos),
            tex_escape(text)
        );
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() {
            warn!("empty image, skipping");
            return;
        }
        let (w, h) = (image.width(), image.height());
        let rgb = image.composited_rgb();
        let mut hex = String::with_capacity(rgb.len() * 2 + h as usize);
        for row in rgb.chunks(w as usize * 3) {
            for byte in row {
                let _ = write!(hex, "{byte:02x}");
            }
            hex.push('\n');
        }
        write!(
            self.out,
            "\\pscustom{{\\code{{gsave\n\
             {:.6} {:.6} translate\n\
             {width:.6} {height:.6} scale\n\
             /scanline {} string def\n\
             {w} {h} 8\n\
             [{w} 0 0 {h} 0 0]\n\
             {{currentfile scanline readhexstring pop}}\n\
             false 3 colorimage\n\
             {hex}grestore}}}}\n",
            pos.x,
            pos.y,
            w * 3
        );
    }
}
