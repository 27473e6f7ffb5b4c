//! PostScript and Encapsulated PostScript output.
//!
//! Coordinates are written in diagram units; the prolog sets up a matrix
//! that scales them to points and flips y. Every attribute (color, line
//! width, caps, join, dash) is emitted lazily right before the first
//! drawing operation that needs it.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use crate::backends::{Lazy, Output, Pass};
use crate::errors::RenderError;
use crate::log::debug;
use crate::renderer::{RenderState, Renderer};
use crate::stroke::DashConvention;
use crate::types::{
    Alignment, BezPoint, Capabilities, Color, Font, Image, LineCaps, LineJoin, LineStyle, Point,
    Rect,
};

/// Points per centimetre.
pub const POINTS_PER_CM: f64 = 28.346;

#[derive(Clone, Debug)]
pub struct PsOptions {
    /// Points per diagram unit.
    pub scale: f64,
    /// Write an EPS file with a bounding box instead of a printable page.
    pub eps: bool,
    pub title: Option<String>,
}

impl Default for PsOptions {
    fn default() -> Self {
        Self {
            scale: POINTS_PER_CM,
            eps: true,
            title: None,
        }
    }
}

impl PsOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_eps(mut self, eps: bool) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

const PROLOG: &str = "\
/cp {closepath} bind def
/c {curveto} bind def
/f {fill} bind def
/a {arc} bind def
/ef {eofill} bind def
/ex {exch} bind def
/gr {grestore} bind def
/gs {gsave} bind def
/l {lineto} bind def
/m {moveto} bind def
/n {newpath} bind def
/s {stroke} bind def
/sh {show} bind def
/slc {setlinecap} bind def
/slj {setlinejoin} bind def
/slw {setlinewidth} bind def
/srgb {setrgbcolor} bind def
/sc {scale} bind def
/sd {setdash} bind def
/ff {findfont} bind def
/sf {setfont} bind def
/scf {scalefont} bind def
/sw {stringwidth pop} bind def
/tr {translate} bind def

/ellipsedict 8 dict def
ellipsedict /mtrx matrix put
/ellipse
{ ellipsedict begin
   /endangle exch def
   /startangle exch def
   /yrad exch def
   /xrad exch def
   /y exch def
   /x exch def
   /savematrix mtrx currentmatrix def
   x y tr xrad yrad sc
   0 0 1 startangle endangle arc
   savematrix setmatrix
   end
} def
";

/// PostScript writer.
pub struct PsRenderer<W: Write> {
    out: Output<W>,
    options: PsOptions,
    state: RenderState,
    pass: Pass,
    color: Lazy<Color>,
    width: Lazy<f64>,
    caps: Lazy<LineCaps>,
    join: Lazy<LineJoin>,
    dash: Lazy<(LineStyle, f64)>,
    font: Lazy<(Font, f64)>,
    encoded_fonts: HashSet<String>,
}

impl<W: Write> PsRenderer<W> {
    pub fn new(sink: W, options: PsOptions) -> Self {
        Self {
            out: Output::new(sink),
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            color: Lazy::default(),
            width: Lazy::default(),
            caps: Lazy::default(),
            join: Lazy::default(),
            dash: Lazy::default(),
            font: Lazy::default(),
            encoded_fonts: HashSet::new(),
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
            write!(
                self.out,
                "{:.6} {:.6} {:.6} srgb\n",
                color.red, color.green, color.blue
            );
        }
    }

    /// Bring line attributes in the output up to date with the state.
    fn sync_stroke(&mut self) {
        let stroke = self.state.stroke.clone();
        if self.width.update(&stroke.width) {
            // zero width would be one device pixel, too thin for print
            let w = if stroke.width == 0.0 { 0.01 } else { stroke.width };
            write!(self.out, "{w:.6} slw\n");
        }
        if self.caps.update(&stroke.caps) {
            let mode = match stroke.caps {
                LineCaps::Butt => 0,
                LineCaps::Round => 1,
                LineCaps::Projecting => 2,
            };
            write!(self.out, "{mode} slc\n");
        }
        if self.join.update(&stroke.join) {
            let mode = match stroke.join {
                LineJoin::Miter => 0,
                LineJoin::Round => 1,
                LineJoin::Bevel => 2,
            };
            write!(self.out, "{mode} slj\n");
        }
        if self.dash.update(&(stroke.style, stroke.dash_length)) {
            let runs = DashConvention::DOCUMENT.pattern(stroke.style, stroke.dash_length);
            let runs: Vec<String> = runs.iter().map(|r| format!("{r:.6}")).collect();
            write!(self.out, "[{}] 0 sd\n", runs.join(" "));
        }
    }

    fn sync_font(&mut self) {
        let font = self.state.font.clone().unwrap_or_default();
        let height = if self.state.font_height > 0.0 {
            self.state.font_height
        } else {
            1.0
        };
        if !self.font.update(&(font.clone(), height)) {
            return;
        }
        let name = font.ps_name();
        if self.encoded_fonts.insert(name.clone()) {
            write!(
                self.out,
                "/{name}-latin1\n    /{name} findfont\n    dup length dict begin\n\
                 \t{{1 index /FID ne {{def}} {{pop pop}} ifelse}} forall\n\
                 \t/Encoding ISOLatin1Encoding def\n    currentdict end\ndefinefont pop\n"
            );
        }
        write!(self.out, "/{name}-latin1 ff {height:.6} scf sf\n");
    }

    fn path(&mut self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        write!(self.out, "n {:.6} {:.6} m ", first.x, first.y);
        for p in rest {
            write!(self.out, "{:.6} {:.6} l ", p.x, p.y);
        }
    }

    fn bez_path(&mut self, points: &[BezPoint]) {
        for (i, bp) in points.iter().enumerate() {
            match *bp {
                BezPoint::MoveTo(p) if i == 0 => write!(self.out, "n {:.6} {:.6} m", p.x, p.y),
                BezPoint::MoveTo(p) => write!(self.out, " {:.6} {:.6} m", p.x, p.y),
                BezPoint::LineTo(p) if i == 0 => {
                    crate::log::warn!("first BezPoint must be a MoveTo");
                    write!(self.out, "n {:.6} {:.6} m", p.x, p.y)
                }
                BezPoint::LineTo(p) => write!(self.out, " {:.6} {:.6} l", p.x, p.y),
                BezPoint::CurveTo(c1, c2, p) => write!(
                    self.out,
                    " {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} c",
                    c1.x, c1.y, c2.x, c2.y, p.x, p.y
                ),
            }
        }
    }
}

/// Escape a string for a PostScript literal. Characters outside Latin-1
/// become `?`.
fn ps_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => out.push(' '),
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) < 0x100 => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

impl<W: Write> Renderer for PsRenderer<W> {
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
        debug!(eps = self.options.eps, scale, "postscript pass");

        if self.options.eps {
            write!(self.out, "%!PS-Adobe-2.0 EPSF-2.0\n");
        } else {
            write!(self.out, "%!PS-Adobe-2.0\n");
        }
        if let Some(title) = self.options.title.clone() {
            write!(self.out, "%%Title: {title}\n");
        }
        write!(self.out, "%%Creator: drawstream\n");
        if self.options.eps {
            write!(
                self.out,
                "%%Magnification: 1.0000\n%%BoundingBox: 0 0 {} {}\n",
                (extent.width() * scale).ceil() as i64,
                (extent.height() * scale).ceil() as i64
            );
        }
        write!(self.out, "%%BeginSetup\n%%EndSetup\n%%EndComments\n");
        write!(self.out, "%%BeginProlog\n{PROLOG}");
        if self.options.eps {
            write!(self.out, "{:.6} {:.6} scale\n", scale, -scale);
            write!(self.out, "{:.6} {:.6} translate\n", -extent.left, -extent.bottom);
        } else {
            // printable page: origin at the top left of the paper
            write!(self.out, "{:.6} {:.6} scale\n", scale, -scale);
            write!(self.out, "{:.6} {:.6} translate\n", -extent.left, -extent.top);
        }
        write!(self.out, "%%EndProlog\n\n\n");

        self.color.reset();
        self.width.reset();
        self.caps.reset();
        self.join.reset();
        self.dash.reset();
        self.font.reset();
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()?;
        write!(self.out, "showpage\n");
        self.out.finish()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.sync_stroke();
        self.set_color(color);
        write!(
            self.out,
            "n {:.6} {:.6} m {:.6} {:.6} l s\n",
            start.x, start.y, end.x, end.y
        );
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        if points.len() < 2 {
            return;
        }
        self.sync_stroke();
        self.set_color(color);
        self.path(points);
        write!(self.out, "s\n");
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        if points.len() < 2 {
            return;
        }
        if let Some(fill) = fill {
            self.set_color(fill);
            self.path(points);
            write!(self.out, "ef\n");
        }
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_color(stroke);
            self.path(points);
            write!(self.out, "cp s\n");
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
        self.sync_stroke();
        self.set_color(color);
        write!(
            self.out,
            "n {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} ellipse s\n",
            center.x,
            center.y,
            width / 2.0,
            height / 2.0,
            360.0 - angle2,
            360.0 - angle1
        );
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
        self.set_color(color);
        write!(
            self.out,
            "n {:.6} {:.6} m {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} ellipse f\n",
            center.x,
            center.y,
            center.x,
            center.y,
            width / 2.0,
            height / 2.0,
            360.0 - angle2,
            360.0 - angle1
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
        let (rx, ry) = (width / 2.0, height / 2.0);
        if let Some(fill) = fill {
            self.set_color(fill);
            write!(
                self.out,
                "n {:.6} {:.6} {rx:.6} {ry:.6} 0 360 ellipse f\n",
                center.x, center.y
            );
        }
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_color(stroke);
            write!(
                self.out,
                "n {:.6} {:.6} {rx:.6} {ry:.6} 0 360 ellipse cp s\n",
                center.x, center.y
            );
        }
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        if points.is_empty() {
            return;
        }
        self.sync_stroke();
        self.set_color(color);
        self.bez_path(points);
        write!(self.out, " s\n");
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
        if let Some(fill) = fill {
            self.set_color(fill);
            self.bez_path(points);
            write!(self.out, " ef\n");
        }
        if let Some(stroke) = stroke {
            self.sync_stroke();
            self.set_color(stroke);
            self.bez_path(points);
            write!(self.out, " cp s\n");
        }
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        self.sync_font();
        self.set_color(color);
        write!(self.out, "({}) ", ps_escape(text));
        match alignment {
            Alignment::Left => write!(self.out, "{:.6} {:.6} m", pos.x, pos.y),
            Alignment::Center => write!(
                self.out,
                "dup sw 2 div {:.6} ex sub {:.6} m",
                pos.x, pos.y
            ),
            Alignment::Right => write!(self.out, "dup sw {:.6} ex sub {:.6} m", pos.x, pos.y),
        }
        write!(self.out, " gs 1 -1 sc sh gr\n");
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() || width <= 0.0 || height <= 0.0 {
            return;
        }
        let (w, h) = (image.width(), image.height());
        write!(self.out, "gs\n/pix {} string def\n{w} {h} 8\n", w * 3);
        write!(self.out, "{:.6} {:.6} tr\n{width:.6} {height:.6} sc\n", pos.x, pos.y);
        write!(self.out, "[{w} 0 0 {h} 0 0]\n");
        write!(self.out, "{{currentfile pix readhexstring pop}}\nfalse 3 colorimage\n\n");
        let rgb = image.composited_rgb();
        for row in rgb.chunks(w as usize * 3) {
            let hex: String = row.iter().map(|b| format!("{b:02x}")).collect();
            write!(self.out, "{hex}\n");
        }
        write!(self.out, "gr\n\n");
    }
}
