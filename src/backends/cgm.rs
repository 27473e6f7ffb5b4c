//! Binary Computer Graphics Metafile output.
//!
//! Every element is a 16-bit header (class, id, parameter length) followed
//! by its parameters, padded to an even length. Parameters longer than 30
//! bytes use the long header form with a separate length word. Reals are
//! 32-bit fixed point (16 bits whole, 16 bits fraction) and integers are
//! big-endian two's complement.
//!
//! Diagram space is top-down while CGM is bottom-up, so every y is
//! mirrored inside the picture extent: `y' = top + bottom - y`.

use std::io::Write;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use glam::dvec2;

use crate::backends::{Lazy, Output, Pass};
use crate::errors::RenderError;
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::types::{
    Alignment, BezPoint, Color, Image, LineCaps, LineJoin, LineStyle, Point, Rect,
};

/// Longest parameter list one header can announce.
const MAX_PARTITION: usize = 0x7ffe;

/// Fonts announced in the metafile font list, indexed from 1.
const FONT_LIST: [&str; 12] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

#[derive(Clone, Debug)]
pub struct CgmOptions {
    /// Written into the metafile description element.
    pub description: String,
}

impl Default for CgmOptions {
    fn default() -> Self {
        Self {
            description: "drawstream".to_string(),
        }
    }
}

impl CgmOptions {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Encode `x` as 16.16 fixed point.
///
/// Negative values with a fractional part borrow one from the whole part
/// and store the complemented fraction, so that `whole + fraction / 65536`
/// still equals `x`.
pub fn fixed_point(x: f64) -> u32 {
    if x < 0.0 {
        let mut whole = x as i32;
        let mut fraction = ((x - whole as f64) * -65536.0) as u32;
        if fraction > 0 {
            whole -= 1;
            fraction = 65536 - fraction;
        }
        (whole.wrapping_shl(16) as u32) | (fraction & 0xffff)
    } else {
        (x * 65536.0) as u32
    }
}

/// Header word (and long-form length word) for an element.
///
/// `more` marks a partition that is continued by another one.
pub fn element_header(class: u16, id: u16, len: usize, more: bool) -> Vec<u8> {
    let head = ((class & 0x0f) << 12) | ((id & 0x7f) << 5);
    let mut buf = [0u8; 4];
    if len >= 31 || more {
        BigEndian::write_u16(&mut buf[..2], head | 31);
        let len = (len as u16 & 0x7fff) | if more { 0x8000 } else { 0 };
        BigEndian::write_u16(&mut buf[2..], len);
        buf.to_vec()
    } else {
        BigEndian::write_u16(&mut buf[..2], head | len as u16);
        buf[..2].to_vec()
    }
}

/// Parameter bytes of one element.
#[derive(Default)]
struct Params(Vec<u8>);

impl Params {
    fn int(&mut self, n: i16) -> &mut Self {
        let mut b = [0; 2];
        BigEndian::write_i16(&mut b, n);
        self.0.extend_from_slice(&b);
        self
    }

    fn real(&mut self, x: f64) -> &mut Self {
        let mut b = [0; 4];
        BigEndian::write_u32(&mut b, fixed_point(x));
        self.0.extend_from_slice(&b);
        self
    }

    fn point(&mut self, p: Point) -> &mut Self {
        self.real(p.x).real(p.y)
    }

    fn color(&mut self, rgb: [u8; 3]) -> &mut Self {
        self.0.extend_from_slice(&rgb);
        self
    }

    /// Length-prefixed Latin-1 string.
    fn string(&mut self, s: &str) -> &mut Self {
        let mut bytes: Vec<u8> = s
            .chars()
            .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
            .collect();
        if bytes.len() > 254 {
            warn!(len = bytes.len(), "cgm string too long, truncating");
            bytes.truncate(254);
        }
        self.0.push(bytes.len() as u8);
        self.0.extend_from_slice(&bytes);
        self
    }
}

fn rgb(color: &Color) -> [u8; 3] {
    let [r, g, b, _] = color.to_rgba8();
    [r, g, b]
}

fn line_type(style: LineStyle) -> i16 {
    match style {
        LineStyle::Solid => 1,
        LineStyle::Dashed => 2,
        LineStyle::Dotted => 3,
        LineStyle::DashDot => 4,
        LineStyle::DashDotDot => 5,
    }
}

fn cap_code(caps: LineCaps) -> i16 {
    match caps {
        LineCaps::Butt => 2,
        LineCaps::Round => 3,
        LineCaps::Projecting => 4,
    }
}

fn join_code(join: LineJoin) -> i16 {
    match join {
        LineJoin::Miter => 2,
        LineJoin::Round => 3,
        LineJoin::Bevel => 4,
    }
}

#[derive(Debug, Default)]
struct LineAttrs {
    width: Lazy<f64>,
    kind: Lazy<i16>,
    cap: Lazy<i16>,
    join: Lazy<i16>,
    color: Lazy<[u8; 3]>,
}

#[derive(Debug, Default)]
struct EdgeAttrs {
    interior: Lazy<i16>,
    fill: Lazy<[u8; 3]>,
    visible: Lazy<i16>,
    width: Lazy<f64>,
    kind: Lazy<i16>,
    cap: Lazy<i16>,
    join: Lazy<i16>,
    color: Lazy<[u8; 3]>,
}

#[derive(Debug, Default)]
struct TextAttrs {
    font: Lazy<i16>,
    height: Lazy<f64>,
    color: Lazy<[u8; 3]>,
    align: Lazy<i16>,
}

/// CGM writer.
pub struct CgmRenderer<W: Write> {
    out: Output<W>,
    options: CgmOptions,
    state: RenderState,
    pass: Pass,
    /// `top + bottom` of the picture, for the y flip.
    flip: f64,
    line: LineAttrs,
    edge: EdgeAttrs,
    text: TextAttrs,
}

impl<W: Write> CgmRenderer<W> {
    pub fn new(sink: W, options: CgmOptions) -> Self {
        Self {
            out: Output::new(sink),
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            flip: 0.0,
            line: LineAttrs::default(),
            edge: EdgeAttrs::default(),
            text: TextAttrs::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn element(&mut self, class: u16, id: u16, params: &Params) {
        let bytes = &params.0;
        if bytes.len() <= MAX_PARTITION {
            self.out.write_bytes(&element_header(class, id, bytes.len(), false));
            self.out.write_bytes(bytes);
            if bytes.len() % 2 == 1 {
                self.out.write_bytes(&[0]);
            }
            return;
        }
        let mut chunks = bytes.chunks(MAX_PARTITION).peekable();
        let mut first = true;
        while let Some(chunk) = chunks.next() {
            let more = chunks.peek().is_some();
            if first {
                self.out.write_bytes(&element_header(class, id, chunk.len(), more));
            } else {
                // continuation partitions carry only the length word
                let mut word = [0; 2];
                BigEndian::write_u16(&mut word, chunk.len() as u16 | if more { 0x8000 } else { 0 });
                self.out.write_bytes(&word);
            }
            self.out.write_bytes(chunk);
            if chunk.len() % 2 == 1 {
                self.out.write_bytes(&[0]);
            }
            first = false;
        }
    }

    fn flipped(&self, p: Point) -> Point {
        dvec2(p.x, self.flip - p.y)
    }

    fn points(&self, params: &mut Params, points: &[Point]) {
        for &p in points {
            params.point(self.flipped(p));
        }
    }

    fn attr_int(&mut self, id: u16, value: i16) {
        let mut p = Params::default();
        p.int(value);
        self.element(5, id, &p);
    }

    fn attr_real(&mut self, id: u16, value: f64) {
        let mut p = Params::default();
        p.real(value);
        self.element(5, id, &p);
    }

    fn attr_color(&mut self, id: u16, value: [u8; 3]) {
        let mut p = Params::default();
        p.color(value);
        self.element(5, id, &p);
    }

    fn sync_line(&mut self, color: &Color) {
        let s = self.state.stroke.clone();
        if self.line.width.update(&s.width) {
            self.attr_real(3, s.width);
        }
        let kind = line_type(s.style);
        if self.line.kind.update(&kind) {
            self.attr_int(2, kind);
        }
        let cap = cap_code(s.caps);
        if self.line.cap.update(&cap) {
            // line cap, then dash cap "unspecified"
            let mut p = Params::default();
            p.int(cap).int(1);
            self.element(5, 37, &p);
        }
        let join = join_code(s.join);
        if self.line.join.update(&join) {
            self.attr_int(38, join);
        }
        let color = rgb(color);
        if self.line.color.update(&color) {
            self.attr_color(4, color);
        }
    }

    fn sync_fill_edge(&mut self, fill: Option<&Color>, stroke: Option<&Color>) {
        let interior = if fill.is_some() { 1 } else { 4 };
        if self.edge.interior.update(&interior) {
            self.attr_int(22, interior);
        }
        if let Some(fill) = fill {
            let fill = rgb(fill);
            if self.edge.fill.update(&fill) {
                self.attr_color(23, fill);
            }
        }
        let visible = stroke.is_some() as i16;
        if self.edge.visible.update(&visible) {
            self.attr_int(30, visible);
        }
        let Some(stroke) = stroke else {
            return;
        };
        let s = self.state.stroke.clone();
        if self.edge.width.update(&s.width) {
            self.attr_real(28, s.width);
        }
        let kind = line_type(s.style);
        if self.edge.kind.update(&kind) {
            self.attr_int(27, kind);
        }
        let cap = cap_code(s.caps);
        if self.edge.cap.update(&cap) {
            let mut p = Params::default();
            p.int(cap).int(1);
            self.element(5, 44, &p);
        }
        let join = join_code(s.join);
        if self.edge.join.update(&join) {
            self.attr_int(45, join);
        }
        let color = rgb(stroke);
        if self.edge.color.update(&color) {
            self.attr_color(29, color);
        }
    }

    /// Polyline and polybezier elements for a path, one element per run
    /// of straight or curved segments.
    fn path_segments(&mut self, path: &[BezPoint]) {
        let mut current = Point::ZERO;
        let mut i = 0;
        while i < path.len() {
            match path[i] {
                BezPoint::MoveTo(p) => {
                    current = p;
                    i += 1;
                }
                BezPoint::LineTo(p) if i == 0 => {
                    warn!("first BezPoint must be a MoveTo");
                    current = p;
                    i += 1;
                }
                BezPoint::LineTo(_) => {
                    let mut run = vec![current];
                    while let Some(BezPoint::LineTo(p)) = path.get(i) {
                        run.push(*p);
                        i += 1;
                    }
                    current = run[run.len() - 1];
                    let mut params = Params::default();
                    self.points(&mut params, &run);
                    self.element(4, 1, &params);
                }
                BezPoint::CurveTo(..) => {
                    let mut params = Params::default();
                    // continuous: start point, then three points per curve
                    params.int(2);
                    params.point(self.flipped(current));
                    while let Some(BezPoint::CurveTo(c1, c2, p)) = path.get(i) {
                        self.points(&mut params, &[*c1, *c2, *p]);
                        current = *p;
                        i += 1;
                    }
                    self.element(4, 26, &params);
                }
            }
        }
    }

    /// Center and conjugate diameter end points of an ellipse.
    fn ellipse_params(&self, params: &mut Params, center: Point, width: f64, height: f64) {
        let c = self.flipped(center);
        params
            .point(c)
            .point(dvec2(c.x + width / 2.0, c.y))
            .point(dvec2(c.x, c.y + height / 2.0));
    }

    fn arc_params(
        &self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
    ) -> Params {
        let (rx, ry) = (width / 2.0, height / 2.0);
        let (a1, a2) = (angle1.to_radians(), angle2.to_radians());
        let mut params = Params::default();
        self.ellipse_params(&mut params, center, width, height);
        params
            .real(rx * a1.cos())
            .real(ry * a1.sin())
            .real(rx * a2.cos())
            .real(ry * a2.sin());
        params
    }
}

impl<W: Write> Renderer for CgmRenderer<W> {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn begin_render(&mut self, region: Option<Rect>) -> Result<(), RenderError> {
        self.pass.begin()?;
        let extent = region.unwrap_or_default();
        self.flip = extent.top + extent.bottom;
        self.line = LineAttrs::default();
        self.edge = EdgeAttrs::default();
        self.text = TextAttrs::default();
        debug!(?extent, "cgm pass");

        let mut p = Params::default();
        p.string("drawstream");
        self.element(0, 1, &p);

        // version 3 for polybeziers
        let mut p = Params::default();
        p.int(3);
        self.element(1, 1, &p);

        let mut p = Params::default();
        p.string(&self.options.description);
        self.element(1, 2, &p);

        // VDC type real
        let mut p = Params::default();
        p.int(1);
        self.element(1, 3, &p);

        let mut p = Params::default();
        p.int(16);
        self.element(1, 4, &p);

        // fixed point, 16 bits whole, 16 bits fraction
        let mut p = Params::default();
        p.int(1).int(16).int(16);
        self.element(1, 5, &p);

        let mut p = Params::default();
        p.int(8);
        self.element(1, 7, &p);

        // element list: drawing plus control set
        let mut p = Params::default();
        p.int(1).int(-1).int(5);
        self.element(1, 11, &p);

        let mut p = Params::default();
        for name in FONT_LIST {
            p.string(name);
        }
        self.element(1, 13, &p);

        let mut p = Params::default();
        p.string("");
        self.element(0, 3, &p);

        // direct colour
        let mut p = Params::default();
        p.int(1);
        self.element(2, 2, &p);

        // line and edge widths in VDC units
        let mut p = Params::default();
        p.int(0);
        self.element(2, 3, &p);
        self.element(2, 5, &p);

        let mut p = Params::default();
        p.real(extent.left)
            .real(extent.top)
            .real(extent.right)
            .real(extent.bottom);
        self.element(2, 6, &p);

        self.element(0, 4, &Params::default());

        let mut p = Params::default();
        p.int(1).int(16).int(16);
        self.element(3, 2, &p);

        // text upright: up vector, then base vector
        let mut p = Params::default();
        p.real(0.0).real(1.0).real(1.0).real(0.0);
        self.element(5, 16, &p);
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()?;
        self.element(0, 5, &Params::default());
        self.element(0, 2, &Params::default());
        self.out.finish()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.sync_line(color);
        let mut params = Params::default();
        self.points(&mut params, &[start, end]);
        self.element(4, 1, &params);
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        if points.len() < 2 {
            return;
        }
        self.sync_line(color);
        let mut params = Params::default();
        self.points(&mut params, points);
        self.element(4, 1, &params);
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        if points.len() < 3 || (fill.is_none() && stroke.is_none()) {
            return;
        }
        self.sync_fill_edge(fill, stroke);
        let mut params = Params::default();
        self.points(&mut params, points);
        self.element(4, 7, &params);
    }

    fn draw_rect(&mut self, ul: Point, lr: Point, fill: Option<&Color>, stroke: Option<&Color>) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        self.sync_fill_edge(fill, stroke);
        let mut params = Params::default();
        self.points(&mut params, &[ul, lr]);
        self.element(4, 11, &params);
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
        self.sync_line(color);
        let params = self.arc_params(center, width, height, angle1, angle2);
        self.element(4, 18, &params);
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
        self.sync_fill_edge(Some(color), None);
        let mut params = self.arc_params(center, width, height, angle1, angle2);
        // pie closure
        params.int(0);
        self.element(4, 19, &params);
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
        self.sync_fill_edge(fill, stroke);
        let mut params = Params::default();
        self.ellipse_params(&mut params, center, width, height);
        self.element(4, 17, &params);
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        if points.is_empty() {
            return;
        }
        self.sync_line(color);
        self.path_segments(points);
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        if points.is_empty() || (fill.is_none() && stroke.is_none()) {
            return;
        }
        if crate::geometry::extra_subpaths(points) > 0 {
            warn!("renderer cannot draw holes, joining subpaths");
        }
        self.sync_fill_edge(fill, stroke);
        // the segments form one closed figure
        self.element(0, 8, &Params::default());
        self.path_segments(points);
        self.element(0, 9, &Params::default());
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        let name = self.state.font.clone().unwrap_or_default().ps_name();
        let font = match FONT_LIST.iter().position(|f| *f == name) {
            Some(i) => i as i16 + 1,
            None => {
                debug!(%name, "font not in the cgm font list, using the first");
                1
            }
        };
        if self.text.font.update(&font) {
            self.attr_int(10, font);
        }
        let height = self.state.font_height;
        if self.text.height.update(&height) {
            self.attr_real(15, height);
        }
        let color = rgb(color);
        if self.text.color.update(&color) {
            self.attr_color(14, color);
        }
        let align = match alignment {
            Alignment::Left => 1,
            Alignment::Center => 2,
            Alignment::Right => 3,
        };
        if self.text.align.update(&align) {
            // horizontal, then baseline vertical, then unused continuous
            // alignment values
            let mut p = Params::default();
            p.int(align).int(4).real(0.0).real(0.0);
            self.element(5, 18, &p);
        }
        let mut params = Params::default();
        params.point(self.flipped(pos)).int(1).string(text);
        self.element(4, 4, &params);
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() {
            return;
        }
        let (w, h) = (image.width(), image.height());
        if w > i16::MAX as u32 || h > i16::MAX as u32 {
            warn!(w, h, "image too large for a cell array, skipping");
            return;
        }
        let mut params = Params::default();
        // corners P (first row start), Q (diagonal), R (first row end)
        self.points(
            &mut params,
            &[
                pos,
                dvec2(pos.x + width, pos.y + height),
                dvec2(pos.x + width, pos.y),
            ],
        );
        // local colour precision 8, packed representation
        params.int(w as i16).int(h as i16).int(8).int(1);
        let rgb = image.composited_rgb();
        for row in rgb.chunks(w as usize * 3) {
            params.0.extend_from_slice(row);
            if row.len() % 2 == 1 {
                params.0.push(0);
            }
        }
        self.element(4, 9, &params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split a metafile into (class, id, params) triples.
    fn elements(bytes: &[u8]) -> Vec<(u16, u16, Vec<u8>)> {
        let mut out = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            let head = BigEndian::read_u16(&bytes[at..]);
            at += 2;
            let (class, id) = (head >> 12, (head >> 5) & 0x7f);
            let mut params = Vec::new();
            let mut len = (head & 0x1f) as usize;
            let mut more = false;
            if len == 31 {
                let word = BigEndian::read_u16(&bytes[at..]);
                at += 2;
                len = (word & 0x7fff) as usize;
                more = word & 0x8000 != 0;
            }
            loop {
                params.extend_from_slice(&bytes[at..at + len]);
                at += len + len % 2;
                if !more {
                    break;
                }
                let word = BigEndian::read_u16(&bytes[at..]);
                at += 2;
                len = (word & 0x7fff) as usize;
                more = word & 0x8000 != 0;
            }
            out.push((class, id, params));
        }
        out
    }

    fn render(draw: impl FnOnce(&mut CgmRenderer<Vec<u8>>)) -> Vec<(u16, u16, Vec<u8>)> {
        let mut r = CgmRenderer::new(Vec::new(), CgmOptions::default());
        r.begin_render(Some(Rect::new(0.0, 0.0, 10.0, 5.0))).unwrap();
        draw(&mut r);
        r.end_render().unwrap();
        elements(&r.into_inner())
    }

    fn real_at(params: &[u8], index: usize) -> f64 {
        BigEndian::read_i32(&params[index * 4..]) as f64 / 65536.0
    }

    #[test]
    fn fixed_point_borrows_for_negative_fractions() {
        assert_eq!(fixed_point(1.5), 0x0001_8000);
        assert_eq!(fixed_point(-2.0), 0xfffe_0000);
        assert_eq!(fixed_point(-1.5), 0xfffe_8000);
        assert_eq!(fixed_point(-1.5) as i32, -98304);
        assert_eq!(fixed_point(-0.25) as i32, -16384);
    }

    #[test]
    fn short_and_long_headers() {
        assert_eq!(element_header(4, 1, 16, false), vec![0x40, 0x30]);
        assert_eq!(element_header(4, 1, 30, false), vec![0x40, 0x3e]);
        assert_eq!(element_header(4, 1, 40, false), vec![0x40, 0x3f, 0x00, 0x28]);
        assert_eq!(element_header(4, 9, 100, true), vec![0x41, 0x3f, 0x80, 0x64]);
    }

    #[test]
    fn metafile_is_bracketed() {
        let els = render(|_| {});
        assert_eq!(els[0].0, 0);
        assert_eq!(els[0].1, 1);
        assert_eq!(els[0].2[0], 10);
        assert_eq!(&els[0].2[1..], b"drawstream");
        let tail: Vec<_> = els[els.len() - 2..].iter().map(|e| (e.0, e.1)).collect();
        assert_eq!(tail, vec![(0, 5), (0, 2)]);
        assert!(els.iter().any(|e| (e.0, e.1) == (0, 4)));
    }

    #[test]
    fn line_is_flipped_and_color_emitted_once() {
        let els = render(|r| {
            r.draw_line(dvec2(0.0, 0.0), dvec2(1.0, 1.0), &Color::RED);
            r.draw_line(dvec2(2.0, 0.0), dvec2(3.0, 1.0), &Color::RED);
            r.draw_line(dvec2(2.0, 0.0), dvec2(3.0, 1.0), &Color::BLACK);
        });
        let colors: Vec<_> = els.iter().filter(|e| (e.0, e.1) == (5, 4)).collect();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0].2, vec![255, 0, 0]);
        let lines: Vec<_> = els.iter().filter(|e| (e.0, e.1) == (4, 1)).collect();
        assert_eq!(lines.len(), 3);
        let p = &lines[0].2;
        assert_eq!(
            (real_at(p, 0), real_at(p, 1), real_at(p, 2), real_at(p, 3)),
            (0.0, 5.0, 1.0, 4.0)
        );
        // width, type, cap, join once each
        assert_eq!(els.iter().filter(|e| (e.0, e.1) == (5, 3)).count(), 1);
        assert_eq!(els.iter().filter(|e| (e.0, e.1) == (5, 2)).count(), 1);
    }

    #[test]
    fn fill_only_polygon_hides_edge() {
        let els = render(|r| {
            let pts = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 1.0)];
            r.draw_polygon(&pts, Some(&Color::WHITE), None);
        });
        let find = |id| els.iter().find(|e| (e.0, e.1) == (5, id)).map(|e| e.2.clone());
        assert_eq!(find(22), Some(vec![0, 1]));
        assert_eq!(find(30), Some(vec![0, 0]));
        assert_eq!(find(23), Some(vec![255, 255, 255]));
        assert_eq!(find(29), None);
    }

    #[test]
    fn bezier_runs_split_by_kind() {
        let els = render(|r| {
            let path = [
                BezPoint::MoveTo(dvec2(0.0, 0.0)),
                BezPoint::LineTo(dvec2(1.0, 0.0)),
                BezPoint::LineTo(dvec2(2.0, 0.0)),
                BezPoint::CurveTo(dvec2(3.0, 0.0), dvec2(3.0, 1.0), dvec2(2.0, 1.0)),
                BezPoint::CurveTo(dvec2(1.0, 1.0), dvec2(1.0, 2.0), dvec2(0.0, 2.0)),
            ];
            r.draw_bezier(&path, &Color::BLACK);
        });
        let body: Vec<_> = els
            .iter()
            .filter(|e| e.0 == 4)
            .map(|e| (e.1, e.2.len()))
            .collect();
        // three-point polyline, then one continuous polybezier of two curves
        assert_eq!(body, vec![(1, 24), (26, 2 + 8 + 2 * 24)]);
    }

    #[test]
    fn beziergon_is_a_closed_figure() {
        let els = render(|r| {
            let path = [
                BezPoint::MoveTo(dvec2(0.0, 0.0)),
                BezPoint::CurveTo(dvec2(1.0, 0.0), dvec2(1.0, 1.0), dvec2(0.0, 1.0)),
            ];
            r.draw_beziergon(&path, Some(&Color::RED), Some(&Color::BLACK));
        });
        let ids: Vec<_> = els
            .iter()
            .filter(|e| e.0 == 0 && (e.1 == 8 || e.1 == 9) || e.0 == 4)
            .map(|e| (e.0, e.1))
            .collect();
        assert_eq!(ids, vec![(0, 8), (4, 26), (0, 9)]);
    }

    #[test]
    fn text_carries_string_and_alignment() {
        let els = render(|r| {
            r.set_font(&crate::types::Font::new("serif"), 0.5);
            r.draw_string("Hi", dvec2(1.0, 1.0), Alignment::Center, &Color::BLACK);
        });
        let text = els.iter().find(|e| (e.0, e.1) == (4, 4)).unwrap();
        assert_eq!(&text.2[8..], &[0, 1, 2, b'H', b'i']);
        let font = els.iter().find(|e| (e.0, e.1) == (5, 10)).unwrap();
        assert_eq!(font.2, vec![0, 5]);
        let align = els.iter().find(|e| (e.0, e.1) == (5, 18)).unwrap();
        assert_eq!(&align.2[..4], &[0, 2, 0, 4]);
    }

    #[test]
    fn large_image_is_partitioned() {
        let img = Image::new(200, 100, vec![7; 200 * 100 * 3]).unwrap();
        let els = render(|r| {
            r.draw_image(dvec2(0.0, 0.0), 2.0, 1.0, &Arc::new(img));
        });
        let cells = els.iter().find(|e| (e.0, e.1) == (4, 9)).unwrap();
        assert_eq!(cells.2.len(), 24 + 8 + 200 * 100 * 3);
    }
}
