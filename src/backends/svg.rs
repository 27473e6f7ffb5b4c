//! SVG output.
//!
//! Each primitive becomes one element with an inline `style`. Coordinates
//! stay in diagram units; the root `viewBox` maps them onto the page and
//! `width`/`height` carry the pixel size from [`SvgOptions::scale`]. The
//! document is serialized when the pass ends.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use svg::Document;
use svg::node::Text as TextNode;
use svg::node::element::{
    Element, Ellipse, Image as ImageElement, Line, Path, Polygon, Polyline, Text,
};

use crate::backends::{Output, Pass};
use crate::errors::RenderError;
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::stroke::DashConvention;
use crate::types::{
    Alignment, BezPoint, Capabilities, Color, FontSlant, FontWeight, Image, LineCaps, LineJoin,
    Point, Rect,
};

#[derive(Clone, Debug)]
pub struct SvgOptions {
    /// Pixels per diagram unit for the root `width`/`height`.
    pub scale: f64,
    /// Family used for text drawn before any font is set.
    pub font_family: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            scale: 20.0,
            font_family: "sans".to_string(),
        }
    }
}

impl SvgOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }
}

/// SVG writer.
pub struct SvgRenderer<W: Write> {
    out: Output<W>,
    options: SvgOptions,
    state: RenderState,
    pass: Pass,
    region: Rect,
    elements: Vec<Element>,
}

impl<W: Write> SvgRenderer<W> {
    pub fn new(sink: W, options: SvgOptions) -> Self {
        Self {
            out: Output::new(sink),
            options,
            state: RenderState::new(),
            pass: Pass::default(),
            region: Rect::default(),
            elements: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Inline style for a shape with an optional fill and outline.
    fn style(&self, fill: Option<&Color>, stroke: Option<&Color>, even_odd: bool) -> String {
        let mut style = match fill {
            Some(c) => format!("fill: {}; fill-opacity: {}", c.to_hex(), c.alpha),
            None => "fill: none".to_string(),
        };
        if fill.is_some() && even_odd {
            style.push_str("; fill-rule: evenodd");
        }
        let Some(stroke) = stroke else {
            return style;
        };

        let s = &self.state.stroke;
        let width = if s.width == 0.0 { 0.001 } else { s.width };
        let _ = write!(style, "; stroke-opacity: {}; stroke-width: {width}", stroke.alpha);
        match s.caps {
            LineCaps::Butt => {}
            LineCaps::Round => style.push_str("; stroke-linecap: round"),
            LineCaps::Projecting => style.push_str("; stroke-linecap: square"),
        }
        match s.join {
            LineJoin::Miter => {}
            LineJoin::Round => style.push_str("; stroke-linejoin: round"),
            LineJoin::Bevel => style.push_str("; stroke-linejoin: bevel"),
        }
        let runs = DashConvention::DOCUMENT.pattern(s.style, s.dash_length);
        if !runs.is_empty() {
            let runs: Vec<String> = runs.iter().map(|r| r.to_string()).collect();
            let _ = write!(style, "; stroke-dasharray: {}", runs.join(" "));
        }
        let _ = write!(style, "; stroke: {}", stroke.to_hex());
        style
    }

    fn push(&mut self, element: impl Into<Element>) {
        self.elements.push(element.into());
    }
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Path data for an elliptic arc, always swept counter-clockwise on screen.
fn arc_data(center: Point, width: f64, height: f64, angle1: f64, angle2: f64) -> String {
    let (rx, ry) = (width / 2.0, height / 2.0);
    let (a1, a2) = (angle1.to_radians(), angle2.to_radians());
    let (sx, sy) = (center.x + rx * a1.cos(), center.y - ry * a1.sin());
    let (ex, ey) = (center.x + rx * a2.cos(), center.y - ry * a2.sin());
    let large_arc = (angle2 - angle1 >= 180.0) as u8;
    format!("M {sx},{sy} A {rx},{ry} 0 {large_arc} 0 {ex},{ey}")
}

fn bezier_data(points: &[BezPoint], close: bool) -> String {
    let mut d = String::new();
    for (i, bp) in points.iter().enumerate() {
        let sep = if i == 0 { "" } else { " " };
        match *bp {
            BezPoint::MoveTo(p) => {
                let _ = write!(d, "{sep}M {},{}", p.x, p.y);
            }
            BezPoint::LineTo(p) if i == 0 => {
                warn!("first BezPoint must be a MoveTo");
                let _ = write!(d, "M {},{}", p.x, p.y);
            }
            BezPoint::LineTo(p) => {
                let _ = write!(d, "{sep}L {},{}", p.x, p.y);
            }
            BezPoint::CurveTo(c1, c2, p) => {
                let _ = write!(
                    d,
                    "{sep}C {},{} {},{} {},{}",
                    c1.x, c1.y, c2.x, c2.y, p.x, p.y
                );
            }
        }
    }
    if close {
        d.push_str(" z");
    }
    d
}

impl<W: Write> Renderer for SvgRenderer<W> {
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
        self.region = region.unwrap_or_default();
        self.elements.clear();
        debug!(scale = self.options.scale, "svg pass");
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()?;
        let r = self.region;
        let scale = self.options.scale;
        let mut doc = Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set("xmlns:xlink", "http://www.w3.org/1999/xlink")
            .set("width", r.width() * scale)
            .set("height", r.height() * scale)
            .set("viewBox", (r.left, r.top, r.width(), r.height()));
        for element in self.elements.drain(..) {
            doc = doc.add(element);
        }
        self.out.write_bytes(doc.to_string().as_bytes());
        self.out.write_bytes(b"\n");
        self.out.finish()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        let line = Line::new()
            .set("x1", start.x)
            .set("y1", start.y)
            .set("x2", end.x)
            .set("y2", end.y)
            .set("style", self.style(None, Some(color), false));
        self.push(line);
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        if points.len() < 2 {
            return;
        }
        let polyline = Polyline::new()
            .set("points", points_attr(points))
            .set("style", self.style(None, Some(color), false));
        self.push(polyline);
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        if points.len() < 2 || (fill.is_none() && stroke.is_none()) {
            return;
        }
        let polygon = Polygon::new()
            .set("points", points_attr(points))
            .set("style", self.style(fill, stroke, true));
        self.push(polygon);
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
        let path = Path::new()
            .set("style", self.style(None, Some(color), false))
            .set("d", arc_data(center, width, height, angle1, angle2));
        self.push(path);
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
        let d = format!(
            "{} L {},{} z",
            arc_data(center, width, height, angle1, angle2),
            center.x,
            center.y
        );
        let path = Path::new()
            .set("style", self.style(Some(color), None, true))
            .set("d", d);
        self.push(path);
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
        let ellipse = Ellipse::new()
            .set("style", self.style(fill, stroke, false))
            .set("cx", center.x)
            .set("cy", center.y)
            .set("rx", width / 2.0)
            .set("ry", height / 2.0);
        self.push(ellipse);
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        if points.is_empty() {
            return;
        }
        let path = Path::new()
            .set("style", self.style(None, Some(color), false))
            .set("d", bezier_data(points, false));
        self.push(path);
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
        let path = Path::new()
            .set("style", self.style(fill, stroke, true))
            .set("d", bezier_data(points, true));
        self.push(path);
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        let anchor = match alignment {
            Alignment::Left => "start",
            Alignment::Center => "middle",
            Alignment::Right => "end",
        };
        let (family, slant, weight) = match &self.state.font {
            Some(font) => (font.family.to_string(), font.slant, font.weight),
            None => (
                self.options.font_family.clone(),
                FontSlant::Normal,
                FontWeight::Normal,
            ),
        };
        let slant = match slant {
            FontSlant::Normal => "normal",
            FontSlant::Italic => "italic",
            FontSlant::Oblique => "oblique",
        };
        let weight = match weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let style = format!(
            "{}; font-size: {}; text-anchor:{anchor}; font-family: {family}; font-style: {slant}; font-weight: {weight}",
            self.style(Some(color), None, false),
            self.state.font_height
        );
        let element = Text::new()
            .set("style", style)
            .set("x", pos.x)
            .set("y", pos.y)
            .add(TextNode::new(text));
        self.push(element);
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() {
            return;
        }
        let Some(filename) = image.filename() else {
            warn!("svg output links images by file name, skipping an unnamed image");
            return;
        };
        let element = ImageElement::new()
            .set("x", pos.x)
            .set("y", pos.y)
            .set("width", width)
            .set("height", height)
            .set("xlink:href", filename);
        self.push(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Font, LineStyle};
    use glam::dvec2;

    fn render(draw: impl FnOnce(&mut SvgRenderer<Vec<u8>>)) -> String {
        let mut r = SvgRenderer::new(Vec::new(), SvgOptions::default());
        r.begin_render(Some(Rect::new(0.0, 0.0, 10.0, 5.0))).unwrap();
        draw(&mut r);
        r.end_render().unwrap();
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn root_carries_view_box_and_pixel_size() {
        let out = render(|_| {});
        assert!(out.contains(r#"viewBox="0 0 10 5""#));
        assert!(out.contains(r#"width="200""#));
        assert!(out.contains(r#"height="100""#));
    }

    #[test]
    fn line_style_omits_defaults() {
        let out = render(|r| {
            r.set_linewidth(0.1);
            r.draw_line(dvec2(0.0, 0.0), dvec2(1.0, 2.0), &Color::RED);
        });
        assert!(out.contains(
            r#"style="fill: none; stroke-opacity: 1; stroke-width: 0.1; stroke: #ff0000""#
        ));
        assert!(out.contains(r#"x2="1""#));
    }

    #[test]
    fn non_default_caps_join_and_dashes_are_written() {
        let out = render(|r| {
            r.set_linecaps(LineCaps::Round);
            r.set_linejoin(LineJoin::Bevel);
            r.set_linestyle(LineStyle::Dashed, 0.5);
            r.draw_line(dvec2(0.0, 0.0), dvec2(1.0, 0.0), &Color::BLACK);
        });
        assert!(out.contains("stroke-width: 0.001"));
        assert!(out.contains("stroke-linecap: round"));
        assert!(out.contains("stroke-linejoin: bevel"));
        assert!(out.contains("stroke-dasharray: 0.5 0.5"));
    }

    #[test]
    fn arc_uses_path_arc_command() {
        let out = render(|r| {
            r.draw_arc(dvec2(0.0, 0.0), 2.0, 2.0, 0.0, 270.0, &Color::BLACK);
        });
        assert!(out.contains("M 1,0 A 1,1 0 1 0 "));
    }

    #[test]
    fn filled_arc_closes_through_center() {
        let out = render(|r| {
            r.fill_arc(dvec2(3.0, 4.0), 2.0, 2.0, 0.0, 90.0, &Color::BLACK);
        });
        assert!(out.contains("M 4,4 A 1,1 0 0 0 "));
        assert!(out.contains(" L 3,4 z"));
        assert!(out.contains("fill: #000000; fill-opacity: 1; fill-rule: evenodd"));
    }

    #[test]
    fn self_intersecting_polygon_fills_even_odd() {
        let out = render(|r| {
            let bow_tie = [
                dvec2(0.0, 0.0),
                dvec2(4.0, 4.0),
                dvec2(4.0, 0.0),
                dvec2(0.0, 4.0),
            ];
            r.draw_polygon(&bow_tie, Some(&Color::BLACK), None);
        });
        assert!(out.contains(
            r#"<polygon points="0,0 4,4 4,0 0,4" style="fill: #000000; fill-opacity: 1; fill-rule: evenodd"/>"#
        ));
    }

    #[test]
    fn path_data_uses_comma_pairs() {
        let out = render(|r| {
            let path = [
                BezPoint::MoveTo(dvec2(0.0, 1.0)),
                BezPoint::LineTo(dvec2(2.0, 3.0)),
            ];
            r.draw_bezier(&path, &Color::BLACK);
        });
        assert!(out.contains(r#"d="M 0,1 L 2,3""#));
    }

    #[test]
    fn beziergon_fills_even_odd() {
        let out = render(|r| {
            let path = [
                BezPoint::MoveTo(dvec2(0.0, 0.0)),
                BezPoint::CurveTo(dvec2(1.0, 0.0), dvec2(1.0, 1.0), dvec2(0.0, 1.0)),
            ];
            r.draw_beziergon(&path, Some(&Color::WHITE), Some(&Color::BLACK));
        });
        assert!(out.contains("fill-rule: evenodd"));
        assert!(out.contains(r#"d="M 0,0 C 1,0 1,1 0,1 z""#));
    }

    #[test]
    fn text_anchor_follows_alignment() {
        let out = render(|r| {
            r.set_font(&Font::new("serif").with_weight(FontWeight::Bold), 0.8);
            r.draw_string("Hello", dvec2(1.0, 2.0), Alignment::Center, &Color::BLACK);
            r.draw_string("", dvec2(1.0, 2.0), Alignment::Center, &Color::BLACK);
        });
        assert!(out.contains("font-size: 0.8; text-anchor:middle; font-family: serif"));
        assert!(out.contains("font-weight: bold"));
        assert_eq!(out.matches("Hello").count(), 1);
        assert_eq!(out.matches("<text").count(), 1);
    }

    #[test]
    fn images_need_a_file_name() {
        let out = render(|r| {
            let bare = Arc::new(Image::new(1, 1, vec![0, 0, 0]).unwrap());
            r.draw_image(dvec2(0.0, 0.0), 1.0, 1.0, &bare);
            let named = Arc::new(
                Image::new(1, 1, vec![0, 0, 0])
                    .unwrap()
                    .with_filename("pic.png"),
            );
            r.draw_image(dvec2(0.0, 0.0), 1.0, 1.0, &named);
        });
        assert_eq!(out.matches("<image").count(), 1);
        assert!(out.contains(r#"xlink:href="pic.png""#));
    }
}
