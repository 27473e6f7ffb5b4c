//! The renderer contract.
//!
//! Diagram objects draw themselves by calling [`Renderer`] methods in order.
//! Line attributes, fill style and font are sticky: a setter affects every
//! later drawing call until the next setter. Colors are passed per call.
//!
//! Only the low-level primitives are required. The medium-level operations
//! (polylines, rectangles, rounded shapes, Bezier paths, multi-line text,
//! arrows) have provided implementations built from them, which backends
//! with a native equivalent override.

use std::sync::Arc;

use glam::dvec2;

use crate::errors::RenderError;
use crate::geometry::{BezierApprox, CircleArc, extra_subpaths, fillet};
use crate::log::warn;
use crate::stroke::clamp_dash_length;
use crate::types::{
    Alignment, Arrow, ArrowKind, BezPoint, Capabilities, Color, FillStyle, Font, Image, LineCaps,
    LineJoin, LineStyle, Point, Rect,
};

/// Line attributes in effect.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeState {
    /// 0 means the thinnest line the output can show.
    pub width: f64,
    pub caps: LineCaps,
    pub join: LineJoin,
    pub style: LineStyle,
    /// Base length for dash patterns, always at least 0.001.
    pub dash_length: f64,
}

impl Default for StrokeState {
    fn default() -> Self {
        Self {
            width: 0.0,
            caps: LineCaps::Butt,
            join: LineJoin::Miter,
            style: LineStyle::Solid,
            dash_length: 1.0,
        }
    }
}

/// Everything a renderer remembers between calls.
#[derive(Debug, Default)]
pub struct RenderState {
    pub stroke: StrokeState,
    pub fill_style: FillStyle,
    pub font: Option<Font>,
    pub font_height: f64,
    /// Scratch for Bezier flattening, kept for the whole pass.
    bezier: BezierApprox,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A drawing backend.
pub trait Renderer {
    fn state(&self) -> &RenderState;

    fn state_mut(&mut self) -> &mut RenderState;

    /// Optional features this renderer supports. Callers read this once
    /// and pick their drawing strategy from it.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn is_capable_to(&self, cap: Capabilities) -> bool {
        self.capabilities().contains(cap)
    }

    /// Start a pass, writing any preamble. `region` is the diagram extent
    /// when the caller knows it.
    fn begin_render(&mut self, region: Option<Rect>) -> Result<(), RenderError>;

    /// Finish the pass and flush output. Reports a failed sink.
    fn end_render(&mut self) -> Result<(), RenderError>;

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    fn set_linewidth(&mut self, width: f64) {
        self.state_mut().stroke.width = width.max(0.0);
    }

    fn set_linecaps(&mut self, caps: LineCaps) {
        self.state_mut().stroke.caps = caps;
    }

    fn set_linejoin(&mut self, join: LineJoin) {
        self.state_mut().stroke.join = join;
    }

    fn set_linestyle(&mut self, style: LineStyle, dash_length: f64) {
        let stroke = &mut self.state_mut().stroke;
        stroke.style = style;
        stroke.dash_length = clamp_dash_length(dash_length);
    }

    /// Change the dash length, re-applying the current style with it.
    fn set_dashlength(&mut self, length: f64) {
        let style = self.state().stroke.style;
        self.set_linestyle(style, length);
    }

    fn set_fillstyle(&mut self, style: FillStyle) {
        let style = match style {
            FillStyle::Pattern if !self.is_capable_to(Capabilities::PATTERN) => {
                warn!("pattern fill not supported, using solid");
                FillStyle::Solid
            }
            other => other,
        };
        self.state_mut().fill_style = style;
    }

    fn set_font(&mut self, font: &Font, height: f64) {
        let state = self.state_mut();
        state.font = Some(font.clone());
        state.font_height = height;
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    fn draw_line(&mut self, start: Point, end: Point, color: &Color);

    /// Closed polygon. Either pass may be skipped by passing `None`.
    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>);

    /// Elliptic arc from `angle1` to `angle2` degrees, counter-clockwise.
    fn draw_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
        color: &Color,
    );

    /// Filled pie slice.
    fn fill_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        angle1: f64,
        angle2: f64,
        color: &Color,
    );

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    );

    /// One line of text with its baseline at `pos.y`.
    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color);

    /// Blit `image` scaled into the box at `pos`.
    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>);

    // ------------------------------------------------------------------
    // Compositions
    // ------------------------------------------------------------------

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1], color);
        }
    }

    fn draw_rect(&mut self, ul: Point, lr: Point, fill: Option<&Color>, stroke: Option<&Color>) {
        let corners = [ul, dvec2(lr.x, ul.y), lr, dvec2(ul.x, lr.y)];
        self.draw_polygon(&corners, fill, stroke);
    }

    /// Rectangle with quarter-circle corners. The radius is clamped to half
    /// of each side.
    fn draw_rounded_rect(
        &mut self,
        ul: Point,
        lr: Point,
        fill: Option<&Color>,
        stroke: Option<&Color>,
        radius: f64,
    ) {
        let radius = radius.min((lr.x - ul.x) / 2.0).min((lr.y - ul.y) / 2.0);
        if radius <= 0.0 {
            self.draw_rect(ul, lr, fill, stroke);
            return;
        }
        let d = 2.0 * radius;
        let (left, right) = (ul.x + radius, lr.x - radius);
        let (top, bottom) = (ul.y + radius, lr.y - radius);
        let corners = [
            (dvec2(left, top), 90.0, 180.0),
            (dvec2(right, top), 0.0, 90.0),
            (dvec2(left, bottom), 180.0, 270.0),
            (dvec2(right, bottom), 270.0, 360.0),
        ];

        if let Some(fill) = fill {
            self.draw_rect(dvec2(left, ul.y), dvec2(right, lr.y), Some(fill), None);
            self.draw_rect(dvec2(ul.x, top), dvec2(lr.x, bottom), Some(fill), None);
            for &(center, a1, a2) in &corners {
                self.fill_arc(center, d, d, a1, a2, fill);
            }
        }
        if let Some(stroke) = stroke {
            self.draw_line(dvec2(left, ul.y), dvec2(right, ul.y), stroke);
            self.draw_line(dvec2(left, lr.y), dvec2(right, lr.y), stroke);
            self.draw_line(dvec2(ul.x, top), dvec2(ul.x, bottom), stroke);
            self.draw_line(dvec2(lr.x, top), dvec2(lr.x, bottom), stroke);
            for &(center, a1, a2) in &corners {
                self.draw_arc(center, d, d, a1, a2, stroke);
            }
        }
    }

    /// Polyline whose inner corners are replaced by arcs of `radius`.
    fn draw_rounded_polyline(&mut self, points: &[Point], color: &Color, radius: f64) {
        if radius <= 0.0 || points.len() < 3 {
            self.draw_polyline(points, color);
            return;
        }
        let mut from = points[0];
        for w in points.windows(3) {
            match fillet(w[0], w[1], w[2], radius) {
                Some(f) => {
                    self.draw_line(from, f.enter, color);
                    let d = 2.0 * f.radius;
                    self.draw_arc(f.center, d, d, f.angle1, f.angle2, color);
                    from = f.exit;
                }
                None => {
                    self.draw_line(from, w[1], color);
                    from = w[1];
                }
            }
        }
        if let Some(&last) = points.last() {
            self.draw_line(from, last, color);
        }
    }

    /// Open Bezier path, flattened into a polyline.
    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        let mut approx = std::mem::take(&mut self.state_mut().bezier);
        self.draw_polyline(approx.approximate(points), color);
        self.state_mut().bezier = approx;
    }

    /// Closed Bezier path, flattened into a polygon. Several subpaths need
    /// [`Capabilities::HOLES`]; without it they are joined best-effort.
    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        if extra_subpaths(points) > 0 && !self.is_capable_to(Capabilities::HOLES) {
            warn!("renderer cannot draw holes, joining subpaths");
        }
        let mut approx = std::mem::take(&mut self.state_mut().bezier);
        self.draw_polygon(approx.approximate(points), fill, stroke);
        self.state_mut().bezier = approx;
    }

    /// Text that may span several lines, each one font height below the
    /// previous.
    fn draw_text(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        let height = self.state().font_height;
        for (i, line) in text.lines().enumerate() {
            let at = dvec2(pos.x, pos.y + height * i as f64);
            self.draw_string(line, at, alignment, color);
        }
    }

    // ------------------------------------------------------------------
    // Arrows
    // ------------------------------------------------------------------
    //
    // Each variant sets `line_width`, draws the path shortened so it stops
    // at the base of any triangle head, then the heads on top.

    fn draw_line_with_arrows(
        &mut self,
        start: Point,
        end: Point,
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        self.set_linewidth(line_width);
        let shaft = Shaft::new(&[start, end], start_arrow, end_arrow);
        if let [a, b] = shaft.points[..] {
            self.draw_line(a, b, color);
        }
        shaft.draw_heads(self, start_arrow, end_arrow, color);
    }

    fn draw_polyline_with_arrows(
        &mut self,
        points: &[Point],
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        self.set_linewidth(line_width);
        let shaft = Shaft::new(points, start_arrow, end_arrow);
        self.draw_polyline(&shaft.points, color);
        shaft.draw_heads(self, start_arrow, end_arrow, color);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_rounded_polyline_with_arrows(
        &mut self,
        points: &[Point],
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
        radius: f64,
    ) {
        self.set_linewidth(line_width);
        let shaft = Shaft::new(points, start_arrow, end_arrow);
        self.draw_rounded_polyline(&shaft.points, color, radius);
        shaft.draw_heads(self, start_arrow, end_arrow, color);
    }

    /// Circular arc from `start` through `mid` to `end`. Collinear points
    /// degrade to a straight line.
    #[allow(clippy::too_many_arguments)]
    fn draw_arc_with_arrows(
        &mut self,
        start: Point,
        end: Point,
        mid: Point,
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        let Some(arc) = CircleArc::through(start, mid, end) else {
            self.draw_line_with_arrows(start, end, line_width, color, start_arrow, end_arrow);
            return;
        };
        self.set_linewidth(line_width);
        let cut = |arrow: Option<&Arrow>| {
            arrow.map_or(0.0, |a| (shaft_trim(a) / arc.radius).to_degrees())
        };
        let (cut_start, cut_end) = (cut(start_arrow), cut(end_arrow));
        let (cut1, cut2) = if arc.clockwise {
            (cut_end, cut_start)
        } else {
            (cut_start, cut_end)
        };
        let (a1, a2) = (arc.angle1 + cut1, arc.angle2 - cut2);
        if a2 > a1 {
            let d = 2.0 * arc.radius;
            self.draw_arc(arc.center, d, d, a1, a2, color);
        }
        if let Some(arrow) = start_arrow {
            draw_arrow_head(self, arrow, start, start + arc.inward(true), color);
        }
        if let Some(arrow) = end_arrow {
            draw_arrow_head(self, arrow, end, end + arc.inward(false), color);
        }
    }

    fn draw_bezier_with_arrows(
        &mut self,
        points: &[BezPoint],
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        self.set_linewidth(line_width);
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return;
        };
        if points.len() < 2 {
            self.draw_bezier(points, color);
            return;
        }
        // heads aim along the nearest control point that differs from the tip
        let head = first.end();
        let toward_head = match points[1] {
            BezPoint::CurveTo(c1, _, _) if c1 != head => c1,
            other => other.end(),
        };
        let tail = last.end();
        let toward_tail = match last {
            BezPoint::CurveTo(_, c2, _) if c2 != tail => c2,
            _ => points[points.len() - 2].end(),
        };

        let mut path = points.to_vec();
        if let Some(arrow) = start_arrow {
            path[0] = first.with_end(shaft_end(arrow, head, toward_head));
        }
        if let Some(arrow) = end_arrow {
            let n = path.len();
            path[n - 1] = last.with_end(shaft_end(arrow, tail, toward_tail));
        }
        self.draw_bezier(&path, color);
        if let Some(arrow) = start_arrow {
            draw_arrow_head(self, arrow, head, toward_head, color);
        }
        if let Some(arrow) = end_arrow {
            draw_arrow_head(self, arrow, tail, toward_tail, color);
        }
    }
}

/// Segments shorter than this do not give an arrow a direction.
const MIN_SEGMENT: f64 = 1e-7;

/// How much of the path a head covers. Triangles sit on the shaft end; open
/// heads are drawn over the full path.
fn shaft_trim(arrow: &Arrow) -> f64 {
    match arrow.kind {
        ArrowKind::Lines => 0.0,
        ArrowKind::FilledTriangle | ArrowKind::HollowTriangle => arrow.length,
    }
}

/// Where the path should stop for a head at `tip` aimed from `from`.
fn shaft_end(arrow: &Arrow, tip: Point, from: Point) -> Point {
    let len = tip.distance(from);
    if len < MIN_SEGMENT {
        return tip;
    }
    tip + (from - tip) * (shaft_trim(arrow).min(len) / len)
}

/// A point list shortened for its arrow heads.
struct Shaft {
    points: Vec<Point>,
    /// Tip and aiming point of each head, when there is one to draw.
    start: Option<(Point, Point)>,
    end: Option<(Point, Point)>,
}

impl Shaft {
    /// Zero-length segments at either end are dropped first so each head
    /// follows the last real segment. A path without any length gets no
    /// heads.
    fn new(points: &[Point], start: Option<&Arrow>, end: Option<&Arrow>) -> Self {
        let live = |w: &[Point]| w[0].distance(w[1]) >= MIN_SEGMENT;
        let (Some(first), Some(last)) = (
            points.windows(2).position(live),
            points.windows(2).rposition(live),
        ) else {
            return Self {
                points: points.to_vec(),
                start: None,
                end: None,
            };
        };
        let mut points = points[first..=last + 1].to_vec();
        let n = points.len();
        let start_head = start.map(|_| (points[0], points[1]));
        let end_head = end.map(|_| (points[n - 1], points[n - 2]));
        if let (Some(arrow), Some((tip, from))) = (start, start_head) {
            points[0] = shaft_end(arrow, tip, from);
        }
        if let (Some(arrow), Some((tip, from))) = (end, end_head) {
            points[n - 1] = shaft_end(arrow, tip, from);
        }
        Self {
            points,
            start: start_head,
            end: end_head,
        }
    }

    fn draw_heads<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        start: Option<&Arrow>,
        end: Option<&Arrow>,
        color: &Color,
    ) {
        if let (Some(arrow), Some((tip, from))) = (start, self.start) {
            draw_arrow_head(renderer, arrow, tip, from, color);
        }
        if let (Some(arrow), Some((tip, from))) = (end, self.end) {
            draw_arrow_head(renderer, arrow, tip, from, color);
        }
    }
}

/// Draw one arrow head pointing at `tip`, coming from `from`.
fn draw_arrow_head<R: Renderer + ?Sized>(
    renderer: &mut R,
    arrow: &Arrow,
    tip: Point,
    from: Point,
    color: &Color,
) {
    let dir = (tip - from).normalize_or_zero();
    if dir == Point::ZERO {
        return;
    }
    let back = tip - dir * arrow.length;
    let side = dir.perp() * (arrow.width / 2.0);
    let (left, right) = (back + side, back - side);
    match arrow.kind {
        ArrowKind::Lines => {
            renderer.draw_line(left, tip, color);
            renderer.draw_line(right, tip, color);
        }
        ArrowKind::FilledTriangle => {
            renderer.draw_polygon(&[tip, left, right], Some(color), Some(color));
        }
        ArrowKind::HollowTriangle => {
            renderer.draw_polygon(&[tip, left, right], Some(&Color::WHITE), Some(color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Line(Point, Point),
        Polygon(Vec<Point>, Option<Color>, Option<Color>),
        Arc(Point, f64, f64, f64),
        FillArc(Point, f64, f64, f64),
        String(String, Point),
    }

    /// Implements only the required primitives so the provided
    /// compositions run.
    #[derive(Default)]
    struct Primitives {
        state: RenderState,
        caps: Option<Capabilities>,
        calls: Vec<Call>,
    }

    impl Renderer for Primitives {
        fn state(&self) -> &RenderState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut RenderState {
            &mut self.state
        }
        fn capabilities(&self) -> Capabilities {
            self.caps.unwrap_or(Capabilities::empty())
        }
        fn begin_render(&mut self, _region: Option<Rect>) -> Result<(), RenderError> {
            Ok(())
        }
        fn end_render(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn draw_line(&mut self, start: Point, end: Point, _color: &Color) {
            self.calls.push(Call::Line(start, end));
        }
        fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
            self.calls
                .push(Call::Polygon(points.to_vec(), fill.copied(), stroke.copied()));
        }
        fn draw_arc(&mut self, c: Point, w: f64, _h: f64, a1: f64, a2: f64, _color: &Color) {
            self.calls.push(Call::Arc(c, w, a1, a2));
        }
        fn fill_arc(&mut self, c: Point, w: f64, _h: f64, a1: f64, a2: f64, _color: &Color) {
            self.calls.push(Call::FillArc(c, w, a1, a2));
        }
        fn draw_ellipse(
            &mut self,
            _: Point,
            _: f64,
            _: f64,
            _: Option<&Color>,
            _: Option<&Color>,
        ) {
        }
        fn draw_string(&mut self, text: &str, pos: Point, _: Alignment, _: &Color) {
            self.calls.push(Call::String(text.to_string(), pos));
        }
        fn draw_image(&mut self, _: Point, _: f64, _: f64, _: &Arc<Image>) {}
    }

    #[test]
    fn state_is_sticky_and_dash_length_reapplies_style() {
        let mut r = Primitives::default();
        r.set_linestyle(LineStyle::DashDot, 2.0);
        r.set_dashlength(0.5);
        assert_eq!(r.state().stroke.style, LineStyle::DashDot);
        assert_eq!(r.state().stroke.dash_length, 0.5);
        r.set_dashlength(0.0);
        assert_eq!(r.state().stroke.dash_length, 0.001);
    }

    #[test]
    fn pattern_fill_degrades_without_capability() {
        let mut r = Primitives::default();
        r.set_fillstyle(FillStyle::Pattern);
        assert_eq!(r.state().fill_style, FillStyle::Solid);

        let mut r = Primitives {
            caps: Some(Capabilities::PATTERN),
            ..Default::default()
        };
        r.set_fillstyle(FillStyle::Pattern);
        assert_eq!(r.state().fill_style, FillStyle::Pattern);
    }

    #[test]
    fn polyline_becomes_segments() {
        let mut r = Primitives::default();
        let pts = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 1.0)];
        r.draw_polyline(&pts, &Color::BLACK);
        assert_eq!(
            r.calls,
            vec![
                Call::Line(pts[0], pts[1]),
                Call::Line(pts[1], pts[2]),
            ]
        );
    }

    #[test]
    fn rect_becomes_polygon_of_corners() {
        let mut r = Primitives::default();
        r.draw_rect(dvec2(0.0, 0.0), dvec2(2.0, 1.0), Some(&Color::RED), None);
        assert_eq!(
            r.calls,
            vec![Call::Polygon(
                vec![
                    dvec2(0.0, 0.0),
                    dvec2(2.0, 0.0),
                    dvec2(2.0, 1.0),
                    dvec2(0.0, 1.0)
                ],
                Some(Color::RED),
                None
            )]
        );
    }

    #[test]
    fn rounded_rect_stroke_uses_lines_and_quarter_arcs() {
        let mut r = Primitives::default();
        r.draw_rounded_rect(dvec2(0.0, 0.0), dvec2(10.0, 4.0), None, Some(&Color::BLACK), 5.0);
        // radius clamped to half the height
        let arcs: Vec<_> = r
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Arc(center, w, a1, a2) => Some((*center, *w, *a1, *a2)),
                _ => None,
            })
            .collect();
        assert_eq!(
            arcs,
            vec![
                (dvec2(2.0, 2.0), 4.0, 90.0, 180.0),
                (dvec2(8.0, 2.0), 4.0, 0.0, 90.0),
                (dvec2(2.0, 2.0), 4.0, 180.0, 270.0),
                (dvec2(8.0, 2.0), 4.0, 270.0, 360.0),
            ]
        );
        assert_eq!(r.calls.iter().filter(|c| matches!(c, Call::Line(..))).count(), 4);
    }

    #[test]
    fn rounded_rect_fill_uses_two_rects_and_pies() {
        let mut r = Primitives::default();
        r.draw_rounded_rect(dvec2(0.0, 0.0), dvec2(10.0, 10.0), Some(&Color::RED), None, 1.0);
        assert_eq!(r.calls.iter().filter(|c| matches!(c, Call::Polygon(..))).count(), 2);
        assert_eq!(r.calls.iter().filter(|c| matches!(c, Call::FillArc(..))).count(), 4);
        assert!(!r.calls.iter().any(|c| matches!(c, Call::Line(..) | Call::Arc(..))));
    }

    #[test]
    fn zero_radius_rounded_rect_is_plain_rect() {
        let mut r = Primitives::default();
        r.draw_rounded_rect(dvec2(0.0, 0.0), dvec2(1.0, 1.0), None, Some(&Color::BLACK), 0.0);
        assert_eq!(r.calls.len(), 1);
        assert!(matches!(r.calls[0], Call::Polygon(_, None, Some(_))));
    }

    #[test]
    fn rounded_polyline_inserts_arc_at_corner() {
        let mut r = Primitives::default();
        let pts = [dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)];
        r.draw_rounded_polyline(&pts, &Color::BLACK, 2.0);
        assert_eq!(r.calls.len(), 3);
        let Call::Line(a, b) = &r.calls[0] else {
            panic!("expected a line");
        };
        assert_eq!(*a, dvec2(0.0, 0.0));
        assert!(b.distance(dvec2(8.0, 0.0)) < 1e-9);
        assert!(matches!(
            r.calls[1],
            Call::Arc(c, w, ..) if c.distance(dvec2(8.0, 2.0)) < 1e-9 && (w - 4.0).abs() < 1e-9
        ));
        let Call::Line(a, b) = &r.calls[2] else {
            panic!("expected a line");
        };
        assert!(a.distance(dvec2(10.0, 2.0)) < 1e-9);
        assert_eq!(*b, dvec2(10.0, 10.0));
    }

    #[test]
    fn bezier_flattens_through_polyline() {
        let mut r = Primitives::default();
        r.draw_bezier(
            &[
                BezPoint::MoveTo(dvec2(0.0, 0.0)),
                BezPoint::LineTo(dvec2(1.0, 0.0)),
                BezPoint::LineTo(dvec2(1.0, 1.0)),
            ],
            &Color::BLACK,
        );
        assert_eq!(
            r.calls,
            vec![
                Call::Line(dvec2(0.0, 0.0), dvec2(1.0, 0.0)),
                Call::Line(dvec2(1.0, 0.0), dvec2(1.0, 1.0)),
            ]
        );
    }

    #[test]
    fn beziergon_with_bad_start_is_still_drawn() {
        let mut r = Primitives::default();
        r.draw_beziergon(
            &[
                BezPoint::LineTo(dvec2(0.0, 0.0)),
                BezPoint::LineTo(dvec2(1.0, 0.0)),
                BezPoint::MoveTo(dvec2(1.0, 1.0)),
            ],
            Some(&Color::RED),
            None,
        );
        assert_eq!(
            r.calls,
            vec![Call::Polygon(
                vec![dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 1.0)],
                Some(Color::RED),
                None
            )]
        );
    }

    #[test]
    fn text_advances_by_font_height() {
        let mut r = Primitives::default();
        r.set_font(&Font::default(), 0.5);
        r.draw_text("one\ntwo", dvec2(1.0, 1.0), Alignment::Left, &Color::BLACK);
        assert_eq!(
            r.calls,
            vec![
                Call::String("one".into(), dvec2(1.0, 1.0)),
                Call::String("two".into(), dvec2(1.0, 1.5)),
            ]
        );
    }

    #[test]
    fn arrows_are_drawn_at_both_ends() {
        let mut r = Primitives::default();
        let arrow = Arrow::new(ArrowKind::FilledTriangle, 1.0, 1.0);
        r.draw_polyline_with_arrows(
            &[dvec2(0.0, 0.0), dvec2(10.0, 0.0)],
            0.1,
            &Color::BLACK,
            Some(&arrow),
            Some(&Arrow::new(ArrowKind::Lines, 1.0, 1.0)),
        );
        assert_eq!(r.state().stroke.width, 0.1);
        // segment, start head, two end-head strokes
        assert_eq!(r.calls.len(), 4);
        // the shaft stops at the base of the triangle but runs into the open head
        assert_eq!(r.calls[0], Call::Line(dvec2(1.0, 0.0), dvec2(10.0, 0.0)));
        let Call::Polygon(head, Some(_), Some(_)) = &r.calls[1] else {
            panic!("expected a filled head");
        };
        assert_eq!(head[0], dvec2(0.0, 0.0));
        assert!(
            head[1].distance(dvec2(1.0, -0.5)) < 1e-9 || head[1].distance(dvec2(1.0, 0.5)) < 1e-9
        );
        assert_eq!(r.calls[2], Call::Line(dvec2(9.0, 0.5), dvec2(10.0, 0.0)));
    }

    fn triangle(length: f64) -> Arrow {
        Arrow::new(ArrowKind::FilledTriangle, length, 1.0)
    }

    #[test]
    fn line_with_arrow_stops_at_head_base() {
        let mut r = Primitives::default();
        let end = triangle(1.0);
        r.draw_line_with_arrows(
            dvec2(0.0, 0.0),
            dvec2(4.0, 0.0),
            0.2,
            &Color::BLACK,
            None,
            Some(&end),
        );
        assert_eq!(r.state().stroke.width, 0.2);
        assert_eq!(r.calls.len(), 2);
        assert_eq!(r.calls[0], Call::Line(dvec2(0.0, 0.0), dvec2(3.0, 0.0)));
        let Call::Polygon(head, ..) = &r.calls[1] else {
            panic!("expected a head");
        };
        assert_eq!(head[0], dvec2(4.0, 0.0));
    }

    #[test]
    fn zero_length_end_segments_do_not_aim_heads() {
        let mut r = Primitives::default();
        let open = Arrow::new(ArrowKind::Lines, 1.0, 1.0);
        let pts = [
            dvec2(0.0, 0.0),
            dvec2(0.0, 0.0),
            dvec2(5.0, 0.0),
            dvec2(5.0, 0.0),
        ];
        r.draw_polyline_with_arrows(&pts, 0.1, &Color::BLACK, Some(&open), Some(&open));
        assert_eq!(r.calls[0], Call::Line(dvec2(0.0, 0.0), dvec2(5.0, 0.0)));
        assert_eq!(r.calls.len(), 5);
        assert!(r.calls.contains(&Call::Line(dvec2(1.0, -0.5), dvec2(0.0, 0.0))));

        // nothing to aim along, so no heads at all
        let mut r = Primitives::default();
        r.draw_polyline_with_arrows(&pts[..2], 0.1, &Color::BLACK, Some(&open), Some(&open));
        assert_eq!(r.calls, vec![Call::Line(dvec2(0.0, 0.0), dvec2(0.0, 0.0))]);
    }

    #[test]
    fn rounded_polyline_with_arrow_keeps_its_corner() {
        let mut r = Primitives::default();
        let pts = [dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)];
        let end = triangle(1.0);
        r.draw_rounded_polyline_with_arrows(&pts, 0.1, &Color::BLACK, None, Some(&end), 2.0);
        assert_eq!(r.calls.len(), 4);
        assert!(matches!(r.calls[1], Call::Arc(..)));
        let Call::Line(_, shaft_end) = r.calls[2] else {
            panic!("expected the last segment");
        };
        assert!(shaft_end.distance(dvec2(10.0, 9.0)) < 1e-9);
        assert!(matches!(&r.calls[3], Call::Polygon(head, ..) if head[0] == dvec2(10.0, 10.0)));
    }

    fn single_arc(calls: &[Call]) -> (Point, f64, f64, f64) {
        let arcs: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Arc(center, w, a1, a2) => Some((*center, *w, *a1, *a2)),
                _ => None,
            })
            .collect();
        assert_eq!(arcs.len(), 1, "{calls:?}");
        arcs[0]
    }

    #[test]
    fn arc_with_arrow_is_shortened_by_head_angle() {
        // a head of length 2π/18 on a radius-2 arc covers ten degrees
        let head = triangle(std::f64::consts::PI / 9.0);
        let (top, left, right) = (dvec2(0.0, -2.0), dvec2(-2.0, 0.0), dvec2(2.0, 0.0));

        let mut ccw = Primitives::default();
        ccw.draw_arc_with_arrows(right, left, top, 0.1, &Color::BLACK, None, Some(&head));
        let (center, width, a1, a2) = single_arc(&ccw.calls);
        assert!(center.distance(Point::ZERO) < 1e-9);
        assert!((width - 4.0).abs() < 1e-9);
        assert!(a1.abs() < 1e-9 && (a2 - 170.0).abs() < 1e-9, "{a1} {a2}");
        let Some(Call::Polygon(tri, ..)) = ccw.calls.last() else {
            panic!("expected a head");
        };
        assert!(tri[0].distance(left) < 1e-9);
        // the head points down onto the tip, coming from the top of the arc
        assert!(tri[1].y < 0.0 && tri[2].y < 0.0);

        let mut cw = Primitives::default();
        cw.draw_arc_with_arrows(left, right, top, 0.1, &Color::BLACK, Some(&head), None);
        let (_, _, a1, a2) = single_arc(&cw.calls);
        assert!(a1.abs() < 1e-9 && (a2 - 170.0).abs() < 1e-9, "{a1} {a2}");
    }

    #[test]
    fn straight_arc_with_arrows_is_a_line() {
        let mut r = Primitives::default();
        let (a, b) = (dvec2(0.0, 0.0), dvec2(2.0, 0.0));
        r.draw_arc_with_arrows(a, b, dvec2(1.0, 0.0), 0.1, &Color::BLACK, None, None);
        assert_eq!(r.calls, vec![Call::Line(a, b)]);
    }

    #[test]
    fn bezier_heads_aim_along_control_points() {
        let mut r = Primitives::default();
        let path = [
            BezPoint::MoveTo(dvec2(0.0, 0.0)),
            BezPoint::LineTo(dvec2(4.0, 0.0)),
        ];
        r.draw_bezier_with_arrows(&path, 0.1, &Color::BLACK, None, Some(&triangle(1.0)));
        assert_eq!(r.calls[0], Call::Line(dvec2(0.0, 0.0), dvec2(3.0, 0.0)));
        assert!(matches!(&r.calls[1], Call::Polygon(head, ..) if head[0] == dvec2(4.0, 0.0)));

        // a first control point on the tip falls back to the segment end
        let mut r = Primitives::default();
        let path = [
            BezPoint::MoveTo(dvec2(0.0, 0.0)),
            BezPoint::CurveTo(dvec2(0.0, 0.0), dvec2(4.0, -2.0), dvec2(4.0, 0.0)),
        ];
        let open = Arrow::new(ArrowKind::Lines, 1.0, 1.0);
        r.draw_bezier_with_arrows(&path, 0.1, &Color::BLACK, Some(&open), None);
        assert!(r.calls.contains(&Call::Line(dvec2(1.0, -0.5), dvec2(0.0, 0.0))));
    }
}
