//! Rebuilds shape objects from drawing calls.
//!
//! Every primitive becomes one [`Shape`] carrying a copy of the stroke and
//! fill state in effect. At the end of a pass the shapes come back as a
//! single object, or a group in draw order.

use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use glam::dvec2;

use crate::backends::Pass;
use crate::errors::RenderError;
use crate::geometry::{arc_to_bezier, ArcChord};
use crate::log::debug;
use crate::renderer::{RenderState, Renderer};
use crate::text::{ProportionalMetrics, TextLayout};
use crate::types::{
    Alignment, Arrow, BezPoint, Capabilities, Color, Font, Image, LineStyle, Point, Rect,
};

/// Common behavior for reconstructed shapes
#[enum_dispatch]
pub trait ShapeKind {
    /// Object type name, as a diagram editor would register it.
    fn type_name(&self) -> &'static str;

    /// Line and fill properties. Text, images and groups have none.
    fn style(&self) -> Option<&ShapeStyle> {
        None
    }

    /// Axis-aligned extent of the geometry, ignoring line width.
    fn bounds(&self) -> Option<Rect>;
}

/// Line and fill properties copied from the renderer state.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeStyle {
    pub line_width: f64,
    pub line_color: Color,
    pub line_style: LineStyle,
    pub dash_length: f64,
    pub fill_color: Color,
    /// Whether the interior is painted with `fill_color`.
    pub show_background: bool,
    pub corner_radius: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            line_width: 0.1,
            line_color: Color::BLACK,
            line_style: LineStyle::Solid,
            dash_length: 1.0,
            fill_color: Color::WHITE,
            show_background: false,
            corner_radius: 0.0,
        }
    }
}

fn points_bounds(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    points
        .into_iter()
        .map(|p| Rect::from_corners(p, p))
        .reduce(|a, b| a.union(&b))
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolylineShape {
    pub points: Vec<Point>,
    pub start_arrow: Option<Arrow>,
    pub end_arrow: Option<Arrow>,
    pub style: ShapeStyle,
}

impl ShapeKind for PolylineShape {
    fn type_name(&self) -> &'static str {
        "Standard - PolyLine"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        points_bounds(self.points.iter().copied())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolygonShape {
    pub points: Vec<Point>,
    pub style: ShapeStyle,
}

impl ShapeKind for PolygonShape {
    fn type_name(&self) -> &'static str {
        "Standard - Polygon"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        points_bounds(self.points.iter().copied())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxShape {
    pub corner: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl ShapeKind for BoxShape {
    fn type_name(&self) -> &'static str {
        "Standard - Box"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        let far = self.corner + dvec2(self.width, self.height);
        Some(Rect::from_corners(self.corner, far))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EllipseShape {
    /// Upper-left corner of the bounding box.
    pub corner: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl ShapeKind for EllipseShape {
    fn type_name(&self) -> &'static str {
        "Standard - Ellipse"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        let far = self.corner + dvec2(self.width, self.height);
        Some(Rect::from_corners(self.corner, far))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArcShape {
    pub chord: ArcChord,
    pub start_arrow: Option<Arrow>,
    pub end_arrow: Option<Arrow>,
    pub style: ShapeStyle,
}

impl ArcShape {
    /// The point of the arc halfway along it.
    pub fn midpoint(&self) -> Point {
        let ArcChord {
            start,
            end,
            curve_distance,
        } = self.chord;
        let dir = (end - start).normalize_or_zero();
        // counter-clockwise arcs bulge to this side of the chord
        let normal = dvec2(-dir.y, dir.x);
        (start + end) / 2.0 + normal * curve_distance
    }
}

impl ShapeKind for ArcShape {
    fn type_name(&self) -> &'static str {
        "Standard - Arc"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    /// Hull of the end points and the arc midpoint, which is exact for arcs
    /// up to a quarter turn.
    fn bounds(&self) -> Option<Rect> {
        points_bounds([self.chord.start, self.chord.end, self.midpoint()])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BezierlineShape {
    pub points: Vec<BezPoint>,
    pub start_arrow: Option<Arrow>,
    pub end_arrow: Option<Arrow>,
    pub style: ShapeStyle,
}

fn control_hull(points: &[BezPoint]) -> Option<Rect> {
    points_bounds(points.iter().flat_map(|bp| match *bp {
        BezPoint::MoveTo(p) | BezPoint::LineTo(p) => vec![p],
        BezPoint::CurveTo(c1, c2, p) => vec![c1, c2, p],
    }))
}

impl ShapeKind for BezierlineShape {
    fn type_name(&self) -> &'static str {
        "Standard - BezierLine"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        control_hull(&self.points)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BeziergonShape {
    pub points: Vec<BezPoint>,
    pub style: ShapeStyle,
}

impl ShapeKind for BeziergonShape {
    fn type_name(&self) -> &'static str {
        "Standard - Beziergon"
    }

    fn style(&self) -> Option<&ShapeStyle> {
        Some(&self.style)
    }

    fn bounds(&self) -> Option<Rect> {
        control_hull(&self.points)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    pub pos: Point,
    pub text: String,
    pub font: Font,
    pub height: f64,
    pub color: Color,
    pub alignment: Alignment,
}

impl ShapeKind for TextShape {
    fn type_name(&self) -> &'static str {
        "Standard - Text"
    }

    /// Line boxes measured with [`ProportionalMetrics`], one font height
    /// apart, shifted by the alignment.
    fn bounds(&self) -> Option<Rect> {
        let metrics = ProportionalMetrics::default();
        let (font, height) = (&self.font, self.height);
        self.text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let width = metrics.string_width(line, font, height);
                let left = self.pos.x + self.alignment.offset(width);
                let baseline = self.pos.y + height * i as f64;
                Rect::new(
                    left,
                    baseline - metrics.ascent(font, height),
                    left + width,
                    baseline + metrics.descent(font, height),
                )
            })
            .reduce(|a, b| a.union(&b))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageShape {
    pub corner: Point,
    pub width: f64,
    pub height: f64,
    pub image: Arc<Image>,
}

impl ImageShape {
    pub fn filename(&self) -> Option<&str> {
        self.image.filename()
    }
}

impl ShapeKind for ImageShape {
    fn type_name(&self) -> &'static str {
        "Standard - Image"
    }

    fn bounds(&self) -> Option<Rect> {
        let far = self.corner + dvec2(self.width, self.height);
        Some(Rect::from_corners(self.corner, far))
    }
}

/// Shapes in draw order; later children paint over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupShape {
    pub children: Vec<Shape>,
}

impl ShapeKind for GroupShape {
    fn type_name(&self) -> &'static str {
        "Group"
    }

    fn bounds(&self) -> Option<Rect> {
        self.children
            .iter()
            .filter_map(|child| child.bounds())
            .reduce(|a, b| a.union(&b))
    }
}

/// A shape enum wrapping all reconstructed shape types
#[enum_dispatch(ShapeKind)]
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polyline(PolylineShape),
    Polygon(PolygonShape),
    Box(BoxShape),
    Ellipse(EllipseShape),
    Arc(ArcShape),
    Bezierline(BezierlineShape),
    Beziergon(BeziergonShape),
    Text(TextShape),
    Image(ImageShape),
    Group(GroupShape),
}

/// Collects shapes instead of producing output.
#[derive(Debug, Default)]
pub struct ImportRenderer {
    state: RenderState,
    pass: Pass,
    objects: Vec<Shape>,
}

impl ImportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes built so far, in draw order.
    pub fn objects(&self) -> &[Shape] {
        &self.objects
    }

    /// Nothing if no shape was drawn, the shape itself if there was exactly
    /// one, otherwise a group of all of them.
    pub fn into_object(mut self) -> Option<Shape> {
        match self.objects.len() {
            0 => None,
            1 => self.objects.pop(),
            n => {
                debug!(count = n, "grouping reconstructed shapes");
                Some(Shape::Group(GroupShape {
                    children: self.objects,
                }))
            }
        }
    }

    fn push(&mut self, shape: impl Into<Shape>) {
        self.objects.push(shape.into());
    }

    /// Style from the current state. A fill without a stroke gets a
    /// zero-width outline in the fill color.
    fn style(&self, fill: Option<&Color>, stroke: Option<&Color>, radius: f64) -> ShapeStyle {
        let current = &self.state.stroke;
        let mut style = ShapeStyle {
            line_width: current.width,
            ..ShapeStyle::default()
        };
        if let Some(fill) = fill {
            style.fill_color = *fill;
            style.show_background = true;
        }
        match (stroke, fill) {
            (Some(stroke), _) => {
                style.line_style = current.style;
                style.dash_length = current.dash_length;
                style.line_color = *stroke;
            }
            (None, Some(fill)) => {
                style.line_width = 0.0;
                style.line_color = *fill;
            }
            (None, None) => {}
        }
        if radius > 0.0 {
            style.corner_radius = radius;
        }
        style
    }

    fn polyline(
        &mut self,
        points: &[Point],
        color: &Color,
        radius: f64,
        arrows: [Option<&Arrow>; 2],
    ) {
        let style = self.style(None, Some(color), radius);
        self.push(PolylineShape {
            points: points.to_vec(),
            start_arrow: arrows[0].copied(),
            end_arrow: arrows[1].copied(),
            style,
        });
    }
}

impl Renderer for ImportRenderer {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn begin_render(&mut self, _region: Option<Rect>) -> Result<(), RenderError> {
        self.pass.begin()
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        self.pass.end()
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.polyline(&[start, end], color, 0.0, [None, None]);
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        self.polyline(points, color, 0.0, [None, None]);
    }

    fn draw_rounded_polyline(&mut self, points: &[Point], color: &Color, radius: f64) {
        self.polyline(points, color, radius, [None, None]);
    }

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
        self.polyline(&[start, end], color, 0.0, [start_arrow, end_arrow]);
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
        self.polyline(points, color, 0.0, [start_arrow, end_arrow]);
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
        self.polyline(points, color, radius, [start_arrow, end_arrow]);
    }

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
        self.set_linewidth(line_width);
        let style = self.style(None, Some(color), 0.0);
        self.push(ArcShape {
            chord: ArcChord::from_points(start, end, mid),
            start_arrow: start_arrow.copied(),
            end_arrow: end_arrow.copied(),
            style,
        });
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
        let style = self.style(None, Some(color), 0.0);
        self.push(BezierlineShape {
            points: points.to_vec(),
            start_arrow: start_arrow.copied(),
            end_arrow: end_arrow.copied(),
            style,
        });
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        let style = self.style(fill, stroke, 0.0);
        self.push(PolygonShape {
            points: points.to_vec(),
            style,
        });
    }

    fn draw_rect(&mut self, ul: Point, lr: Point, fill: Option<&Color>, stroke: Option<&Color>) {
        self.draw_rounded_rect(ul, lr, fill, stroke, 0.0);
    }

    fn draw_rounded_rect(
        &mut self,
        ul: Point,
        lr: Point,
        fill: Option<&Color>,
        stroke: Option<&Color>,
        radius: f64,
    ) {
        let style = self.style(fill, stroke, radius);
        self.push(BoxShape {
            corner: ul,
            width: lr.x - ul.x,
            height: lr.y - ul.y,
            style,
        });
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
        let style = self.style(None, Some(color), 0.0);
        self.push(ArcShape {
            chord: ArcChord::from_center(center, width, height, angle1, angle2),
            start_arrow: None,
            end_arrow: None,
            style,
        });
    }

    /// Arc objects cannot be filled, so a filled arc becomes a beziergon.
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
        self.draw_beziergon(&path, Some(color), None);
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        let style = self.style(fill, stroke, 0.0);
        self.push(EllipseShape {
            corner: center - dvec2(width, height) / 2.0,
            width,
            height,
            style,
        });
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        let style = self.style(None, Some(color), 0.0);
        self.push(BezierlineShape {
            points: points.to_vec(),
            start_arrow: None,
            end_arrow: None,
            style,
        });
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        let style = self.style(fill, stroke, 0.0);
        self.push(BeziergonShape {
            points: points.to_vec(),
            style,
        });
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        if text.is_empty() {
            return;
        }
        let font = self.state.font.clone().unwrap_or_default();
        self.push(TextShape {
            pos,
            text: text.to_string(),
            font,
            height: self.state.font_height,
            color: *color,
            alignment,
        });
    }

    /// Text objects hold several lines themselves.
    fn draw_text(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        self.draw_string(text, pos, alignment, color);
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        if image.is_empty() {
            return;
        }
        self.push(ImageShape {
            corner: pos,
            width,
            height,
            image: Arc::clone(image),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArrowKind;

    fn import(draw: impl FnOnce(&mut ImportRenderer)) -> Option<Shape> {
        let mut r = ImportRenderer::new();
        r.begin_render(None).unwrap();
        draw(&mut r);
        r.end_render().unwrap();
        r.into_object()
    }

    #[test]
    fn nothing_drawn_is_no_object() {
        assert_eq!(import(|_| {}), None);
    }

    #[test]
    fn single_shape_is_returned_alone() {
        let shape = import(|r| r.draw_line(dvec2(0.0, 0.0), dvec2(1.0, 1.0), &Color::RED));
        let Some(Shape::Polyline(line)) = shape else {
            panic!("expected a polyline, got {shape:?}");
        };
        assert_eq!(line.points, vec![dvec2(0.0, 0.0), dvec2(1.0, 1.0)]);
        assert_eq!(line.style.line_color, Color::RED);
        assert!(!line.style.show_background);
    }

    #[test]
    fn several_shapes_group_in_draw_order() {
        let shape = import(|r| {
            r.set_linewidth(0.2);
            r.draw_rect(dvec2(0.0, 0.0), dvec2(4.0, 2.0), Some(&Color::WHITE), Some(&Color::BLACK));
            r.set_font(&Font::default(), 0.8);
            r.draw_string("label", dvec2(2.0, 1.0), Alignment::Center, &Color::BLACK);
        })
        .unwrap();
        assert_eq!(shape.type_name(), "Group");
        let Shape::Group(group) = &shape else {
            panic!("expected a group");
        };
        let names: Vec<_> = group.children.iter().map(|c| c.type_name()).collect();
        assert_eq!(names, ["Standard - Box", "Standard - Text"]);

        let style = group.children[0].style().unwrap();
        assert_eq!(style.line_width, 0.2);
        assert_eq!(style.fill_color, Color::WHITE);
        assert!(style.show_background);
        assert_eq!(shape.bounds(), Some(Rect::new(0.0, 0.0, 4.0, 2.0)));

        let Shape::Text(text) = &group.children[1] else {
            panic!("expected text");
        };
        assert_eq!(text.text, "label");
        assert_eq!(text.height, 0.8);
        assert_eq!(text.alignment, Alignment::Center);
    }

    #[test]
    fn fill_only_gets_invisible_outline_in_fill_color() {
        let shape = import(|r| {
            r.set_linewidth(0.3);
            let pts = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 1.0)];
            r.draw_polygon(&pts, Some(&Color::RED), None);
        })
        .unwrap();
        let style = shape.style().unwrap();
        assert_eq!(style.line_width, 0.0);
        assert_eq!(style.line_color, Color::RED);
        assert!(style.show_background);
    }

    #[test]
    fn stroke_copies_line_style() {
        let shape = import(|r| {
            r.set_linestyle(LineStyle::Dashed, 0.5);
            r.draw_ellipse(dvec2(1.0, 1.0), 2.0, 1.0, None, Some(&Color::BLACK));
        })
        .unwrap();
        let style = shape.style().unwrap();
        assert_eq!(style.line_style, LineStyle::Dashed);
        assert_eq!(style.dash_length, 0.5);
        assert_eq!(shape.bounds(), Some(Rect::new(0.0, 0.5, 2.0, 1.5)));
    }

    #[test]
    fn filled_arc_becomes_beziergon() {
        let shape =
            import(|r| r.fill_arc(dvec2(0.0, 0.0), 2.0, 2.0, 0.0, 90.0, &Color::RED)).unwrap();
        let Shape::Beziergon(gon) = shape else {
            panic!("expected a beziergon");
        };
        assert!(gon.points.contains(&BezPoint::LineTo(dvec2(0.0, 0.0))));
        assert!(gon.style.show_background);
        assert_eq!(gon.style.line_width, 0.0);
    }

    #[test]
    fn stroked_arc_keeps_chord_and_bulge() {
        let shape =
            import(|r| r.draw_arc(dvec2(0.0, 0.0), 2.0, 2.0, 0.0, 90.0, &Color::BLACK)).unwrap();
        let Shape::Arc(arc) = shape else {
            panic!("expected an arc");
        };
        assert!(arc.chord.curve_distance > 0.0);
        let mid = arc.midpoint();
        let expected = dvec2(0.5_f64.sqrt(), -(0.5_f64.sqrt()));
        assert!((mid - expected).length() < 1e-9, "{mid:?}");
    }

    #[test]
    fn arrows_and_width_are_kept() {
        let head = Arrow::new(ArrowKind::FilledTriangle, 0.5, 0.3);
        let shape = import(|r| {
            let pts = [dvec2(0.0, 0.0), dvec2(2.0, 0.0)];
            r.draw_polyline_with_arrows(&pts, 0.15, &Color::BLACK, None, Some(&head));
        })
        .unwrap();
        let Shape::Polyline(line) = shape else {
            panic!("expected a polyline");
        };
        assert_eq!(line.start_arrow, None);
        assert_eq!(line.end_arrow, Some(head));
        assert_eq!(line.style.line_width, 0.15);
    }

    #[test]
    fn empty_text_and_images_make_no_shape() {
        let shape = import(|r| {
            r.draw_string("", dvec2(1.0, 1.0), Alignment::Left, &Color::BLACK);
            r.draw_text("", dvec2(1.0, 1.0), Alignment::Left, &Color::BLACK);
            let empty = Arc::new(Image::new(0, 0, Vec::new()).unwrap());
            r.draw_image(dvec2(0.0, 0.0), 1.0, 1.0, &empty);
        });
        assert_eq!(shape, None);
    }

    #[test]
    fn text_bounds_come_from_line_metrics() {
        let shape = import(|r| {
            r.set_font(&Font::default(), 1.0);
            r.draw_text("ab\nab", dvec2(10.0, 5.0), Alignment::Right, &Color::BLACK);
        })
        .unwrap();
        let bounds = shape.bounds().unwrap();
        let width = ProportionalMetrics::default().string_width("ab", &Font::default(), 1.0);
        assert!((bounds.left - (10.0 - width)).abs() < 1e-9);
        assert!((bounds.right - 10.0).abs() < 1e-9);
        assert!((bounds.top - 4.2).abs() < 1e-9);
        assert!((bounds.bottom - 6.2).abs() < 1e-9);
    }

    #[test]
    fn every_arrowed_path_keeps_its_heads() {
        let head = Arrow::new(ArrowKind::Lines, 0.4, 0.4);
        let group = import(|r| {
            let (a, b) = (dvec2(0.0, 0.0), dvec2(2.0, 0.0));
            r.draw_line_with_arrows(a, b, 0.1, &Color::BLACK, Some(&head), None);
            r.draw_rounded_polyline_with_arrows(
                &[a, b, dvec2(2.0, 2.0)],
                0.1,
                &Color::BLACK,
                None,
                Some(&head),
                0.5,
            );
            r.draw_arc_with_arrows(a, b, dvec2(1.0, -1.0), 0.2, &Color::BLACK, None, Some(&head));
            let path = [BezPoint::MoveTo(a), BezPoint::CurveTo(a, b, dvec2(2.0, 1.0))];
            r.draw_bezier_with_arrows(&path, 0.1, &Color::BLACK, Some(&head), Some(&head));
        })
        .unwrap();
        let Shape::Group(GroupShape { children }) = group else {
            panic!("expected a group");
        };
        assert_eq!(children.len(), 4);

        let Shape::Polyline(line) = &children[0] else {
            panic!("expected a polyline");
        };
        assert_eq!((line.start_arrow, line.end_arrow), (Some(head), None));

        let Shape::Polyline(rounded) = &children[1] else {
            panic!("expected a polyline");
        };
        assert_eq!(rounded.end_arrow, Some(head));
        assert_eq!(rounded.style.corner_radius, 0.5);

        let Shape::Arc(arc) = &children[2] else {
            panic!("expected an arc");
        };
        assert_eq!(arc.end_arrow, Some(head));
        assert_eq!(arc.style.line_width, 0.2);
        assert!((arc.midpoint() - dvec2(1.0, -1.0)).length() < 1e-9);

        let Shape::Bezierline(curve) = &children[3] else {
            panic!("expected a bezierline");
        };
        assert_eq!((curve.start_arrow, curve.end_arrow), (Some(head), Some(head)));
    }

    #[test]
    fn rounded_rect_is_one_box_with_radius() {
        let shape = import(|r| {
            r.draw_rounded_rect(dvec2(0.0, 0.0), dvec2(2.0, 1.0), None, Some(&Color::BLACK), 0.25)
        })
        .unwrap();
        assert_eq!(shape.type_name(), "Standard - Box");
        assert_eq!(shape.style().unwrap().corner_radius, 0.25);
    }
}
