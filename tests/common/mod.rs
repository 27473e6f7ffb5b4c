//! Shared helpers for the integration tests.
//!
//! Run with `RUST_LOG=drawstream=debug cargo test --features tracing -- --nocapture`
//! to see what the renderers log.

#![allow(dead_code)]

use std::sync::Arc;

use drawstream::{
    Alignment, Arrow, ArrowKind, BezPoint, Color, FillStyle, Font, Image, LineCaps, LineJoin,
    LineStyle, Point, Rect, RenderError, RenderState, Renderer,
};
use glam::dvec2;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Logs every contract call as one line of text, numbers rounded to six
/// decimals so float noise compares equal.
#[derive(Default)]
pub struct Recorder {
    state: RenderState,
    pub calls: Vec<String>,
}

fn p(pt: Point) -> String {
    format!("({:.6},{:.6})", pt.x, pt.y)
}

fn pts(points: &[Point]) -> String {
    points.iter().map(|&pt| p(pt)).collect::<Vec<_>>().join(" ")
}

fn bez(points: &[BezPoint]) -> String {
    points
        .iter()
        .map(|bp| match *bp {
            BezPoint::MoveTo(a) => format!("M{}", p(a)),
            BezPoint::LineTo(a) => format!("L{}", p(a)),
            BezPoint::CurveTo(a, b, c) => format!("C{}{}{}", p(a), p(b), p(c)),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn c(color: &Color) -> String {
    color.to_hex()
}

fn oc(color: Option<&Color>) -> String {
    color.map_or_else(|| "none".to_string(), c)
}

impl Renderer for Recorder {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn begin_render(&mut self, _region: Option<Rect>) -> Result<(), RenderError> {
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn set_linewidth(&mut self, width: f64) {
        self.state.stroke.width = width;
        self.calls.push(format!("linewidth {width:.6}"));
    }

    fn set_linecaps(&mut self, caps: LineCaps) {
        self.state.stroke.caps = caps;
        self.calls.push(format!("linecaps {caps:?}"));
    }

    fn set_linejoin(&mut self, join: LineJoin) {
        self.state.stroke.join = join;
        self.calls.push(format!("linejoin {join:?}"));
    }

    fn set_linestyle(&mut self, style: LineStyle, dash_length: f64) {
        self.state.stroke.style = style;
        self.calls.push(format!("linestyle {style:?} {dash_length:.6}"));
    }

    fn set_dashlength(&mut self, length: f64) {
        self.calls.push(format!("dashlength {length:.6}"));
    }

    fn set_fillstyle(&mut self, style: FillStyle) {
        self.calls.push(format!("fillstyle {style:?}"));
    }

    fn set_font(&mut self, font: &Font, height: f64) {
        self.state.font = Some(font.clone());
        self.state.font_height = height;
        self.calls.push(format!("font {} {height:.6}", font.ps_name()));
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.calls.push(format!("line {} {} {}", p(start), p(end), c(color)));
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        self.calls.push(format!("polyline {} {}", pts(points), c(color)));
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        self.calls
            .push(format!("polygon {} {} {}", pts(points), oc(fill), oc(stroke)));
    }

    fn draw_rect(&mut self, ul: Point, lr: Point, fill: Option<&Color>, stroke: Option<&Color>) {
        self.calls
            .push(format!("rect {} {} {} {}", p(ul), p(lr), oc(fill), oc(stroke)));
    }

    fn draw_rounded_rect(
        &mut self,
        ul: Point,
        lr: Point,
        fill: Option<&Color>,
        stroke: Option<&Color>,
        radius: f64,
    ) {
        self.calls.push(format!(
            "rounded_rect {} {} {} {} {radius:.6}",
            p(ul),
            p(lr),
            oc(fill),
            oc(stroke)
        ));
    }

    fn draw_rounded_polyline(&mut self, points: &[Point], color: &Color, radius: f64) {
        self.calls
            .push(format!("rounded_polyline {} {} {radius:.6}", pts(points), c(color)));
    }

    fn draw_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        a1: f64,
        a2: f64,
        color: &Color,
    ) {
        self.calls.push(format!(
            "arc {} {width:.6} {height:.6} {a1:.6} {a2:.6} {}",
            p(center),
            c(color)
        ));
    }

    fn fill_arc(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        a1: f64,
        a2: f64,
        color: &Color,
    ) {
        self.calls.push(format!(
            "fill_arc {} {width:.6} {height:.6} {a1:.6} {a2:.6} {}",
            p(center),
            c(color)
        ));
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        width: f64,
        height: f64,
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        self.calls.push(format!(
            "ellipse {} {width:.6} {height:.6} {} {}",
            p(center),
            oc(fill),
            oc(stroke)
        ));
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        self.calls.push(format!("bezier {} {}", bez(points), c(color)));
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        self.calls
            .push(format!("beziergon {} {} {}", bez(points), oc(fill), oc(stroke)));
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        self.calls
            .push(format!("string {text:?} {} {alignment:?} {}", p(pos), c(color)));
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        self.calls.push(format!(
            "image {} {width:.6} {height:.6} {}x{}",
            p(pos),
            image.width(),
            image.height()
        ));
    }
}

/// A small diagram touching every primitive and every arrowed path.
pub fn scene(r: &mut dyn Renderer) {
    let blue = Color::rgb(0.0, 0.0, 1.0);
    r.set_linewidth(0.1);
    r.set_linecaps(LineCaps::Round);
    r.set_linejoin(LineJoin::Bevel);
    r.set_linestyle(LineStyle::DashDot, 0.5);
    r.draw_line(dvec2(0.0, 0.0), dvec2(4.0, 0.0), &Color::BLACK);
    r.set_linestyle(LineStyle::Solid, 0.5);
    r.draw_polyline(&[dvec2(0.0, 1.0), dvec2(1.0, 2.0), dvec2(2.0, 1.0)], &blue);
    r.draw_polygon(
        &[dvec2(3.0, 1.0), dvec2(4.0, 1.0), dvec2(3.5, 2.0)],
        Some(&Color::WHITE),
        Some(&Color::BLACK),
    );
    r.draw_rect(dvec2(0.5, 2.5), dvec2(1.5, 3.0), Some(&Color::RED), None);
    r.draw_rounded_rect(dvec2(2.0, 2.5), dvec2(3.5, 3.5), None, Some(&blue), 0.2);
    r.draw_arc(dvec2(1.0, 4.0), 1.0, 1.0, 0.0, 180.0, &Color::BLACK);
    r.fill_arc(dvec2(3.0, 4.0), 1.0, 0.5, 90.0, 270.0, &Color::RED);
    r.draw_ellipse(dvec2(2.0, 5.0), 2.0, 1.0, Some(&blue), Some(&Color::BLACK));
    r.draw_bezier(
        &[
            BezPoint::MoveTo(dvec2(0.0, 6.0)),
            BezPoint::CurveTo(dvec2(1.0, 5.0), dvec2(2.0, 7.0), dvec2(3.0, 6.0)),
        ],
        &Color::BLACK,
    );
    r.draw_beziergon(
        &[
            BezPoint::MoveTo(dvec2(0.0, 7.0)),
            BezPoint::LineTo(dvec2(1.0, 7.0)),
            BezPoint::CurveTo(dvec2(1.5, 7.5), dvec2(1.5, 8.0), dvec2(0.0, 8.0)),
        ],
        Some(&blue),
        None,
    );
    r.set_font(&Font::new("serif"), 0.8);
    r.draw_string("Hello (world)", dvec2(2.0, 9.0), Alignment::Center, &Color::BLACK);
    let pixels = Image::new(1, 1, vec![10, 20, 30])
        .unwrap()
        .with_filename("dot.png");
    r.draw_image(dvec2(3.0, 8.0), 1.0, 1.0, &Arc::new(pixels));
    let head = Arrow::new(ArrowKind::FilledTriangle, 0.3, 0.2);
    r.draw_polyline_with_arrows(
        &[dvec2(0.0, 10.0), dvec2(4.0, 10.0)],
        0.05,
        &Color::BLACK,
        None,
        Some(&head),
    );
    let open = Arrow::new(ArrowKind::Lines, 0.2, 0.2);
    r.draw_line_with_arrows(
        dvec2(0.0, 10.3),
        dvec2(1.5, 10.3),
        0.05,
        &blue,
        Some(&open),
        Some(&head),
    );
    r.draw_arc_with_arrows(
        dvec2(2.0, 10.8),
        dvec2(4.0, 10.8),
        dvec2(3.0, 10.4),
        0.05,
        &Color::BLACK,
        None,
        Some(&head),
    );
    r.draw_bezier_with_arrows(
        &[
            BezPoint::MoveTo(dvec2(0.0, 10.9)),
            BezPoint::CurveTo(dvec2(0.5, 10.5), dvec2(1.0, 10.9), dvec2(1.5, 10.6)),
        ],
        0.05,
        &Color::RED,
        Some(&head),
        None,
    );
    r.draw_rounded_polyline_with_arrows(
        &[dvec2(1.6, 10.4), dvec2(1.9, 10.4), dvec2(1.9, 10.9)],
        0.05,
        &Color::BLACK,
        Some(&open),
        Some(&open),
        0.1,
    );
}
