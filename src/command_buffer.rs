//! Record/replay display list.
//!
//! A [`CommandBuffer`] is itself a [`Renderer`]: drawing into it appends one
//! opcode slot followed by that opcode's operand slots. [`CommandBuffer::replay`]
//! walks the slots again and issues the same calls against any other
//! renderer, scaling and translating every coordinate on the way.
//!
//! Variable-length payloads (point lists, text, images) are copied into
//! owned boxes when recorded and released with the buffer.
//!
//! # Operand layout
//!
//! | opcode               | operands                                       |
//! |----------------------|------------------------------------------------|
//! | `SetLineWidth`       | width                                          |
//! | `SetLineCaps`        | int                                            |
//! | `SetLineJoin`        | int                                            |
//! | `SetLineStyle`       | int, dash length                               |
//! | `SetDashLength`      | dash length                                    |
//! | `SetFillStyle`       | int                                            |
//! | `SetFont`            | font, height                                   |
//! | `DrawLine`           | point, point, color                            |
//! | `DrawPolyline`       | points, color                                  |
//! | `DrawPolygon`        | points, fill?, stroke?                         |
//! | `DrawRect`           | point, point, fill?, stroke?                   |
//! | `DrawRoundedRect`    | point, point, fill?, stroke?, radius           |
//! | `DrawRoundedPolyline`| points, color, radius                          |
//! | `DrawArc`/`FillArc`  | point, width, height, angle, angle, color      |
//! | `DrawEllipse`        | point, width, height, fill?, stroke?           |
//! | `DrawBezier`         | bezpoints, color                               |
//! | `DrawBeziergon`      | bezpoints, fill?, stroke?                      |
//! | `DrawString`         | text, point, int, color                        |
//! | `DrawImage`          | point, width, height, image                    |
//! | `DrawLineWithArrows` | point, point, width, color, arrow?, arrow?     |
//! | `DrawPolylineWithArrows` | points, width, color, arrow?, arrow?       |
//! | `DrawRoundedPolylineWithArrows` | points, width, color, arrow?, arrow?, radius |
//! | `DrawArcWithArrows`  | point, point, point, width, color, arrow?, arrow? |
//! | `DrawBezierWithArrows` | bezpoints, width, color, arrow?, arrow?      |
//!
//! Arrow heads are lengths too: replay scales their length and width.

use std::cell::RefCell;
use std::sync::Arc;

use glam::{DAffine2, DVec2};

use crate::errors::{RenderError, ReplayError};
use crate::log::{debug, warn};
use crate::renderer::{RenderState, Renderer};
use crate::stroke::clamp_dash_length;
use crate::types::{
    Alignment, Arrow, BezPoint, Capabilities, Color, FillStyle, Font, Image, LineCaps, LineJoin,
    LineStyle, Point, Rect,
};

/// Slots allocated up front.
pub const INITIAL_CAPACITY: usize = 30;

/// Slots added each time the buffer fills up.
pub const GROWTH_INCREMENT: usize = 30;

/// What a record does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    SetLineWidth,
    SetLineCaps,
    SetLineJoin,
    SetLineStyle,
    SetDashLength,
    SetFillStyle,
    SetFont,
    DrawLine,
    DrawPolyline,
    DrawPolygon,
    DrawRect,
    DrawRoundedRect,
    DrawRoundedPolyline,
    DrawArc,
    FillArc,
    DrawEllipse,
    DrawBezier,
    DrawBeziergon,
    DrawString,
    DrawImage,
    DrawLineWithArrows,
    DrawPolylineWithArrows,
    DrawRoundedPolylineWithArrows,
    DrawArcWithArrows,
    DrawBezierWithArrows,
}

/// One cell of the buffer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Slot {
    Op(Opcode),
    Real(f64),
    Int(i64),
    Point(Point),
    Color(Color),
    OptColor(Option<Color>),
    OptArrow(Option<Arrow>),
    Points(Box<[Point]>),
    BezPoints(Box<[BezPoint]>),
    Text(Box<str>),
    Font(Font),
    Image(Arc<Image>),
}

/// Enums travel through the buffer as integer slots.
trait IntCode: Sized {
    fn to_code(self) -> i64;
    fn from_code(code: i64) -> Option<Self>;
}

macro_rules! int_codes {
    ($($ty:ident { $($variant:ident = $code:literal),* $(,)? })*) => {
        $(
            impl IntCode for $ty {
                fn to_code(self) -> i64 {
                    match self {
                        $($ty::$variant => $code,)*
                    }
                }

                fn from_code(code: i64) -> Option<Self> {
                    match code {
                        $($code => Some($ty::$variant),)*
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_codes! {
    LineCaps { Butt = 0, Round = 1, Projecting = 2 }
    LineJoin { Miter = 0, Round = 1, Bevel = 2 }
    LineStyle { Solid = 0, Dashed = 1, DashDot = 2, DashDotDot = 3, Dotted = 4 }
    FillStyle { Solid = 0, Pattern = 1 }
    Alignment { Left = 0, Center = 1, Right = 2 }
}

#[derive(Debug, Default)]
struct Scratch {
    points: Vec<Point>,
    bez: Vec<BezPoint>,
}

/// A recorded stream of drawing operations.
///
/// Not `Sync`: replay reuses internal scratch arrays, so one buffer must
/// not be replayed from two threads at once.
#[derive(Debug)]
pub struct CommandBuffer {
    slots: Vec<Slot>,
    state: RenderState,
    scratch: RefCell<Scratch>,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(INITIAL_CAPACITY),
            state: RenderState::new(),
            scratch: RefCell::new(Scratch::default()),
        }
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.ops().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Recorded opcodes in order.
    pub fn ops(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.slots.iter().filter_map(|s| match s {
            Slot::Op(op) => Some(*op),
            _ => None,
        })
    }

    /// Drop every record and release its payloads.
    pub fn clear(&mut self) {
        self.slots = Vec::with_capacity(INITIAL_CAPACITY);
        self.state = RenderState::new();
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn push(&mut self, slot: Slot) {
        if self.slots.len() == self.slots.capacity() {
            self.slots.reserve_exact(GROWTH_INCREMENT);
            debug!(capacity = self.slots.capacity(), "command buffer grown");
        }
        self.slots.push(slot);
    }

    fn record(&mut self, op: Opcode, operands: impl IntoIterator<Item = Slot>) {
        self.push(Slot::Op(op));
        for slot in operands {
            self.push(slot);
        }
    }

    /// Issue every recorded operation against `target`, mapping points to
    /// `p * scale + translate` and lengths to `l * scale`.
    ///
    /// Angles, colors, enums and text pass through unchanged. Malformed
    /// records are reported and skipped; replay always reaches the end.
    pub fn replay<R: Renderer + ?Sized>(
        &self,
        target: &mut R,
        translate: Point,
        scale: f64,
    ) -> Vec<ReplayError> {
        let xf = Transform::new(translate, scale);
        // a nested replay of the same buffer gets its own scratch
        let mut local = Scratch::default();
        let mut shared = self.scratch.try_borrow_mut().ok();
        let scratch = match shared.as_deref_mut() {
            Some(s) => s,
            None => &mut local,
        };
        let mut errors = Vec::new();
        let mut index = 0;

        while index < self.slots.len() {
            let Slot::Op(op) = self.slots[index] else {
                errors.push(ReplayError::StrayOperand { index });
                index = self.next_op(index + 1);
                continue;
            };
            let mut rec = Record {
                slots: &self.slots,
                op,
                index,
                pos: index + 1,
                xf,
            };
            match replay_one(&mut rec, target, scratch) {
                Ok(()) => index = rec.pos,
                Err(err) => {
                    warn!(%err, "skipping command buffer record");
                    errors.push(err);
                    index = self.next_op(index + 1);
                }
            }
        }
        errors
    }

    fn next_op(&self, from: usize) -> usize {
        self.slots[from.min(self.slots.len())..]
            .iter()
            .position(|s| matches!(s, Slot::Op(_)))
            .map_or(self.slots.len(), |i| from + i)
    }
}

#[derive(Clone, Copy)]
struct Transform {
    affine: DAffine2,
    scale: f64,
}

impl Transform {
    fn new(translate: Point, scale: f64) -> Self {
        Self {
            affine: DAffine2::from_scale_angle_translation(DVec2::splat(scale), 0.0, translate),
            scale,
        }
    }

    fn point(&self, p: Point) -> Point {
        self.affine.transform_point2(p)
    }

    fn length(&self, l: f64) -> f64 {
        l * self.scale
    }
}

/// Operand reader for one record.
struct Record<'a> {
    slots: &'a [Slot],
    op: Opcode,
    index: usize,
    pos: usize,
    xf: Transform,
}

impl<'a> Record<'a> {
    fn next(&mut self) -> Result<&'a Slot, ReplayError> {
        match self.slots.get(self.pos) {
            None | Some(Slot::Op(_)) => Err(ReplayError::Truncated {
                op: self.op,
                index: self.index,
            }),
            Some(slot) => {
                self.pos += 1;
                Ok(slot)
            }
        }
    }

    fn wrong(&self, expected: &'static str) -> ReplayError {
        ReplayError::OperandKind {
            op: self.op,
            index: self.index,
            expected,
        }
    }

    fn real(&mut self) -> Result<f64, ReplayError> {
        match self.next()? {
            Slot::Real(v) => Ok(*v),
            _ => Err(self.wrong("real")),
        }
    }

    fn length(&mut self) -> Result<f64, ReplayError> {
        self.real().map(|l| self.xf.length(l))
    }

    fn code<T: IntCode>(&mut self) -> Result<T, ReplayError> {
        match self.next()? {
            Slot::Int(v) => T::from_code(*v).ok_or_else(|| self.wrong("enum code")),
            _ => Err(self.wrong("int")),
        }
    }

    fn point(&mut self) -> Result<Point, ReplayError> {
        match self.next()? {
            Slot::Point(p) => Ok(self.xf.point(*p)),
            _ => Err(self.wrong("point")),
        }
    }

    fn color(&mut self) -> Result<Color, ReplayError> {
        match self.next()? {
            Slot::Color(c) => Ok(*c),
            _ => Err(self.wrong("color")),
        }
    }

    fn opt_color(&mut self) -> Result<Option<Color>, ReplayError> {
        match self.next()? {
            Slot::OptColor(c) => Ok(*c),
            _ => Err(self.wrong("optional color")),
        }
    }

    fn opt_arrow(&mut self) -> Result<Option<Arrow>, ReplayError> {
        match self.next()? {
            Slot::OptArrow(a) => {
                let xf = self.xf;
                Ok(a.map(|a| Arrow {
                    length: xf.length(a.length),
                    width: xf.length(a.width),
                    ..a
                }))
            }
            _ => Err(self.wrong("optional arrow")),
        }
    }

    fn points(&mut self, out: &mut Vec<Point>) -> Result<(), ReplayError> {
        match self.next()? {
            Slot::Points(pts) => {
                out.clear();
                out.extend(pts.iter().map(|&p| self.xf.point(p)));
                Ok(())
            }
            _ => Err(self.wrong("points")),
        }
    }

    fn bez_points(&mut self, out: &mut Vec<BezPoint>) -> Result<(), ReplayError> {
        match self.next()? {
            Slot::BezPoints(pts) => {
                out.clear();
                let xf = self.xf;
                out.extend(pts.iter().map(|bp| bp.map(|p| xf.point(p))));
                Ok(())
            }
            _ => Err(self.wrong("bezpoints")),
        }
    }

    fn text(&mut self) -> Result<&'a str, ReplayError> {
        match self.next()? {
            Slot::Text(t) => Ok(t),
            _ => Err(self.wrong("text")),
        }
    }

    fn font(&mut self) -> Result<&'a Font, ReplayError> {
        match self.next()? {
            Slot::Font(f) => Ok(f),
            _ => Err(self.wrong("font")),
        }
    }

    fn image(&mut self) -> Result<&'a Arc<Image>, ReplayError> {
        match self.next()? {
            Slot::Image(i) => Ok(i),
            _ => Err(self.wrong("image")),
        }
    }
}

/// Decode every operand of `rec` first, then make exactly one call.
fn replay_one<R: Renderer + ?Sized>(
    rec: &mut Record<'_>,
    target: &mut R,
    scratch: &mut Scratch,
) -> Result<(), ReplayError> {
    match rec.op {
        Opcode::SetLineWidth => {
            let w = rec.length()?;
            target.set_linewidth(w);
        }
        Opcode::SetLineCaps => {
            let caps = rec.code::<LineCaps>()?;
            target.set_linecaps(caps);
        }
        Opcode::SetLineJoin => {
            let join = rec.code::<LineJoin>()?;
            target.set_linejoin(join);
        }
        Opcode::SetLineStyle => {
            let style = rec.code::<LineStyle>()?;
            let dash = rec.length()?;
            target.set_linestyle(style, dash);
        }
        Opcode::SetDashLength => {
            let dash = rec.length()?;
            target.set_dashlength(dash);
        }
        Opcode::SetFillStyle => {
            let style = rec.code::<FillStyle>()?;
            target.set_fillstyle(style);
        }
        Opcode::SetFont => {
            let font = rec.font()?;
            let height = rec.length()?;
            target.set_font(font, height);
        }
        Opcode::DrawLine => {
            let (a, b, color) = (rec.point()?, rec.point()?, rec.color()?);
            target.draw_line(a, b, &color);
        }
        Opcode::DrawPolyline => {
            rec.points(&mut scratch.points)?;
            let color = rec.color()?;
            target.draw_polyline(&scratch.points, &color);
        }
        Opcode::DrawPolygon => {
            rec.points(&mut scratch.points)?;
            let (fill, stroke) = (rec.opt_color()?, rec.opt_color()?);
            target.draw_polygon(&scratch.points, fill.as_ref(), stroke.as_ref());
        }
        Opcode::DrawRect => {
            let (ul, lr) = (rec.point()?, rec.point()?);
            let (fill, stroke) = (rec.opt_color()?, rec.opt_color()?);
            target.draw_rect(ul, lr, fill.as_ref(), stroke.as_ref());
        }
        Opcode::DrawRoundedRect => {
            let (ul, lr) = (rec.point()?, rec.point()?);
            let (fill, stroke) = (rec.opt_color()?, rec.opt_color()?);
            let radius = rec.length()?;
            target.draw_rounded_rect(ul, lr, fill.as_ref(), stroke.as_ref(), radius);
        }
        Opcode::DrawRoundedPolyline => {
            rec.points(&mut scratch.points)?;
            let color = rec.color()?;
            let radius = rec.length()?;
            target.draw_rounded_polyline(&scratch.points, &color, radius);
        }
        Opcode::DrawArc | Opcode::FillArc => {
            let center = rec.point()?;
            let (w, h) = (rec.length()?, rec.length()?);
            let (a1, a2) = (rec.real()?, rec.real()?);
            let color = rec.color()?;
            if rec.op == Opcode::DrawArc {
                target.draw_arc(center, w, h, a1, a2, &color);
            } else {
                target.fill_arc(center, w, h, a1, a2, &color);
            }
        }
        Opcode::DrawEllipse => {
            let center = rec.point()?;
            let (w, h) = (rec.length()?, rec.length()?);
            let (fill, stroke) = (rec.opt_color()?, rec.opt_color()?);
            target.draw_ellipse(center, w, h, fill.as_ref(), stroke.as_ref());
        }
        Opcode::DrawBezier => {
            rec.bez_points(&mut scratch.bez)?;
            let color = rec.color()?;
            target.draw_bezier(&scratch.bez, &color);
        }
        Opcode::DrawBeziergon => {
            rec.bez_points(&mut scratch.bez)?;
            let (fill, stroke) = (rec.opt_color()?, rec.opt_color()?);
            target.draw_beziergon(&scratch.bez, fill.as_ref(), stroke.as_ref());
        }
        Opcode::DrawString => {
            let text = rec.text()?;
            let pos = rec.point()?;
            let alignment = rec.code::<Alignment>()?;
            let color = rec.color()?;
            target.draw_string(text, pos, alignment, &color);
        }
        Opcode::DrawImage => {
            let pos = rec.point()?;
            let (w, h) = (rec.length()?, rec.length()?);
            let image = rec.image()?;
            target.draw_image(pos, w, h, image);
        }
        Opcode::DrawLineWithArrows => {
            let (a, b) = (rec.point()?, rec.point()?);
            let width = rec.length()?;
            let color = rec.color()?;
            let (start, end) = (rec.opt_arrow()?, rec.opt_arrow()?);
            target.draw_line_with_arrows(a, b, width, &color, start.as_ref(), end.as_ref());
        }
        Opcode::DrawPolylineWithArrows | Opcode::DrawRoundedPolylineWithArrows => {
            rec.points(&mut scratch.points)?;
            let width = rec.length()?;
            let color = rec.color()?;
            let (start, end) = (rec.opt_arrow()?, rec.opt_arrow()?);
            let pts = &scratch.points;
            if rec.op == Opcode::DrawPolylineWithArrows {
                target.draw_polyline_with_arrows(pts, width, &color, start.as_ref(), end.as_ref());
            } else {
                let radius = rec.length()?;
                target.draw_rounded_polyline_with_arrows(
                    pts,
                    width,
                    &color,
                    start.as_ref(),
                    end.as_ref(),
                    radius,
                );
            }
        }
        Opcode::DrawArcWithArrows => {
            let (a, b, mid) = (rec.point()?, rec.point()?, rec.point()?);
            let width = rec.length()?;
            let color = rec.color()?;
            let (start, end) = (rec.opt_arrow()?, rec.opt_arrow()?);
            target.draw_arc_with_arrows(a, b, mid, width, &color, start.as_ref(), end.as_ref());
        }
        Opcode::DrawBezierWithArrows => {
            rec.bez_points(&mut scratch.bez)?;
            let width = rec.length()?;
            let color = rec.color()?;
            let (start, end) = (rec.opt_arrow()?, rec.opt_arrow()?);
            target.draw_bezier_with_arrows(
                &scratch.bez,
                width,
                &color,
                start.as_ref(),
                end.as_ref(),
            );
        }
    }
    Ok(())
}

fn opt(color: Option<&Color>) -> Slot {
    Slot::OptColor(color.copied())
}

fn arrow(arrow: Option<&Arrow>) -> Slot {
    Slot::OptArrow(arrow.copied())
}

impl Renderer for CommandBuffer {
    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// Everything is recorded; the replay target decides what it can do.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn begin_render(&mut self, _region: Option<Rect>) -> Result<(), RenderError> {
        Ok(())
    }

    fn end_render(&mut self) -> Result<(), RenderError> {
        debug!(records = self.len(), slots = self.slots.len(), "recording finished");
        Ok(())
    }

    fn set_linewidth(&mut self, width: f64) {
        self.state.stroke.width = width;
        self.record(Opcode::SetLineWidth, [Slot::Real(width)]);
    }

    fn set_linecaps(&mut self, caps: LineCaps) {
        self.state.stroke.caps = caps;
        self.record(Opcode::SetLineCaps, [Slot::Int(caps.to_code())]);
    }

    fn set_linejoin(&mut self, join: LineJoin) {
        self.state.stroke.join = join;
        self.record(Opcode::SetLineJoin, [Slot::Int(join.to_code())]);
    }

    fn set_linestyle(&mut self, style: LineStyle, dash_length: f64) {
        self.state.stroke.style = style;
        self.state.stroke.dash_length = clamp_dash_length(dash_length);
        self.record(
            Opcode::SetLineStyle,
            [Slot::Int(style.to_code()), Slot::Real(dash_length)],
        );
    }

    fn set_dashlength(&mut self, length: f64) {
        self.state.stroke.dash_length = clamp_dash_length(length);
        self.record(Opcode::SetDashLength, [Slot::Real(length)]);
    }

    fn set_fillstyle(&mut self, style: FillStyle) {
        self.state.fill_style = style;
        self.record(Opcode::SetFillStyle, [Slot::Int(style.to_code())]);
    }

    fn set_font(&mut self, font: &Font, height: f64) {
        self.state.font = Some(font.clone());
        self.state.font_height = height;
        self.record(Opcode::SetFont, [Slot::Font(font.clone()), Slot::Real(height)]);
    }

    fn draw_line(&mut self, start: Point, end: Point, color: &Color) {
        self.record(
            Opcode::DrawLine,
            [Slot::Point(start), Slot::Point(end), Slot::Color(*color)],
        );
    }

    fn draw_polyline(&mut self, points: &[Point], color: &Color) {
        self.record(
            Opcode::DrawPolyline,
            [Slot::Points(points.into()), Slot::Color(*color)],
        );
    }

    fn draw_polygon(&mut self, points: &[Point], fill: Option<&Color>, stroke: Option<&Color>) {
        self.record(
            Opcode::DrawPolygon,
            [Slot::Points(points.into()), opt(fill), opt(stroke)],
        );
    }

    fn draw_rect(&mut self, ul: Point, lr: Point, fill: Option<&Color>, stroke: Option<&Color>) {
        self.record(
            Opcode::DrawRect,
            [Slot::Point(ul), Slot::Point(lr), opt(fill), opt(stroke)],
        );
    }

    fn draw_rounded_rect(
        &mut self,
        ul: Point,
        lr: Point,
        fill: Option<&Color>,
        stroke: Option<&Color>,
        radius: f64,
    ) {
        self.record(
            Opcode::DrawRoundedRect,
            [
                Slot::Point(ul),
                Slot::Point(lr),
                opt(fill),
                opt(stroke),
                Slot::Real(radius),
            ],
        );
    }

    fn draw_rounded_polyline(&mut self, points: &[Point], color: &Color, radius: f64) {
        self.record(
            Opcode::DrawRoundedPolyline,
            [
                Slot::Points(points.into()),
                Slot::Color(*color),
                Slot::Real(radius),
            ],
        );
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
        self.record(
            Opcode::DrawArc,
            [
                Slot::Point(center),
                Slot::Real(width),
                Slot::Real(height),
                Slot::Real(angle1),
                Slot::Real(angle2),
                Slot::Color(*color),
            ],
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
        self.record(
            Opcode::FillArc,
            [
                Slot::Point(center),
                Slot::Real(width),
                Slot::Real(height),
                Slot::Real(angle1),
                Slot::Real(angle2),
                Slot::Color(*color),
            ],
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
        self.record(
            Opcode::DrawEllipse,
            [
                Slot::Point(center),
                Slot::Real(width),
                Slot::Real(height),
                opt(fill),
                opt(stroke),
            ],
        );
    }

    fn draw_bezier(&mut self, points: &[BezPoint], color: &Color) {
        self.record(
            Opcode::DrawBezier,
            [Slot::BezPoints(points.into()), Slot::Color(*color)],
        );
    }

    fn draw_beziergon(
        &mut self,
        points: &[BezPoint],
        fill: Option<&Color>,
        stroke: Option<&Color>,
    ) {
        self.record(
            Opcode::DrawBeziergon,
            [Slot::BezPoints(points.into()), opt(fill), opt(stroke)],
        );
    }

    fn draw_string(&mut self, text: &str, pos: Point, alignment: Alignment, color: &Color) {
        self.record(
            Opcode::DrawString,
            [
                Slot::Text(text.into()),
                Slot::Point(pos),
                Slot::Int(alignment.to_code()),
                Slot::Color(*color),
            ],
        );
    }

    fn draw_image(&mut self, pos: Point, width: f64, height: f64, image: &Arc<Image>) {
        self.record(
            Opcode::DrawImage,
            [
                Slot::Point(pos),
                Slot::Real(width),
                Slot::Real(height),
                Slot::Image(Arc::clone(image)),
            ],
        );
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
        self.state.stroke.width = line_width;
        self.record(
            Opcode::DrawLineWithArrows,
            [
                Slot::Point(start),
                Slot::Point(end),
                Slot::Real(line_width),
                Slot::Color(*color),
                arrow(start_arrow),
                arrow(end_arrow),
            ],
        );
    }

    fn draw_polyline_with_arrows(
        &mut self,
        points: &[Point],
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        self.state.stroke.width = line_width;
        self.record(
            Opcode::DrawPolylineWithArrows,
            [
                Slot::Points(points.into()),
                Slot::Real(line_width),
                Slot::Color(*color),
                arrow(start_arrow),
                arrow(end_arrow),
            ],
        );
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
        self.state.stroke.width = line_width;
        self.record(
            Opcode::DrawRoundedPolylineWithArrows,
            [
                Slot::Points(points.into()),
                Slot::Real(line_width),
                Slot::Color(*color),
                arrow(start_arrow),
                arrow(end_arrow),
                Slot::Real(radius),
            ],
        );
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
        self.state.stroke.width = line_width;
        self.record(
            Opcode::DrawArcWithArrows,
            [
                Slot::Point(start),
                Slot::Point(end),
                Slot::Point(mid),
                Slot::Real(line_width),
                Slot::Color(*color),
                arrow(start_arrow),
                arrow(end_arrow),
            ],
        );
    }

    fn draw_bezier_with_arrows(
        &mut self,
        points: &[BezPoint],
        line_width: f64,
        color: &Color,
        start_arrow: Option<&Arrow>,
        end_arrow: Option<&Arrow>,
    ) {
        self.state.stroke.width = line_width;
        self.record(
            Opcode::DrawBezierWithArrows,
            [
                Slot::BezPoints(points.into()),
                Slot::Real(line_width),
                Slot::Color(*color),
                arrow(start_arrow),
                arrow(end_arrow),
            ],
        );
    }
}
