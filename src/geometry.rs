//! Backend-independent geometry: arc tessellation, Bezier flattening,
//! arc-to-Bezier conversion and corner fillets.
//!
//! Angles are degrees, counter-clockwise from the positive x axis as seen
//! on screen. Since diagram y grows downward, a point at angle `a` on an
//! ellipse is `(cx + rx·cos a, cy − ry·sin a)`.

use std::f64::consts::PI;

use glam::dvec2;

use crate::log::warn;
use crate::types::{BezPoint, Point};

/// Target chord length of one tessellated arc segment, in output units.
pub const LEN_PER_SEGMENT: f64 = 3.0;

/// Arcs are never split into fewer segments than this.
pub const MIN_ARC_SEGMENTS: usize = 5;

/// Point at `angle` degrees on the ellipse of the given full width/height.
pub fn ellipse_point(center: Point, width: f64, height: f64, angle: f64) -> Point {
    let theta = angle.to_radians();
    dvec2(
        center.x + width / 2.0 * theta.cos(),
        center.y - height / 2.0 * theta.sin(),
    )
}

// ============================================================================
// Arc tessellation
// ============================================================================

/// How many points an arc of this size gets.
///
/// The circumference is over-approximated with the larger diameter and
/// scaled by the swept fraction of a full turn.
pub fn arc_point_count(width: f64, height: f64, sweep: f64) -> usize {
    let circumference = PI * width.max(height) * (sweep.abs() / 360.0);
    let n = (circumference / LEN_PER_SEGMENT).floor();
    if n.is_finite() && n > MIN_ARC_SEGMENTS as f64 {
        n as usize
    } else {
        MIN_ARC_SEGMENTS
    }
}

/// Approximate an elliptic arc by a polyline.
///
/// A range given clockwise (`angle2 < angle1`) is swapped so points always
/// run counter-clockwise. Negative sizes produce nothing.
pub fn tessellate_arc(
    center: Point,
    width: f64,
    height: f64,
    angle1: f64,
    angle2: f64,
) -> Vec<Point> {
    if width < 0.0 || height < 0.0 {
        return Vec::new();
    }
    let (a1, a2) = if angle2 < angle1 { (angle2, angle1) } else { (angle1, angle2) };
    let n = arc_point_count(width, height, a2 - a1);
    let step = (a2 - a1) / (n - 1) as f64;
    (0..n)
        .map(|i| ellipse_point(center, width, height, a1 + step * i as f64))
        .collect()
}

/// Pie slice outline: the center, the tessellated arc, the center again.
pub fn tessellate_pie(
    center: Point,
    width: f64,
    height: f64,
    angle1: f64,
    angle2: f64,
) -> Vec<Point> {
    let arc = tessellate_arc(center, width, height, angle1, angle2);
    if arc.is_empty() {
        return arc;
    }
    let mut points = Vec::with_capacity(arc.len() + 2);
    points.push(center);
    points.extend(arc);
    points.push(center);
    points
}

// ============================================================================
// Bezier flattening
// ============================================================================

const BEZIER_SUBDIVIDE_LIMIT: f64 = 0.01;
const BEZIER_SUBDIVIDE_LIMIT_SQ: f64 = BEZIER_SUBDIVIDE_LIMIT * BEZIER_SUBDIVIDE_LIMIT;
const MIN_CHORD_LEN_SQ: f64 = 0.000001;
const DEGENERATE_CURVE: f64 = 0.00001;
const SCRATCH_GROWTH: usize = 40;
const MAX_SUBDIVISION_DEPTH: u32 = 24;

/// Flattens Bezier paths into point lists.
///
/// The scratch storage lives as long as the owning renderer so repeated
/// paths in one pass do not reallocate.
#[derive(Debug, Default)]
pub struct BezierApprox {
    points: Vec<Point>,
}

impl BezierApprox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `path` into a single point list.
    ///
    /// The path must start with `MoveTo` and hold no other `MoveTo`; both
    /// violations are logged and the offending element is treated as a
    /// line.
    pub fn approximate(&mut self, path: &[BezPoint]) -> &[Point] {
        self.points.clear();
        let Some(first) = path.first() else {
            return &self.points;
        };
        if !first.is_move_to() {
            warn!("first BezPoint must be a MoveTo");
        }
        let mut last = first.end();
        self.push(last);
        for bp in &path[1..] {
            match *bp {
                BezPoint::MoveTo(p) => {
                    warn!("only the first BezPoint may be a MoveTo");
                    self.push(p);
                    last = p;
                }
                BezPoint::LineTo(p) => {
                    self.push(p);
                    last = p;
                }
                BezPoint::CurveTo(c1, c2, p) => {
                    self.add_curve([last, c1, c2, p]);
                    last = p;
                }
            }
        }
        &self.points
    }

    fn push(&mut self, p: Point) {
        if self.points.len() == self.points.capacity() {
            self.points.reserve_exact(SCRATCH_GROWTH);
        }
        self.points.push(p);
    }

    fn add_curve(&mut self, curve: [Point; 4]) {
        let [p0, p1, p2, p3] = curve;
        if p0.distance(p1) < DEGENERATE_CURVE
            && p2.distance(p3) < DEGENERATE_CURVE
            && p0.distance(p3) < DEGENERATE_CURVE
        {
            self.push(p3);
            return;
        }
        self.add_lines(curve, 0);
    }

    fn add_lines(&mut self, curve: [Point; 4], depth: u32) {
        let [p0, p1, p2, p3] = curve;
        if depth >= MAX_SUBDIVISION_DEPTH
            || (is_flat(p0, p1, p3) && is_flat(p3, p2, p0))
        {
            self.push(p3);
            return;
        }

        // de Casteljau split at t = 0.5
        let middle = (p1 + p2) * 0.5;
        let r1 = (p0 + p1) * 0.5;
        let r2 = (r1 + middle) * 0.5;
        let s2 = (p2 + p3) * 0.5;
        let s1 = (s2 + middle) * 0.5;
        let split = (r2 + s1) * 0.5;

        self.add_lines([p0, r1, r2, split], depth + 1);
        self.add_lines([split, s1, s2, p3], depth + 1);
    }
}

/// Whether `control` lies within the subdivision limit of the chord
/// `from -> to`, measured perpendicular to the chord.
fn is_flat(from: Point, control: Point, to: Point) -> bool {
    let u = control - from;
    let v = to - from;
    let v_len_sq = v.length_squared();
    if v_len_sq.is_nan() {
        warn!("chord length is NaN while flattening a Bezier curve");
        return true;
    }
    let along = v * (u.dot(v) / v_len_sq.max(MIN_CHORD_LEN_SQ));
    let off = u - along;
    off.length_squared() < BEZIER_SUBDIVIDE_LIMIT_SQ
}

/// Count of `MoveTo` elements beyond the first.
pub fn extra_subpaths(path: &[BezPoint]) -> usize {
    path.iter().skip(1).filter(|bp| bp.is_move_to()).count()
}

// ============================================================================
// Arc to Bezier
// ============================================================================

/// Build a Bezier path following an elliptic arc.
///
/// The sweep is signed: `angle2 > angle1` runs counter-clockwise, the other
/// way clockwise. Each cubic covers at most 90 degrees. With `pie` the path
/// closes through the center, which is what a filled arc needs.
pub fn arc_to_bezier(
    center: Point,
    width: f64,
    height: f64,
    angle1: f64,
    angle2: f64,
    pie: bool,
) -> Vec<BezPoint> {
    let (rx, ry) = (width / 2.0, height / 2.0);
    let sweep = angle2 - angle1;
    let segments = ((sweep.abs() / 90.0).ceil() as usize).max(1);
    let step = (sweep / segments as f64).to_radians();
    // tangent length for a cubic spanning `step`
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let at = |theta: f64| dvec2(center.x + rx * theta.cos(), center.y - ry * theta.sin());
    let tangent = |theta: f64| dvec2(-rx * theta.sin(), -ry * theta.cos());

    let mut theta = angle1.to_radians();
    let start = at(theta);
    let mut path = Vec::with_capacity(segments + 3);
    path.push(BezPoint::MoveTo(start));
    for _ in 0..segments {
        let next = theta + step;
        let p0 = at(theta);
        let p3 = at(next);
        path.push(BezPoint::CurveTo(
            p0 + tangent(theta) * k,
            p3 - tangent(next) * k,
            p3,
        ));
        theta = next;
    }
    if pie {
        path.push(BezPoint::LineTo(center));
        path.push(BezPoint::LineTo(start));
    }
    path
}

// ============================================================================
// Arc by chord
// ============================================================================

/// An arc described by its end points and the signed distance from the
/// chord midpoint to the arc, the shape most diagram arc objects store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcChord {
    pub start: Point,
    pub end: Point,
    /// Positive for counter-clockwise sweeps, negative for clockwise ones.
    pub curve_distance: f64,
}

impl ArcChord {
    /// Fit a circular arc to an elliptic one, using the geometric mean of
    /// the radii.
    pub fn from_center(center: Point, width: f64, height: f64, angle1: f64, angle2: f64) -> Self {
        let r = (width / 2.0 * height / 2.0).sqrt();
        let big_arc = (angle2 - angle1).abs() > 180.0;
        let clockwise = angle2 < angle1;

        let start = ellipse_point(center, width, height, angle1);
        let end = ellipse_point(center, width, height, angle2);
        let a = start.distance(end) / 2.0;
        let b = if a < r { (r * r - a * a).sqrt() } else { 0.0 };
        let d = if big_arc { r + b } else { r - b };

        Self {
            start,
            end,
            curve_distance: if clockwise { -d } else { d },
        }
    }
}

impl ArcChord {
    /// The chord of the arc from `start` through `mid` to `end`.
    pub fn from_points(start: Point, end: Point, mid: Point) -> Self {
        let dir = (end - start).normalize_or_zero();
        let normal = dvec2(-dir.y, dir.x);
        Self {
            start,
            end,
            curve_distance: (mid - (start + end) / 2.0).dot(normal),
        }
    }
}

// ============================================================================
// Arc through three points
// ============================================================================

/// A circular arc given by a start point, a point on the way and an end
/// point, resolved to center and counter-clockwise angle range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleArc {
    pub center: Point,
    pub radius: f64,
    /// Counter-clockwise range, `angle1 <= angle2 < angle1 + 360`.
    pub angle1: f64,
    pub angle2: f64,
    /// Travelling from start to end runs clockwise, so the start sits at
    /// `angle2`.
    pub clockwise: bool,
}

impl CircleArc {
    /// `None` when the three points are collinear or coincide.
    pub fn through(start: Point, mid: Point, end: Point) -> Option<Self> {
        let (b, c) = (mid - start, end - start);
        let d = 2.0 * b.perp_dot(c);
        if d.abs() < 1e-12 {
            return None;
        }
        let (bb, cc) = (b.length_squared(), c.length_squared());
        let center = start + dvec2(c.y * bb - b.y * cc, b.x * cc - c.x * bb) / d;

        let angle_of = |p: Point| (-(p.y - center.y)).atan2(p.x - center.x).to_degrees();
        let (a_start, a_mid, a_end) = (angle_of(start), angle_of(mid), angle_of(end));
        let clockwise = (a_mid - a_start).rem_euclid(360.0) > (a_end - a_start).rem_euclid(360.0);
        let (angle1, angle2) = if clockwise {
            (a_end, a_end + (a_start - a_end).rem_euclid(360.0))
        } else {
            (a_start, a_start + (a_end - a_start).rem_euclid(360.0))
        };
        Some(Self {
            center,
            radius: start.distance(center),
            angle1,
            angle2,
            clockwise,
        })
    }

    /// Unit tangent at one end, pointing along the arc away from that end.
    pub fn inward(&self, at_start: bool) -> Point {
        let lower = at_start != self.clockwise;
        let theta = (if lower { self.angle1 } else { self.angle2 }).to_radians();
        let ccw = dvec2(-theta.sin(), -theta.cos());
        if lower { ccw } else { -ccw }
    }
}

// ============================================================================
// Fillets
// ============================================================================

/// A rounded corner: the two tangent points and the arc joining them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fillet {
    /// Where the incoming segment stops.
    pub enter: Point,
    /// Where the outgoing segment starts.
    pub exit: Point,
    pub center: Point,
    pub radius: f64,
    /// Counter-clockwise arc range, `angle1 < angle2 < angle1 + 180`.
    pub angle1: f64,
    pub angle2: f64,
}

/// Round the corner at `corner` between `prev` and `next`.
///
/// The radius shrinks when the adjacent segments are too short to hold it.
/// Returns `None` for straight or degenerate corners.
pub fn fillet(prev: Point, corner: Point, next: Point, radius: f64) -> Option<Fillet> {
    let to_prev = prev - corner;
    let to_next = next - corner;
    let (len_prev, len_next) = (to_prev.length(), to_next.length());
    if radius <= 0.0 || len_prev < 1e-9 || len_next < 1e-9 {
        return None;
    }
    let u = to_prev / len_prev;
    let v = to_next / len_next;
    let half = u.dot(v).clamp(-1.0, 1.0).acos() / 2.0;
    if half < 1e-6 || (PI / 2.0 - half) < 1e-6 {
        return None;
    }

    let mut tangent_len = radius / half.tan();
    let limit = len_prev.min(len_next) / 2.0;
    if tangent_len > limit {
        tangent_len = limit;
    }
    let radius = tangent_len * half.tan();
    let enter = corner + u * tangent_len;
    let exit = corner + v * tangent_len;
    let center = corner + (u + v).normalize() * (radius / half.sin());

    let angle_of = |p: Point| (-(p.y - center.y)).atan2(p.x - center.x).to_degrees();
    let (mut a1, mut a2) = (angle_of(enter), angle_of(exit));
    if (a2 - a1).rem_euclid(360.0) > 180.0 {
        std::mem::swap(&mut a1, &mut a2);
    }
    let a2 = a1 + (a2 - a1).rem_euclid(360.0);

    Some(Fillet {
        enter,
        exit,
        center,
        radius,
        angle1: a1,
        angle2: a2,
    })
}
