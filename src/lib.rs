//! One drawing contract, many outputs.
//!
//! Diagram objects draw themselves through the [`Renderer`] trait: lines,
//! polygons, arcs, ellipses, Bezier paths, text and images, plus a small
//! amount of sticky state (line width, caps, join, dash style, font). The
//! backends in [`backends`] turn that call stream into pixels, PostScript,
//! SVG, CGM, MetaPost or PSTricks, or back into shape objects.
//!
//! A [`CommandBuffer`] records the same calls and replays them later with
//! a scale and translation applied, against any renderer.
//!
//! ```
//! use drawstream::backends::{SvgOptions, SvgRenderer};
//! use drawstream::{Color, Rect, Renderer};
//! use glam::dvec2;
//!
//! let mut svg = SvgRenderer::new(Vec::new(), SvgOptions::default());
//! svg.begin_render(Some(Rect::new(0.0, 0.0, 4.0, 2.0))).unwrap();
//! svg.set_linewidth(0.1);
//! svg.draw_line(dvec2(0.0, 0.0), dvec2(4.0, 2.0), &Color::BLACK);
//! svg.end_render().unwrap();
//! let out = String::from_utf8(svg.into_inner()).unwrap();
//! assert!(out.contains("<line"));
//! ```

mod log;

pub mod backends;
pub mod command_buffer;
pub mod errors;
pub mod geometry;
pub mod renderer;
pub mod stroke;
pub mod text;
pub mod types;

pub use command_buffer::{CommandBuffer, Opcode};
pub use errors::{RenderError, ReplayError};
pub use renderer::{RenderState, Renderer, StrokeState};
pub use stroke::DashConvention;
pub use text::{ProportionalMetrics, TextLayout};
pub use types::{
    Alignment, Arrow, ArrowKind, BezPoint, Capabilities, Color, FillStyle, Font, FontSlant,
    FontWeight, Image, LineCaps, LineJoin, LineStyle, Point, Rect,
};
