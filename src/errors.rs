//! Error types with diagnostics using miette
//!
//! Only a broken output sink ends a render pass. Everything else the
//! pipeline runs into is either logged and degraded, or collected as a
//! [`ReplayError`] while replay carries on.

use miette::Diagnostic;
use thiserror::Error;

use crate::command_buffer::Opcode;

// ============================================================================
// Render Errors
// ============================================================================

/// Fatal errors that abort a render pass
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("output sink failed")]
    #[diagnostic(code(drawstream::render::sink))]
    Sink {
        #[from]
        source: std::io::Error,
    },

    #[error("image data holds {actual} bytes, expected {expected} for {width}x{height}")]
    #[diagnostic(code(drawstream::render::image_size))]
    ImageSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("cannot allocate a {width}x{height} raster surface")]
    #[diagnostic(
        code(drawstream::render::surface),
        help("both dimensions must be non-zero and fit in memory")
    )]
    Surface { width: u32, height: u32 },

    #[error("PNG encoding failed: {message}")]
    #[diagnostic(code(drawstream::render::encode))]
    Encode { message: String },

    #[error("render pass already started")]
    #[diagnostic(
        code(drawstream::render::pass_active),
        help("passes do not nest; call end_render before starting another")
    )]
    PassActive,

    #[error("no render pass in progress")]
    #[diagnostic(code(drawstream::render::not_in_pass))]
    NotInPass,
}

// ============================================================================
// Replay Errors
// ============================================================================

/// Problems found while decoding a command buffer.
///
/// These never stop a replay: the offending record is skipped and decoding
/// resumes at the next opcode.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ReplayError {
    #[error("operand slot {index} is not an opcode")]
    #[diagnostic(code(drawstream::replay::stray_operand))]
    StrayOperand { index: usize },

    #[error("{op:?} at slot {index} expects a {expected} operand")]
    #[diagnostic(code(drawstream::replay::operand_kind))]
    OperandKind {
        op: Opcode,
        index: usize,
        expected: &'static str,
    },

    #[error("{op:?} at slot {index} is truncated")]
    #[diagnostic(code(drawstream::replay::truncated))]
    Truncated { op: Opcode, index: usize },
}
