//! Concrete renderers.
//!
//! - `postscript`: PostScript and EPS
//! - `svg`: SVG documents
//! - `cgm`: binary Computer Graphics Metafile
//! - `metapost` / `pstricks`: TeX drawing macros
//! - `raster`: pixels through tiny-skia
//! - `import`: rebuilds shape objects instead of writing output
//!
//! The text and binary backends write to any [`std::io::Write`]. Writes never
//! fail a single drawing call: the first I/O error is kept, later output is
//! dropped, and `end_render` reports it.

pub mod cgm;
pub mod import;
pub mod metapost;
pub mod postscript;
pub mod pstricks;
pub mod raster;
pub mod svg;

use std::fmt;
use std::io::{self, Write};

use crate::errors::RenderError;
use crate::log::warn;
use crate::renderer::Renderer;

pub use cgm::{CgmOptions, CgmRenderer};
pub use import::{ImportRenderer, Shape, ShapeKind, ShapeStyle};
pub use metapost::MetapostRenderer;
pub use postscript::{PsOptions, PsRenderer};
pub use pstricks::PstricksRenderer;
pub use raster::{RasterOptions, RasterRenderer};
pub use svg::{SvgOptions, SvgRenderer};

/// Options shared by the two TeX macro backends.
#[derive(Clone, Debug)]
pub struct TexOptions {
    /// Centimetres per diagram unit.
    pub scale: f64,
    pub title: Option<String>,
}

impl Default for TexOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            title: None,
        }
    }
}

impl TexOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// File formats a stream backend can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    PostScript,
    Eps,
    Svg,
    Cgm,
    MetaPost,
    PsTricks,
}

impl OutputFormat {
    /// Guess a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ps" => Some(OutputFormat::PostScript),
            "eps" | "epsi" => Some(OutputFormat::Eps),
            "svg" => Some(OutputFormat::Svg),
            "cgm" => Some(OutputFormat::Cgm),
            "mp" => Some(OutputFormat::MetaPost),
            "tex" => Some(OutputFormat::PsTricks),
            _ => None,
        }
    }
}

/// Build the renderer for `format` writing to `sink`, with default options.
pub fn stream_renderer<'w, W: Write + 'w>(
    format: OutputFormat,
    sink: W,
) -> Box<dyn Renderer + 'w> {
    match format {
        OutputFormat::PostScript => {
            Box::new(PsRenderer::new(sink, PsOptions::default().with_eps(false)))
        }
        OutputFormat::Eps => Box::new(PsRenderer::new(sink, PsOptions::default())),
        OutputFormat::Svg => Box::new(SvgRenderer::new(sink, SvgOptions::default())),
        OutputFormat::Cgm => Box::new(CgmRenderer::new(sink, CgmOptions::default())),
        OutputFormat::MetaPost => Box::new(MetapostRenderer::new(sink, TexOptions::default())),
        OutputFormat::PsTricks => Box::new(PstricksRenderer::new(sink, TexOptions::default())),
    }
}

// ============================================================================
// Output plumbing
// ============================================================================

/// A writer that remembers its first failure instead of returning it.
#[derive(Debug)]
pub(crate) struct Output<W: Write> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: Write> Output<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    /// Target of `write!`; drops output once the sink has failed.
    pub(crate) fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.inner.write_fmt(args) {
            warn!(%err, "output sink failed, dropping further output");
            self.error = Some(err);
        }
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.inner.write_all(bytes) {
            warn!(%err, "output sink failed, dropping further output");
            self.error = Some(err);
        }
    }

    /// Flush and hand back the first error seen, if any.
    pub(crate) fn finish(&mut self) -> Result<(), RenderError> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.inner.flush()?;
        Ok(())
    }

    pub(crate) fn get_ref(&self) -> &W {
        &self.inner
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

/// The last value of one attribute written to the output.
#[derive(Debug)]
pub(crate) struct Lazy<T>(Option<T>);

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy(None)
    }
}

impl<T: PartialEq + Clone> Lazy<T> {
    /// Remember `value`, returning whether it differs from what was last
    /// written and so needs emitting.
    pub(crate) fn update(&mut self, value: &T) -> bool {
        if self.0.as_ref() == Some(value) {
            false
        } else {
            self.0 = Some(value.clone());
            true
        }
    }

    pub(crate) fn reset(&mut self) {
        self.0 = None;
    }
}

/// Tracks the begin/end bracket of a pass.
#[derive(Debug, Default)]
pub(crate) struct Pass {
    active: bool,
}

impl Pass {
    pub(crate) fn begin(&mut self) -> Result<(), RenderError> {
        if self.active {
            return Err(RenderError::PassActive);
        }
        self.active = true;
        Ok(())
    }

    pub(crate) fn end(&mut self) -> Result<(), RenderError> {
        if !self.active {
            return Err(RenderError::NotInPass);
        }
        self.active = false;
        Ok(())
    }
}
