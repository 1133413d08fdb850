//! Block rendering.
//!
//! [`BlockRenderer`] turns one [`ContentBlock`] into an ordered sequence of
//! cumulative raster snapshots ("reveal steps"). Every step is re-typeset as a
//! complete standalone document, cropped to its ink extent at constant width,
//! and written as a PNG into a caller-supplied scratch directory.
//!
//! # Example
//!
//! ```no_run
//! use beamer_reveal::config::Options;
//! use beamer_reveal::deck::{BlockKind, ContentBlock};
//! use beamer_reveal::render::{BlockRenderer, PdfLatexBackend};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::default();
//! let backend = PdfLatexBackend::from_options(&options);
//! let renderer = BlockRenderer::new(&backend, &options, "");
//!
//! let block = ContentBlock::from_items(BlockKind::Itemize, ["First", "Second"]);
//! let rendered = renderer.render(&block, 0, std::path::Path::new("/tmp/steps"))?;
//! assert_eq!(rendered.step_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod crop;
pub mod document;

pub use backend::{PdfLatexBackend, TypesettingBackend};
pub use document::{FragmentKind, reveal_fragments, sanitize_fragment, standalone_document};

use crate::config::{CanvasGeometry, Options, RenderStyle};
use crate::deck::{BlockKind, ContentBlock};
use crate::error::RenderFailure;
use crate::units::pt_to_px;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One reveal step: a cropped bitmap on disk and its pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStep {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
    /// Number of reveal items shown by this step
    pub revealed: usize,
    /// The revealed items, newline-joined; a prefix of the next step's text
    pub text: String,
}

impl RenderedStep {
    /// Height over width.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        if self.width_px == 0 {
            return 0.0;
        }
        self.height_px as f64 / self.width_px as f64
    }
}

/// The reveal steps of one content block.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlock {
    /// Position of the source block within its frame
    pub block_index: usize,
    pub kind: BlockKind,
    steps: Vec<RenderedStep>,
    /// Vertical gap after this block, in inches
    pub spacing: f64,
}

impl RenderedBlock {
    /// Build a block from already rendered steps.
    ///
    /// Returns `None` for an empty step list: a block without steps is not
    /// placed at all.
    pub fn from_steps(
        block_index: usize,
        kind: BlockKind,
        steps: Vec<RenderedStep>,
        spacing: f64,
    ) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(Self {
            block_index,
            kind,
            steps,
            spacing,
        })
    }

    #[inline]
    pub fn steps(&self) -> &[RenderedStep] {
        &self.steps
    }

    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The final, tallest step. Layout sizes the block from this one.
    #[inline]
    pub fn last_step(&self) -> &RenderedStep {
        // from_steps guarantees at least one step
        &self.steps[self.steps.len() - 1]
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.steps.len() > 1
    }
}

/// Renders content blocks through a [`TypesettingBackend`].
///
/// Holds only shared, read-only state, so one renderer can serve a whole
/// worker pool.
pub struct BlockRenderer<'a> {
    backend: &'a dyn TypesettingBackend,
    style: &'a RenderStyle,
    geometry: &'a CanvasGeometry,
    preamble: &'a str,
    resolution: u32,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(backend: &'a dyn TypesettingBackend, options: &'a Options, preamble: &'a str) -> Self {
        Self {
            backend,
            style: &options.style,
            geometry: &options.geometry,
            preamble,
            resolution: options.resolution,
        }
    }

    /// Gap after a block of `kind`, in inches.
    #[inline]
    pub fn spacing_for(&self, kind: BlockKind) -> f64 {
        match kind {
            BlockKind::Text => self.geometry.text_spacing,
            _ => self.geometry.block_spacing,
        }
    }

    /// Render every reveal step of `block` into `scratch`.
    ///
    /// A step that fails is dropped; the block fails only when no step
    /// survives.
    #[tracing::instrument(level = "debug", skip(self, block, scratch), fields(kind = %block.kind))]
    pub fn render(
        &self,
        block: &ContentBlock,
        block_index: usize,
        scratch: &Path,
    ) -> Result<RenderedBlock, RenderFailure> {
        if block.kind == BlockKind::Code {
            return Err(RenderFailure::StaticBlock("code"));
        }
        let fragments = reveal_fragments(block);
        if fragments.is_empty() {
            return Err(RenderFailure::EmptyFragment);
        }
        std::fs::create_dir_all(scratch)?;

        let mut steps = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            match self.render_step(block, fragment, i + 1, scratch) {
                Ok(step) => {
                    debug!(
                        step = i + 1,
                        width = step.width_px,
                        height = step.height_px,
                        "rendered step"
                    );
                    steps.push(step);
                },
                Err(e) => warn!(step = i + 1, error = %e, "dropping reveal step"),
            }
        }

        let attempted = fragments.len();
        RenderedBlock::from_steps(block_index, block.kind, steps, self.spacing_for(block.kind))
            .ok_or(RenderFailure::AllStepsFailed { attempted })
    }

    fn render_step(
        &self,
        block: &ContentBlock,
        fragment: &str,
        revealed: usize,
        scratch: &Path,
    ) -> Result<RenderedStep, RenderFailure> {
        let document =
            standalone_document(fragment, block.kind.into(), self.preamble, self.style)
                .ok_or(RenderFailure::EmptyFragment)?;
        let page = self.backend.compile_fragment(&document, self.resolution)?;
        let margin = pt_to_px(self.style.crop_margin_pt, self.resolution);
        let cropped = crop::crop_to_ink(&page, margin)?;

        let path = scratch.join(format!("step_{revealed:03}.png"));
        cropped
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| RenderFailure::Rasterize(e.to_string()))?;

        let shown = &block.items[..revealed.min(block.items.len())];
        let text = if block.kind == BlockKind::DisplayMath {
            block.raw.clone()
        } else {
            shown.join("\n")
        };

        Ok(RenderedStep {
            path,
            width_px: cropped.width(),
            height_px: cropped.height(),
            revealed,
            text,
        })
    }
}
