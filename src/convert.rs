//! Whole-deck conversion.
//!
//! Conversion runs in two stages. First every block of every frame is rendered
//! on a bounded rayon pool; results come back in frame and block order. Then
//! slides are assembled one after another, because layout and click
//! sequencing depend on that order.
use crate::assemble::SlideAssembler;
use crate::config::Options;
use crate::deck::{Deck, Frame, parse_beamer};
use crate::error::{Error, RenderFailure, Result};
use crate::pptx::Presentation;
use crate::render::{BlockRenderer, PdfLatexBackend, RenderedBlock, TypesettingBackend};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Totals for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub slides: usize,
    pub shapes: usize,
    pub clicks: usize,
    /// Blocks dropped because every reveal step failed
    pub skipped_blocks: usize,
    /// Frames drawn from the compiled source instead of block by block
    pub static_frames: usize,
    /// Frames whose slide could not be assembled and was left empty
    pub failed_frames: usize,
    /// Where the presentation was written, when it was
    pub output: Option<PathBuf>,
}

impl std::fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} slides, {} shapes, {} clicks",
            self.slides, self.shapes, self.clicks
        )?;
        if self.static_frames > 0 {
            write!(f, ", {} static frames", self.static_frames)?;
        }
        if self.skipped_blocks > 0 {
            write!(f, ", {} blocks skipped", self.skipped_blocks)?;
        }
        if self.failed_frames > 0 {
            write!(f, ", {} frames failed", self.failed_frames)?;
        }
        if let Some(output) = &self.output {
            write!(f, " -> {}", output.display())?;
        }
        Ok(())
    }
}

/// Converts Beamer sources into presentations.
pub struct Converter<B: TypesettingBackend = PdfLatexBackend> {
    options: Options,
    backend: B,
}

impl Converter<PdfLatexBackend> {
    /// Converter using `pdflatex`/`pdftoppm` as configured in `options`.
    pub fn new(options: Options) -> Result<Self> {
        let backend = PdfLatexBackend::from_options(&options);
        Self::with_backend(options, backend)
    }
}

impl<B: TypesettingBackend> Converter<B> {
    pub fn with_backend(options: Options, backend: B) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, backend })
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Convert the file at `input`, writing to `output` or, when `None`, to
    /// `input` with a `.pptx` extension.
    pub fn convert_file(&self, input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
        let source = std::fs::read_to_string(input)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("pptx"));

        let (presentation, mut report) = self.convert_source(&source, Some(input))?;
        presentation.save(&output)?;
        info!(output = %output.display(), "presentation written");
        report.output = Some(output);
        Ok(report)
    }

    /// Convert Beamer source text.
    ///
    /// `source_path` enables the static path for frames containing code: the
    /// whole document is compiled once and those frames are taken from the
    /// resulting pages.
    pub fn convert_source(
        &self,
        source: &str,
        source_path: Option<&Path>,
    ) -> Result<(Presentation, ConversionReport)> {
        let deck = parse_beamer(source);
        info!(frames = deck.frames.len(), "parsed deck");
        self.convert_deck(&deck, source_path)
    }

    /// Convert an already parsed deck.
    pub fn convert_deck(
        &self,
        deck: &Deck,
        source_path: Option<&Path>,
    ) -> Result<(Presentation, ConversionReport)> {
        let scratch = tempfile::Builder::new().prefix("beamer-reveal-").tempdir()?;
        let compiled = self.compile_static_source(deck, source_path, scratch.path());

        let renderer = BlockRenderer::new(&self.backend, &self.options, &deck.preamble);
        let is_static = |frame: &Frame| frame.has_code && compiled.is_some();
        let (rendered, mut skipped) = self.render_all(deck, &renderer, scratch.path(), &is_static)?;

        let canvas = &self.options.canvas;
        let mut presentation = Presentation::from_inches(canvas.width, canvas.height);
        presentation.set_metadata(&deck.title, &deck.author);
        let assembler = SlideAssembler::new(&self.options);
        let mut report = ConversionReport::default();

        for (index, (frame, blocks)) in deck.frames.iter().zip(&rendered).enumerate() {
            let slide = presentation.add_slide();

            if is_static(frame)
                && let Some(pdf) = &compiled
            {
                match self.static_frame_png(pdf, index) {
                    Ok((png, width, height)) => {
                        match assembler.place_full_frame(slide, png, width, height) {
                            Ok(summary) => {
                                report.shapes += summary.shapes;
                                report.static_frames += 1;
                            },
                            Err(e) => {
                                warn!(frame = index, error = %e, "static frame could not be placed");
                                report.failed_frames += 1;
                            },
                        }
                        continue;
                    },
                    Err(e) => {
                        warn!(frame = index, error = %e, "static frame failed, rendering blocks");
                        let frame_dir = scratch.path().join(format!("fallback_{:03}", index));
                        match assembler.build(slide, frame, &renderer, &frame_dir) {
                            Ok((summary, frame_skipped)) => {
                                report.shapes += summary.shapes;
                                report.clicks += summary.clicks;
                                skipped += frame_skipped;
                            },
                            Err(e) => {
                                warn!(frame = index, error = %e, "frame assembly failed");
                                report.failed_frames += 1;
                            },
                        }
                        continue;
                    },
                }
            }

            match assembler.assemble(slide, frame, blocks) {
                Ok(summary) => {
                    debug!(frame = index, shapes = summary.shapes, clicks = summary.clicks, "slide assembled");
                    report.shapes += summary.shapes;
                    report.clicks += summary.clicks;
                },
                Err(e) => {
                    warn!(frame = index, error = %e, "frame assembly failed");
                    report.failed_frames += 1;
                },
            }
        }

        report.slides = presentation.slide_count();
        report.skipped_blocks = skipped;
        info!(
            slides = report.slides,
            shapes = report.shapes,
            clicks = report.clicks,
            skipped = report.skipped_blocks,
            "conversion finished"
        );
        Ok((presentation, report))
    }

    /// Compile the full source when some frame needs the static path.
    fn compile_static_source(&self, deck: &Deck, source_path: Option<&Path>, scratch: &Path) -> Option<PathBuf> {
        if !deck.has_code_frames() {
            return None;
        }
        let path = source_path?;
        match self.backend.compile_document(path, &scratch.join("deck")) {
            Ok(pdf) => Some(pdf),
            Err(RenderFailure::Unsupported(op)) => {
                debug!(op, "backend cannot compile whole documents");
                None
            },
            Err(e) => {
                warn!(error = %e, "compiling the full deck failed, code frames fall back to blocks");
                None
            },
        }
    }

    /// Render every block of every non-static frame on the worker pool.
    ///
    /// Returns the rendered blocks per frame, in order, and the number of
    /// blocks skipped.
    fn render_all(
        &self,
        deck: &Deck,
        renderer: &BlockRenderer<'_>,
        scratch: &Path,
        is_static: &(dyn Fn(&Frame) -> bool + Sync),
    ) -> Result<(Vec<Vec<RenderedBlock>>, usize)> {
        let tasks: Vec<(usize, usize)> = deck
            .frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| !is_static(frame))
            .flat_map(|(f, frame)| (0..frame.blocks.len()).map(move |b| (f, b)))
            .collect();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.options.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder
            .build()
            .map_err(|e| Error::Other(format!("failed to start worker pool: {}", e)))?;

        let results: Vec<std::result::Result<RenderedBlock, RenderFailure>> = pool.install(|| {
            tasks
                .par_iter()
                .map(|&(f, b)| {
                    let dir = scratch.join(format!("frame_{:03}", f)).join(format!("block_{:03}", b));
                    renderer.render(&deck.frames[f].blocks[b], b, &dir)
                })
                .collect()
        });

        let mut per_frame: Vec<Vec<RenderedBlock>> = vec![Vec::new(); deck.frames.len()];
        let mut skipped = 0;
        for (&(f, b), result) in tasks.iter().zip(results) {
            match result {
                Ok(block) => per_frame[f].push(block),
                Err(RenderFailure::StaticBlock(_)) => {},
                Err(e) => {
                    warn!(frame = f, block = b, error = %e, "skipping block");
                    skipped += 1;
                },
            }
        }
        Ok((per_frame, skipped))
    }

    /// Page `index + 1` of the compiled deck as PNG bytes.
    fn static_frame_png(&self, pdf: &Path, index: usize) -> Result<(Vec<u8>, u32, u32)> {
        let page = self.backend.rasterize_page(pdf, index + 1, self.options.resolution)?;
        let mut png = Vec::new();
        page.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok((png, page.width(), page.height()))
    }
}
