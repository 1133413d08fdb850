//! Per-slide orchestration.
//!
//! [`SlideAssembler`] takes a frame's rendered blocks, fits and places them,
//! adds one picture per reveal step and drives the slide's timing tree so each
//! click reveals the next step.
use crate::config::Options;
use crate::deck::Frame;
use crate::error::{Error, RenderFailure, Result};
use crate::layout::{LayoutEngine, PlacedBlock};
use crate::pptx::{ImageFormat, Slide};
use crate::render::{BlockRenderer, RenderedBlock};
use crate::timing::{AnimationEvent, ShapeId};
use crate::units::EmuRect;
use std::path::Path;
use tracing::{debug, warn};

/// Appear/disappear events for blocks whose step shapes are `blocks`, starting
/// at click `start_click`.
///
/// Each block's first step appears on its own click. Every later step appears
/// on the next click, and the step before it disappears on that same click.
/// Returns the events in emission order and the next free click index.
pub fn sequence_clicks(blocks: &[Vec<ShapeId>], start_click: usize) -> (Vec<AnimationEvent>, usize) {
    let mut events = Vec::new();
    let mut click = start_click;
    for shapes in blocks {
        let mut previous: Option<ShapeId> = None;
        for &shape in shapes {
            events.push(AnimationEvent::appear(shape, click));
            if let Some(prev) = previous {
                events.push(AnimationEvent::disappear(prev, click));
            }
            previous = Some(shape);
            click += 1;
        }
    }
    (events, click)
}

/// Outcome of assembling one slide.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlideSummary {
    /// Picture shapes placed
    pub shapes: usize,
    /// Clicks in the slide's timing tree
    pub clicks: usize,
    /// Content width after overflow scaling, in inches
    pub content_width: f64,
    /// Timing events the tree refused
    pub rejected_events: usize,
}

/// Builds slides from rendered blocks.
#[derive(Debug, Clone, Copy)]
pub struct SlideAssembler<'a> {
    options: &'a Options,
}

impl<'a> SlideAssembler<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Render every block of `frame`, one after another, skipping failures.
    ///
    /// Each block gets its own directory under `scratch`. Returns the
    /// successful blocks in frame order and the number skipped.
    pub fn render_blocks(
        &self,
        renderer: &BlockRenderer<'_>,
        frame: &Frame,
        scratch: &Path,
    ) -> (Vec<RenderedBlock>, usize) {
        let mut rendered = Vec::with_capacity(frame.blocks.len());
        let mut skipped = 0;
        for (index, block) in frame.blocks.iter().enumerate() {
            let block_dir = scratch.join(format!("block_{:03}", index));
            match renderer.render(block, index, &block_dir) {
                Ok(block) => rendered.push(block),
                Err(RenderFailure::StaticBlock(_)) => {},
                Err(e) => {
                    warn!(block = index, kind = %block.kind, error = %e, "skipping block");
                    skipped += 1;
                },
            }
        }
        (rendered, skipped)
    }

    /// Render and assemble `frame` onto `slide` sequentially.
    pub fn build(
        &self,
        slide: &mut Slide,
        frame: &Frame,
        renderer: &BlockRenderer<'_>,
        scratch: &Path,
    ) -> Result<(SlideSummary, usize)> {
        let (blocks, skipped) = self.render_blocks(renderer, frame, scratch);
        let summary = self.assemble(slide, frame, &blocks)?;
        Ok((summary, skipped))
    }

    /// Add the frame's title box, if it has a title.
    pub fn add_title(&self, slide: &mut Slide, frame: &Frame) {
        if !frame.has_title() {
            return;
        }
        let g = &self.options.geometry;
        let rect = EmuRect::from_inches(g.title_left, g.title_top, g.title_width, g.title_height);
        slide.add_title(frame.title.trim(), rect, g.title_font_size);
    }

    /// Lay out `blocks` on `slide` and animate their reveal steps.
    ///
    /// `blocks` must be in frame order; failed blocks are simply absent. On
    /// error the slide is left as it was.
    #[tracing::instrument(level = "debug", skip_all, fields(title = %frame.title, blocks = blocks.len()))]
    pub fn assemble(&self, slide: &mut Slide, frame: &Frame, blocks: &[RenderedBlock]) -> Result<SlideSummary> {
        // Nothing touches the slide until every step image is in hand
        let images = load_step_images(blocks)?;

        let engine = LayoutEngine::for_slide(self.options, frame.has_title());
        let width = engine.fit(blocks);
        if width < engine.base_width() {
            debug!(width, base = engine.base_width(), "scaled content to fit");
        }
        let placed = engine.place(blocks, width);

        self.add_title(slide, frame);
        let shape_ids = place_pictures(slide, blocks, images, &placed)?;
        let start = slide.click_count();
        let (events, _) = sequence_clicks(&shape_ids, start);

        let mut rejected = 0;
        for event in &events {
            if let Err(e) = slide.timing_mut().apply(event) {
                warn!(shape = event.shape_id, click = event.click_index, error = %e, "timing event rejected");
                rejected += 1;
            }
        }

        Ok(SlideSummary {
            shapes: shape_ids.iter().map(Vec::len).sum(),
            clicks: slide.click_count(),
            content_width: width,
            rejected_events: rejected,
        })
    }

    /// Place a whole pre-rendered page across the full canvas width, without
    /// animation.
    pub fn place_full_frame(&self, slide: &mut Slide, png: Vec<u8>, width_px: u32, height_px: u32) -> Result<SlideSummary> {
        let canvas = &self.options.canvas;
        let height = if width_px == 0 {
            canvas.height
        } else {
            canvas.width * height_px as f64 / width_px as f64
        };
        slide.add_picture(png, EmuRect::from_inches(0.0, 0.0, canvas.width, height), "frame")?;
        Ok(SlideSummary {
            shapes: 1,
            clicks: slide.click_count(),
            content_width: canvas.width,
            rejected_events: 0,
        })
    }
}

/// Read every step's image and check it is a picture format the container
/// accepts; grouped by block.
fn load_step_images(blocks: &[RenderedBlock]) -> Result<Vec<Vec<Vec<u8>>>> {
    blocks
        .iter()
        .map(|block| {
            block
                .steps()
                .iter()
                .map(|step| {
                    let data = std::fs::read(&step.path)?;
                    if ImageFormat::detect(&data).is_none() {
                        return Err(Error::InvalidFormat(format!(
                            "{} is not a supported image",
                            step.path.display()
                        )));
                    }
                    Ok(data)
                })
                .collect()
        })
        .collect()
}

/// Add one picture per step; returns the shape ids grouped by block.
fn place_pictures(
    slide: &mut Slide,
    blocks: &[RenderedBlock],
    images: Vec<Vec<Vec<u8>>>,
    placed: &[PlacedBlock],
) -> Result<Vec<Vec<ShapeId>>> {
    let mut shape_ids = Vec::with_capacity(blocks.len());
    for ((block, data), placement) in blocks.iter().zip(images).zip(placed) {
        let mut ids = Vec::with_capacity(block.step_count());
        for ((step, data), rect) in block.steps().iter().zip(data).zip(&placement.steps) {
            let description = format!("block {} step {}", block.block_index, step.revealed);
            ids.push(slide.add_picture(data, rect.to_emu(), description)?);
        }
        shape_ids.push(ids);
    }
    Ok(shape_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{BlockKind, ContentBlock};
    use crate::pptx::Presentation;
    use crate::render::RenderedStep;
    use crate::render::backend::fake::FakeBackend;
    use crate::timing::EffectKind;

    #[test]
    fn test_sequence_clicks_mixed_blocks() {
        // Step counts [1, 2, 1]
        let blocks = vec![vec![2], vec![3, 4], vec![5]];
        let (events, next) = sequence_clicks(&blocks, 0);

        let appears: Vec<_> = events.iter().filter(|e| e.kind == EffectKind::Appear).collect();
        let disappears: Vec<_> = events.iter().filter(|e| e.kind == EffectKind::Disappear).collect();
        assert_eq!(appears.len(), 4);
        assert_eq!(disappears.len(), 1);
        assert_eq!(disappears[0].shape_id, 3);
        assert_eq!(disappears[0].click_index, 2);

        let clicks: Vec<usize> = appears.iter().map(|e| e.click_index).collect();
        assert_eq!(clicks, vec![0, 1, 2, 3]);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_sequence_clicks_continues_from_start() {
        let (events, next) = sequence_clicks(&[vec![7, 8]], 3);
        assert_eq!(
            events,
            vec![
                AnimationEvent::appear(7, 3),
                AnimationEvent::appear(8, 4),
                AnimationEvent::disappear(7, 4),
            ]
        );
        assert_eq!(next, 5);
    }

    #[test]
    fn test_sequence_clicks_empty() {
        let (events, next) = sequence_clicks(&[], 0);
        assert!(events.is_empty());
        assert_eq!(next, 0);
    }

    #[test]
    fn test_build_slide_with_failed_block() {
        let options = Options::default().with_resolution(72);
        let backend = FakeBackend::failing_on("BROKEN");
        let renderer = BlockRenderer::new(&backend, &options, "");
        let scratch = tempfile::tempdir().unwrap();

        let frame = Frame::new(
            "Mixed",
            vec![
                ContentBlock::from_items(BlockKind::Itemize, ["a", "b"]),
                ContentBlock::from_items(BlockKind::Text, ["BROKEN"]),
                ContentBlock::new(BlockKind::Code, "let x = 1;", Vec::new()),
                ContentBlock::from_items(BlockKind::Text, ["closing"]),
            ],
        );

        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let assembler = SlideAssembler::new(&options);
        let (summary, skipped) = assembler.build(slide, &frame, &renderer, scratch.path()).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(summary.shapes, 3);
        assert_eq!(summary.clicks, 3);
        assert_eq!(summary.rejected_events, 0);
        assert_eq!(slide.title(), Some("Mixed"));

        // Both steps of the list share a box
        let pictures = slide.pictures();
        assert_eq!(pictures[0].rect.y, pictures[1].rect.y);
        assert_eq!(pictures[0].rect.x, pictures[1].rect.x);
        assert!(pictures[2].rect.y > pictures[1].rect.y);
    }

    #[test]
    fn test_unreadable_step_leaves_slide_untouched() {
        let options = Options::default().with_resolution(72);
        let backend = FakeBackend::new();
        let renderer = BlockRenderer::new(&backend, &options, "");
        let scratch = tempfile::tempdir().unwrap();

        let first = ContentBlock::from_items(BlockKind::Text, ["first"]);
        let good = renderer.render(&first, 0, &scratch.path().join("block_000")).unwrap();
        let missing = RenderedBlock::from_steps(
            1,
            BlockKind::Text,
            vec![RenderedStep {
                path: scratch.path().join("block_001").join("step_001.png"),
                width_px: 600,
                height_px: 60,
                revealed: 1,
                text: "second".to_string(),
            }],
            options.geometry.text_spacing,
        )
        .unwrap();

        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let frame = Frame::new("Broken", Vec::new());
        let result = SlideAssembler::new(&options).assemble(slide, &frame, &[good, missing]);

        assert!(result.is_err());
        assert_eq!(slide.shape_count(), 0);
        assert_eq!(slide.title(), None);
        assert!(slide.timing().is_empty());
    }

    #[test]
    fn test_non_image_step_leaves_slide_untouched() {
        let options = Options::default();
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join("step_001.png");
        std::fs::write(&path, b"not an image").unwrap();
        let block = RenderedBlock::from_steps(
            0,
            BlockKind::Itemize,
            vec![RenderedStep {
                path,
                width_px: 600,
                height_px: 60,
                revealed: 1,
                text: "a".to_string(),
            }],
            options.geometry.block_spacing,
        )
        .unwrap();

        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let result = SlideAssembler::new(&options).assemble(slide, &Frame::new("Title", Vec::new()), &[block]);

        assert!(matches!(result, Err(Error::InvalidFormat(_))));
        assert_eq!(slide.shape_count(), 0);
        assert_eq!(slide.title(), None);
    }

    #[test]
    fn test_assemble_empty_frame() {
        let options = Options::default();
        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let summary = SlideAssembler::new(&options)
            .assemble(slide, &Frame::new("", Vec::new()), &[])
            .unwrap();
        assert_eq!(summary.shapes, 0);
        assert_eq!(summary.clicks, 0);
        assert_eq!(summary.content_width, options.geometry.content_width);
        assert!(slide.timing().is_empty());
        assert_eq!(slide.title(), None);
    }

    #[test]
    fn test_place_full_frame() {
        let options = Options::default();
        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let png = b"\x89PNG\r\n\x1a\n".to_vec();
        let summary = SlideAssembler::new(&options)
            .place_full_frame(slide, png, 1600, 900)
            .unwrap();
        assert_eq!(summary.shapes, 1);
        assert_eq!(summary.clicks, 0);
        assert_eq!(slide.pictures()[0].rect.x, 0);
    }

    #[test]
    fn test_place_full_frame_rejects_non_image() {
        let options = Options::default();
        let mut pres = Presentation::widescreen();
        let slide = pres.add_slide();
        let result = SlideAssembler::new(&options).place_full_frame(slide, b"%PDF-1.5".to_vec(), 1600, 900);
        assert!(result.is_err());
        assert_eq!(slide.shape_count(), 0);
    }
}
