//! Slide layout.
//!
//! Blocks are stacked top to bottom at a shared left margin. [`LayoutEngine::fit`]
//! picks one content width for the whole slide so the stack fits between the
//! top offset and the bottom margin; [`LayoutEngine::place`] then computes each
//! step's bounding box at that width.
use crate::config::Options;
use crate::render::RenderedBlock;
use crate::units::EmuRect;

/// A rectangle on the canvas, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InchRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl InchRect {
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    pub fn to_emu(self) -> EmuRect {
        EmuRect::from_inches(self.left, self.top, self.width, self.height)
    }
}

/// Bounding boxes of every step of one rendered block.
///
/// All steps share the block's left, top and width; only the height differs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub block_index: usize,
    pub steps: Vec<InchRect>,
}

/// Height of `block` at content width `width`, from its last step.
#[inline]
pub fn block_height(block: &RenderedBlock, width: f64) -> f64 {
    block.last_step().aspect_ratio() * width
}

/// Vertical layout for one slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    top_offset: f64,
    bottom_margin: f64,
    canvas_height: f64,
    base_width: f64,
    left_margin: f64,
    min_scale: f64,
}

impl LayoutEngine {
    pub fn new(top_offset: f64, bottom_margin: f64, canvas_height: f64, base_width: f64) -> Self {
        Self {
            top_offset,
            bottom_margin,
            canvas_height,
            base_width,
            left_margin: 1.0,
            min_scale: 0.5,
        }
    }

    /// Engine for a slide with or without a title.
    pub fn for_slide(options: &Options, has_title: bool) -> Self {
        let geometry = &options.geometry;
        Self::new(
            geometry.top_offset(has_title),
            geometry.bottom_margin,
            options.canvas.height,
            geometry.content_width,
        )
        .with_left_margin(geometry.left_margin)
        .with_min_scale(options.min_scale)
    }

    #[inline]
    pub fn with_left_margin(mut self, left_margin: f64) -> Self {
        self.left_margin = left_margin;
        self
    }

    #[inline]
    pub fn with_min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = min_scale;
        self
    }

    #[inline]
    pub fn top_offset(&self) -> f64 {
        self.top_offset
    }

    #[inline]
    pub fn base_width(&self) -> f64 {
        self.base_width
    }

    /// Height between the top offset and the bottom margin.
    #[inline]
    pub fn available_height(&self) -> f64 {
        self.canvas_height - self.top_offset - self.bottom_margin
    }

    /// Content width that makes `blocks` fit the canvas.
    ///
    /// Returns the base width when everything fits (or there is nothing to
    /// place); otherwise shrinks it, never below `min_scale` of the base and
    /// never above the base.
    pub fn fit(&self, blocks: &[RenderedBlock]) -> f64 {
        if blocks.is_empty() {
            return self.base_width;
        }

        let image_height: f64 = blocks.iter().map(|b| block_height(b, self.base_width)).sum();
        // The gap belongs to the block before it; nothing follows the last one
        let spacing: f64 = blocks[..blocks.len() - 1].iter().map(|b| b.spacing).sum();

        let available = self.available_height();
        if image_height + spacing <= available || image_height <= 0.0 {
            return self.base_width;
        }

        let scale = ((available - spacing) / image_height).clamp(self.min_scale, 1.0);
        self.base_width * scale
    }

    /// Bounding boxes for every step of every block, stacked from the top
    /// offset at content width `width`.
    pub fn place(&self, blocks: &[RenderedBlock], width: f64) -> Vec<PlacedBlock> {
        let mut cursor = self.top_offset;
        blocks
            .iter()
            .map(|block| {
                let (placed, next) = self.place_block(block, width, cursor);
                cursor = next;
                placed
            })
            .collect()
    }

    /// Place one block with its top at `cursor`; returns the block and the
    /// cursor for the next one.
    pub fn place_block(&self, block: &RenderedBlock, width: f64, cursor: f64) -> (PlacedBlock, f64) {
        let steps = block
            .steps()
            .iter()
            .map(|step| InchRect {
                left: self.left_margin,
                top: cursor,
                width,
                height: step.aspect_ratio() * width,
            })
            .collect();
        let next = cursor + block_height(block, width) + block.spacing;
        (
            PlacedBlock {
                block_index: block.block_index,
                steps,
            },
            next,
        )
    }
}
