//! Cropping rendered pages to their ink.
use crate::error::RenderFailure;
use image::{GenericImageView, RgbImage};

/// Pixels with every channel at or above this count as paper.
const PAPER_THRESHOLD: u8 = 245;

#[inline]
fn is_ink(pixel: &image::Rgb<u8>) -> bool {
    pixel.0.iter().any(|&c| c < PAPER_THRESHOLD)
}

/// First and last rows (inclusive) that contain any ink.
pub fn ink_rows(page: &RgbImage) -> Option<(u32, u32)> {
    let has_ink = |y: u32| (0..page.width()).any(|x| is_ink(page.get_pixel(x, y)));
    let top = (0..page.height()).find(|&y| has_ink(y))?;
    let bottom = (top..page.height()).rev().find(|&y| has_ink(y))?;
    Some((top, bottom))
}

/// Crop a page vertically to its ink plus `margin_px` on each side.
///
/// The full page width is kept so every step of a block shares the same
/// horizontal scale.
pub fn crop_to_ink(page: &RgbImage, margin_px: u32) -> Result<RgbImage, RenderFailure> {
    let (top, bottom) = ink_rows(page).ok_or(RenderFailure::BlankPage)?;
    let y0 = top.saturating_sub(margin_px);
    let y1 = bottom.saturating_add(margin_px).min(page.height() - 1);
    Ok(page.view(0, y0, page.width(), y1 - y0 + 1).to_image())
}
