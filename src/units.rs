//! Unit conversion utilities.
//!
//! Layout works in inches (the canvas constants are given in inches); the
//! presentation container works in EMUs; rendered bitmaps are measured in
//! pixels at the render resolution.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const POINTS_PER_INCH: f64 = 72.0;

#[inline]
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMUS_PER_INCH as f64).round() as i64
}

#[inline]
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_INCH as f64
}

/// Points to pixels at `dpi`, rounded to the nearest pixel.
#[inline]
pub fn pt_to_px(pt: f64, dpi: u32) -> u32 {
    (pt * dpi as f64 / POINTS_PER_INCH).round().max(0.0) as u32
}

/// A rectangle on the canvas, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmuRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl EmuRect {
    pub fn from_inches(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches_to_emu(left),
            y: inches_to_emu(top),
            width: inches_to_emu(width),
            height: inches_to_emu(height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inch_round_trip() {
        assert_eq!(inches_to_emu(1.0), 914_400);
        assert_eq!(inches_to_emu(13.333), 12_191_695);
        assert!((emu_to_inches(inches_to_emu(7.5)) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_pt_to_px() {
        assert_eq!(pt_to_px(8.0, 72), 8);
        assert_eq!(pt_to_px(8.0, 400), 44);
    }

    #[test]
    fn test_rect_from_inches() {
        let rect = EmuRect::from_inches(1.0, 0.5, 10.0, 2.0);
        assert_eq!(rect.x, 914_400);
        assert_eq!(rect.y, 457_200);
        assert_eq!(rect.width, 9_144_000);
        assert_eq!(rect.height, 1_828_800);
    }
}
