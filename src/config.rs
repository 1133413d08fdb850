//! Configuration types for deck conversion.
//!
//! [`Options`] carries everything a user may tune (resolution, canvas size,
//! scaling floor, external tools). [`CanvasGeometry`] holds the fixed slide
//! geometry that layout is computed against. Both can be read from YAML.
//!
//! # Examples
//!
//! ```rust
//! use beamer_reveal::config::Options;
//!
//! let options = Options::new()
//!     .with_resolution(300)
//!     .with_min_scale(0.6)
//!     .with_jobs(Some(4));
//! assert_eq!(options.resolution, 300);
//! ```
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Slide canvas size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    /// 16:9 widescreen.
    fn default() -> Self {
        Self {
            width: 13.333,
            height: 7.5,
        }
    }
}

/// Fixed slide geometry, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasGeometry {
    /// First content row on slides that carry a title
    pub titled_top: f64,
    /// First content row on slides without a title
    pub untitled_top: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    /// Content width before any overflow-driven scaling
    pub content_width: f64,
    pub title_left: f64,
    pub title_top: f64,
    pub title_width: f64,
    pub title_height: f64,
    /// Title font size in points
    pub title_font_size: f64,
    /// Gap after a text block
    pub text_spacing: f64,
    /// Gap after math and list blocks
    pub block_spacing: f64,
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self {
            titled_top: 1.2,
            untitled_top: 0.5,
            bottom_margin: 0.3,
            left_margin: 1.0,
            content_width: 10.0,
            title_left: 1.0,
            title_top: 0.3,
            title_width: 11.333,
            title_height: 0.8,
            title_font_size: 32.0,
            text_spacing: 0.15,
            block_spacing: 0.2,
        }
    }
}

impl CanvasGeometry {
    /// Top offset of the content area.
    #[inline]
    pub fn top_offset(&self, has_title: bool) -> f64 {
        if has_title {
            self.titled_top
        } else {
            self.untitled_top
        }
    }
}

/// Typesetting style shared by every fragment of a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Document class font size, e.g. `11pt`
    pub font_size: String,
    /// Paper width of the standalone page; held constant so every step of a
    /// deck scales identically
    pub text_width: String,
    /// RGB triple (0..1) used for bullets and enumeration labels
    pub accent_color: String,
    /// Margin kept around the ink extent when cropping, in points
    pub crop_margin_pt: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            font_size: "11pt".to_string(),
            text_width: "12cm".to_string(),
            accent_color: "0.2,0.2,0.6".to_string(),
            crop_margin_pt: 8.0,
        }
    }
}

/// Options for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Render resolution in DPI
    pub resolution: u32,
    pub canvas: CanvasSize,
    pub geometry: CanvasGeometry,
    /// Lower clamp for the overflow shrink factor
    pub min_scale: f64,
    /// Per-call limit for each external program, in seconds
    pub timeout_secs: u64,
    /// Worker threads for block rendering; `None` uses the rayon default
    pub jobs: Option<usize>,
    /// TeX engine producing a PDF from a standalone document
    pub compiler: String,
    /// PDF rasterizer (poppler's `pdftoppm` command line)
    pub rasterizer: String,
    pub style: RenderStyle,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resolution: 400,
            canvas: CanvasSize::default(),
            geometry: CanvasGeometry::default(),
            min_scale: 0.5,
            timeout_secs: 30,
            jobs: None,
            compiler: "pdflatex".to_string(),
            rasterizer: "pdftoppm".to_string(),
            style: RenderStyle::default(),
        }
    }
}

impl Options {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render resolution in DPI.
    #[inline]
    pub fn with_resolution(mut self, dpi: u32) -> Self {
        self.resolution = dpi;
        self
    }

    /// Set the canvas size in inches.
    #[inline]
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas = CanvasSize { width, height };
        self
    }

    /// Set the lower clamp for overflow scaling.
    #[inline]
    pub fn with_min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = min_scale;
        self
    }

    /// Set the worker pool size.
    #[inline]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the per-call timeout for external programs.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse options from YAML. Missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Options = serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid YAML configuration: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Serialize the options as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("failed to serialize configuration: {}", e)))
    }

    /// Reject values layout and rendering cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::Config("resolution must be non-zero".to_string()));
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(Error::Config("canvas size must be positive".to_string()));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(Error::Config(format!(
                "min_scale must be in (0, 1], got {}",
                self.min_scale
            )));
        }
        if self.geometry.content_width <= 0.0 {
            return Err(Error::Config("content width must be positive".to_string()));
        }
        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.resolution, 400);
        assert_eq!(options.canvas.width, 13.333);
        assert_eq!(options.canvas.height, 7.5);
        assert_eq!(options.min_scale, 0.5);
        assert_eq!(options.timeout(), Duration::from_secs(30));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_top_offset() {
        let geometry = CanvasGeometry::default();
        assert_eq!(geometry.top_offset(true), 1.2);
        assert_eq!(geometry.top_offset(false), 0.5);
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = "resolution: 150\nmin_scale: 0.75\ncanvas:\n  width: 10.0\n";
        let options = Options::from_yaml_str(yaml).unwrap();
        assert_eq!(options.resolution, 150);
        assert_eq!(options.min_scale, 0.75);
        assert_eq!(options.canvas.width, 10.0);
        // Unspecified fields keep their defaults
        assert_eq!(options.canvas.height, 7.5);
        assert_eq!(options.compiler, "pdflatex");
    }

    #[test]
    fn test_yaml_rejects_bad_scale() {
        let err = Options::from_yaml_str("min_scale: 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_yaml_rejects_zero_timeout() {
        let err = Options::from_yaml_str("timeout_secs: 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let options = Options {
            timeout_secs: 0,
            ..Options::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let options = Options::new()
            .with_resolution(150)
            .with_canvas(10.0, 7.5)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(options.resolution, 150);
        assert_eq!(options.canvas.width, 10.0);
        assert_eq!(options.timeout_secs, 5);
    }
}
