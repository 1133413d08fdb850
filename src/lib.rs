//! beamer-reveal - convert Beamer slide decks into PowerPoint presentations
//!
//! Every itemize, enumerate, multi-line math and text block of a frame is
//! typeset once per reveal step (first item, first two items, ...), cropped to
//! its ink and placed on the slide as a picture. All steps of a block share
//! one box; a click-driven timing tree shows the next step and hides the
//! previous one on the same click, so the audience sees the block grow.
//!
//! # Features
//!
//! - **Beamer scanning**: frames, titles and content blocks from the source
//! - **Block rendering**: cumulative reveal steps through `pdflatex` and `pdftoppm`
//! - **Layout**: uniform shrink-to-fit and top-to-bottom stacking
//! - **Timing**: appear/disappear effects serialised as PresentationML `p:timing`
//! - **PPTX writing**: a minimal, self-contained presentation package
//!
//! # Example
//!
//! ```no_run
//! use beamer_reveal::{Converter, Options};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(Options::default().with_resolution(300))?;
//! let report = converter.convert_file("talk.tex".as_ref(), None)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! Building a slide by hand:
//!
//! ```
//! use beamer_reveal::Presentation;
//! use beamer_reveal::units::EmuRect;
//!
//! let mut pres = Presentation::widescreen();
//! let slide = pres.add_slide();
//! let title = slide.add_title("Overview", EmuRect::from_inches(1.0, 0.3, 11.333, 0.8), 32.0);
//! slide.timing_mut().appear(title, 0).unwrap();
//! assert_eq!(slide.click_count(), 1);
//! ```

pub mod assemble;
pub mod config;
pub mod convert;
pub mod deck;
pub mod error;
pub mod layout;
pub mod pptx;
pub mod render;
pub mod timing;
pub mod units;

pub use assemble::{SlideAssembler, SlideSummary, sequence_clicks};
pub use config::Options;
pub use convert::{ConversionReport, Converter};
pub use deck::{BlockKind, ContentBlock, Deck, Frame, parse_beamer};
pub use error::{Error, RenderFailure, Result, TimingError};
pub use layout::{InchRect, LayoutEngine, PlacedBlock};
pub use pptx::{Presentation, Slide};
pub use render::{BlockRenderer, PdfLatexBackend, RenderedBlock, RenderedStep, TypesettingBackend};
pub use timing::{AnimationEvent, EffectKind, TimingTree};
