//! Presentation container.
//!
//! A minimal PresentationML writer: slides carry an optional title text box,
//! picture shapes in placement order and one timing tree. Everything is kept in
//! memory and packaged with [`Presentation::to_bytes`] or
//! [`Presentation::save`].

mod escape;
pub mod format;
mod package;
pub mod presentation;
pub mod shape;
pub mod slide;
pub mod template;

pub use escape::escape_xml;
pub use format::ImageFormat;
pub use presentation::Presentation;
pub use shape::{PictureShape, TitleShape};
pub use slide::Slide;
