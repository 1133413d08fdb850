//! Error types for deck conversion.
//!
//! [`Error`] is the crate-wide error. The two narrower enums describe the
//! failures the conversion deliberately survives: [`RenderFailure`] for a single
//! typesetting call or block, and [`TimingError`] for a rejected timing event.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for beamer-reveal operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML writing or re-reading error
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Rendering failure that escaped the per-block skip policy
    #[error("Render failure: {0}")]
    Render(#[from] RenderFailure),

    /// Timing tree rejected an event
    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Failure of one typesetting call, or of a whole block.
///
/// None of these abort a conversion: a failed step is dropped, and a block whose
/// steps all failed is left off its slide.
#[derive(Error, Debug)]
pub enum RenderFailure {
    /// The external program could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program did not finish in time and was killed
    #[error("`{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// The compiler ran but produced no usable document
    #[error("`{program}` exited with {status}: {log_tail}")]
    CompileFailed {
        program: String,
        status: String,
        log_tail: String,
    },

    /// An expected output file was not written
    #[error("expected output {} was not produced", path.display())]
    MissingOutput { path: PathBuf },

    /// The rasterised page could not be read
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    /// The page contained no ink to crop to
    #[error("rendered page is blank")]
    BlankPage,

    /// The fragment was empty after sanitising
    #[error("fragment is empty after sanitizing")]
    EmptyFragment,

    /// The block is drawn by a static path and has no reveal steps
    #[error("{0} blocks have no reveal steps")]
    StaticBlock(&'static str),

    /// Every step of a block failed
    #[error("all {attempted} reveal steps failed")]
    AllStepsFailed { attempted: usize },

    /// The backend does not implement the requested operation
    #[error("unsupported backend operation: {0}")]
    Unsupported(&'static str),

    /// Scratch file handling failed
    #[error("scratch IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A timing event the tree refused to apply.
///
/// The tree is left exactly as it was when one of these is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    /// `disappear` named a click that no `appear` has created
    #[error("no click node exists for click index {click_index}")]
    NoClickNode { click_index: usize },

    /// `appear` skipped ahead or went backwards past existing clicks
    #[error("click index {requested} is out of order (next index is {next})")]
    ClickOutOfOrder { next: usize, requested: usize },
}
