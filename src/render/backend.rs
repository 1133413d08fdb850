//! Typesetting backends.
//!
//! A backend turns a complete standalone document into a page bitmap. The
//! production backend shells out to a TeX engine and a PDF rasterizer; every
//! call gets its own scratch directory and a bounded run time.
use crate::error::RenderFailure;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Turns markup into page bitmaps.
///
/// Implementations must be callable from several worker threads at once and
/// keep no state between calls beyond scratch files.
pub trait TypesettingBackend: Send + Sync {
    /// Typeset a standalone one-page document and return the first page at
    /// `resolution` DPI.
    fn compile_fragment(&self, document: &str, resolution: u32) -> Result<RgbImage, RenderFailure>;

    /// Compile a whole source file, returning the produced PDF.
    ///
    /// Used for frames drawn statically from the original deck.
    fn compile_document(&self, _source: &Path, _workdir: &Path) -> Result<PathBuf, RenderFailure> {
        Err(RenderFailure::Unsupported("compile_document"))
    }

    /// Rasterize one page (1-based) of a PDF.
    fn rasterize_page(
        &self,
        _pdf: &Path,
        _page: usize,
        _resolution: u32,
    ) -> Result<RgbImage, RenderFailure> {
        Err(RenderFailure::Unsupported("rasterize_page"))
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const LOG_TAIL_LINES: usize = 8;

/// Run `command` to completion, killing it once `timeout` has elapsed.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<ExitStatus, RenderFailure> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| RenderFailure::Spawn {
            program: program.clone(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderFailure::Timeout { program, timeout });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Last lines of a TeX log, for error messages.
fn log_tail(log: &Path) -> String {
    let Ok(text) = std::fs::read_to_string(log) else {
        return String::from("(no log)");
    };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join(" | ")
}

/// Backend driving `pdflatex` (or a compatible engine) and `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdfLatexBackend {
    compiler: String,
    rasterizer: String,
    timeout: Duration,
}

impl PdfLatexBackend {
    pub fn new(compiler: impl Into<String>, rasterizer: impl Into<String>, timeout: Duration) -> Self {
        Self {
            compiler: compiler.into(),
            rasterizer: rasterizer.into(),
            timeout,
        }
    }

    /// Build a backend from conversion options.
    pub fn from_options(options: &crate::config::Options) -> Self {
        Self::new(&options.compiler, &options.rasterizer, options.timeout())
    }

    /// Whether both external programs can be started.
    pub fn is_available(&self) -> bool {
        [&self.compiler, &self.rasterizer].iter().all(|program| {
            Command::new(program)
                .arg("-v")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok()
        })
    }

    /// Run the TeX engine on `tex` inside `workdir`; returns the PDF path.
    fn run_compiler(&self, tex: &Path, workdir: &Path, timeout: Duration) -> Result<PathBuf, RenderFailure> {
        let mut command = Command::new(&self.compiler);
        command
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(workdir)
            .arg(tex)
            .current_dir(workdir);
        let status = run_with_timeout(command, timeout)?;

        // nonstopmode may report errors yet still produce a usable page
        let pdf = tex.with_extension("pdf");
        if pdf.exists() {
            return Ok(pdf);
        }
        Err(RenderFailure::CompileFailed {
            program: self.compiler.clone(),
            status: status.to_string(),
            log_tail: log_tail(&tex.with_extension("log")),
        })
    }
}

impl TypesettingBackend for PdfLatexBackend {
    fn compile_fragment(&self, document: &str, resolution: u32) -> Result<RgbImage, RenderFailure> {
        let scratch = tempfile::Builder::new().prefix("beamer-reveal-").tempdir()?;
        let tex = scratch.path().join("content.tex");
        std::fs::write(&tex, document)?;

        let pdf = self.run_compiler(&tex, scratch.path(), self.timeout)?;
        self.rasterize_page(&pdf, 1, resolution)
    }

    fn compile_document(&self, source: &Path, workdir: &Path) -> Result<PathBuf, RenderFailure> {
        std::fs::create_dir_all(workdir)?;
        let name = source
            .file_name()
            .ok_or_else(|| RenderFailure::MissingOutput { path: source.to_path_buf() })?;
        let tex = workdir.join(name);
        std::fs::copy(source, &tex)?;

        // Two passes so navigation and references settle; full decks get a
        // longer budget than single fragments.
        let timeout = self.timeout * 4;
        self.run_compiler(&tex, workdir, timeout)?;
        self.run_compiler(&tex, workdir, timeout)
    }

    fn rasterize_page(&self, pdf: &Path, page: usize, resolution: u32) -> Result<RgbImage, RenderFailure> {
        let out_dir = tempfile::Builder::new().prefix("beamer-reveal-page-").tempdir()?;
        let prefix = out_dir.path().join("page");
        let page = page.to_string();

        let mut command = Command::new(&self.rasterizer);
        command
            .arg("-r")
            .arg(resolution.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix);
        let status = run_with_timeout(command, self.timeout)?;

        let png = prefix.with_extension("png");
        if !png.exists() {
            return Err(RenderFailure::CompileFailed {
                program: self.rasterizer.clone(),
                status: status.to_string(),
                log_tail: String::from("no page written"),
            });
        }
        let page = image::open(&png).map_err(|e| RenderFailure::Rasterize(e.to_string()))?;
        Ok(page.to_rgb8())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process backend for tests.
    use super::*;
    use image::Rgb;
    use parking_lot::Mutex;

    pub(crate) const PAGE_WIDTH: u32 = 600;
    pub(crate) const PAGE_HEIGHT: u32 = 2000;
    pub(crate) const LINE_HEIGHT: u32 = 30;
    pub(crate) const TOP_INK: u32 = 100;

    /// Draws one black band per body line of the document, so cumulative
    /// fragments produce strictly taller pages.
    #[derive(Debug, Default)]
    pub(crate) struct FakeBackend {
        fail_marker: Option<String>,
        pub(crate) documents: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Fail every document containing `marker`.
        pub(crate) fn failing_on(marker: &str) -> Self {
            Self {
                fail_marker: Some(marker.to_string()),
                documents: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.documents.lock().len()
        }

        pub(crate) fn body_lines(document: &str) -> u32 {
            let body = document
                .split("\\pagestyle{empty}")
                .nth(1)
                .unwrap_or(document)
                .split("\\end{document}")
                .next()
                .unwrap_or_default();
            body.lines().filter(|l| !l.trim().is_empty()).count() as u32
        }
    }

    impl TypesettingBackend for FakeBackend {
        fn compile_fragment(&self, document: &str, _resolution: u32) -> Result<RgbImage, RenderFailure> {
            self.documents.lock().push(document.to_string());
            if let Some(marker) = &self.fail_marker
                && document.contains(marker.as_str())
            {
                return Err(RenderFailure::CompileFailed {
                    program: "fake".to_string(),
                    status: "exit status: 1".to_string(),
                    log_tail: "! Undefined control sequence.".to_string(),
                });
            }

            let lines = Self::body_lines(document).max(1);
            let bottom = (TOP_INK + lines * LINE_HEIGHT).min(PAGE_HEIGHT);
            Ok(RgbImage::from_fn(PAGE_WIDTH, PAGE_HEIGHT, |x, y| {
                if (TOP_INK..bottom).contains(&y) && x % 7 == 0 {
                    Rgb([0, 0, 0])
                } else {
                    Rgb([255, 255, 255])
                }
            }))
        }

        fn compile_document(&self, source: &Path, workdir: &Path) -> Result<PathBuf, RenderFailure> {
            std::fs::create_dir_all(workdir)?;
            let pdf = workdir.join(source.with_extension("pdf").file_name().unwrap_or_default());
            std::fs::write(&pdf, b"%PDF-1.5 fake")?;
            Ok(pdf)
        }

        fn rasterize_page(&self, _pdf: &Path, page: usize, _resolution: u32) -> Result<RgbImage, RenderFailure> {
            let shade = (page as u8).wrapping_mul(40);
            Ok(RgbImage::from_pixel(160, 90, Rgb([shade, shade, shade])))
        }
    }
}
