//! mdpdf
//!
//! Converts a Markdown document, fetched from a URL or read from disk, into a
//! GitHub-styled PDF by rendering it in a headless browser.
//!
//! The conversion is a strictly sequential pipeline:
//!
//! 1. [`source::fetch`] retrieves the Markdown text
//! 2. [`markdown::MarkdownRenderer`] renders it into a fixed HTML page shell
//! 3. [`store::TempDocument`] writes the page to a temporary `.html` file
//! 4. a [`PdfEngine`] loads the page and prints it to PDF
//!
//! # Example
//!
//! ```no_run
//! use mdpdf::{ConvertRequest, PdfOptions, SourceLocation};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ConvertRequest {
//!     source: SourceLocation::parse("README.md")?,
//!     pdf: PdfOptions {
//!         path: "README.pdf".into(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! mdpdf::convert(request).await?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, ErrorCategory, Result};

pub mod config;
pub mod markdown;
pub mod options;
pub mod pipeline;
pub mod source;
pub mod store;

// Async facade running an engine on its own thread
pub mod async_api;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use async_api::Browser;
pub use markdown::{MarkdownOptions, MarkdownRenderer, RenderedDocument, Stylesheet};
pub use options::{Length, LengthUnit, Margins, PaperFormat, PdfOptions};
pub use pipeline::{convert_with, Conversion, ConvertRequest, PreviewExit, PreviewSession};
pub use source::{fetch, FetchOptions, SourceLocation};
pub use store::TempDocument;

#[cfg(feature = "cdp")]
pub use pipeline::convert;

/// Browser launch configuration
///
/// Defaults launch a sandboxed headless browser that exports tagged PDFs and
/// gives pages 30 seconds to settle.
///
/// # Examples
///
/// ```
/// let cfg = mdpdf::EngineConfig::default();
/// assert!(cfg.headless);
/// assert_eq!(cfg.timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Browser executable; `None` lets the backend search for one
    pub executable: Option<PathBuf>,
    /// Keep the browser sandbox enabled (disable inside some containers)
    pub sandbox: bool,
    /// Window dimensions
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// How long resource loading must stay quiet before the page counts as settled
    pub network_idle_ms: u64,
    /// How long the browser may go without protocol events before it is shut down
    pub idle_browser_timeout: Duration,
    /// Ask the browser to export a tagged (accessible) PDF
    pub tagged_pdf: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            sandbox: true,
            viewport: Viewport::default(),
            timeout_ms: 30_000,
            network_idle_ms: 500,
            idle_browser_timeout: Duration::from_secs(300),
            tagged_pdf: true,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Core trait for browser engines that turn an HTML page into a PDF
///
/// Engines are driven from a single thread and need not be `Send`; see
/// [`async_api::Browser`] for the async wrapper used by the pipeline.
pub trait PdfEngine {
    /// Launch a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait until the page has settled
    fn load(&mut self, url: &url::Url) -> Result<()>;

    /// Print the loaded page and return the PDF bytes
    fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Close the engine and release the browser process
    fn close(self) -> Result<()>;
}
