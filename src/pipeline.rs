//! The fetch -> render -> persist -> print pipeline.

use crate::async_api::Browser;
use crate::markdown::{MarkdownOptions, MarkdownRenderer};
use crate::source::{fetch, FetchOptions, SourceLocation};
use crate::store::TempDocument;
use crate::{EngineConfig, Error, PdfEngine, PdfOptions, Result};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Everything needed for one conversion
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub source: SourceLocation,
    /// Layout options and output path
    pub pdf: PdfOptions,
    /// Show the page in a visible browser instead of exporting a PDF
    pub preview: bool,
    pub fetch: FetchOptions,
    pub markdown: MarkdownOptions,
    pub engine: EngineConfig,
}

impl Default for ConvertRequest {
    fn default() -> Self {
        Self {
            source: SourceLocation::Local(PathBuf::from("README.md")),
            pdf: PdfOptions::default(),
            preview: false,
            fetch: FetchOptions::default(),
            markdown: MarkdownOptions::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Outcome of a successful conversion
#[derive(Debug)]
pub enum Conversion {
    /// A PDF was written
    Written { path: PathBuf, bytes: usize },
    /// The page is open in a visible browser; nothing was exported
    Preview(PreviewSession),
}

/// A visible browser showing the rendered page.
///
/// The temp document stays on disk for as long as the session lives so the
/// page can be reloaded. Dropping the session releases both.
pub struct PreviewSession {
    browser: Browser,
    document: TempDocument,
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("document", &self.document.path())
            .finish_non_exhaustive()
    }
}

/// How the wait in [`PreviewSession::close_after_line`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewExit {
    /// A line was read
    Confirmed,
    /// The input reached end of file without a line, e.g. stdin is not a terminal
    EndOfInput,
    /// Reading the input failed
    ReadFailed,
}

impl PreviewSession {
    /// Path of the HTML file being shown
    pub fn document(&self) -> &Path {
        self.document.path()
    }

    /// Close the browser and delete the temp document.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }

    /// Wait for one line on `input`, then close the session.
    ///
    /// The read runs on a blocking thread. End of input and read errors are
    /// logged and still close the session.
    pub async fn close_after_line<R>(self, mut input: R) -> Result<PreviewExit>
    where
        R: BufRead + Send + 'static,
    {
        let read = tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            input.read_line(&mut line)
        })
        .await;

        let exit = match read {
            Ok(Ok(0)) => {
                warn!("Input ended before a line was entered; closing the preview");
                PreviewExit::EndOfInput
            }
            Ok(Ok(_)) => PreviewExit::Confirmed,
            Ok(Err(e)) => {
                warn!("Failed to read input ({}); closing the preview", e);
                PreviewExit::ReadFailed
            }
            Err(e) => {
                warn!("Input reader stopped ({}); closing the preview", e);
                PreviewExit::ReadFailed
            }
        };

        self.close().await?;
        Ok(exit)
    }
}

/// Convert with the Chrome DevTools Protocol backend.
#[cfg(feature = "cdp")]
pub async fn convert(request: ConvertRequest) -> Result<Conversion> {
    convert_with(request, crate::cdp::CdpEngine::new).await
}

/// Run the pipeline with a caller-supplied engine constructor.
///
/// Stages run strictly in order. Fetch, render and persist complete before
/// the engine is launched, so input errors never start a browser. Once
/// launched, the browser is closed on every exit path except preview, where
/// ownership moves into the returned [`PreviewSession`].
pub async fn convert_with<E, F>(request: ConvertRequest, launcher: F) -> Result<Conversion>
where
    E: PdfEngine + 'static,
    F: FnOnce(EngineConfig) -> Result<E> + Send + 'static,
{
    request.pdf.validate()?;

    let markdown = fetch(&request.source, &request.fetch).await?;

    let renderer = MarkdownRenderer::new(request.markdown.clone());
    let document = renderer.render_document(&markdown);
    let (stored, url) = blocking(move || {
        let stored = TempDocument::persist(&document)?;
        let url = stored.url()?;
        Ok((stored, url))
    })
    .await?;

    let engine_config = EngineConfig {
        headless: request.engine.headless && !request.preview,
        ..request.engine.clone()
    };
    let browser = Browser::launch(engine_config, launcher).await?;

    info!("Loading {}", url);
    if let Err(err) = browser.load(&url).await {
        return Err(close_after_failure(browser, err).await);
    }

    if request.preview {
        info!("Preview open for {}", request.source);
        return Ok(Conversion::Preview(PreviewSession { browser, document: stored }));
    }

    let result = export(&browser, &request.pdf).await;
    match result {
        Ok(bytes) => {
            browser.close().await?;
            info!("Wrote {} bytes to {}", bytes, request.pdf.path.display());
            Ok(Conversion::Written { path: request.pdf.path.clone(), bytes })
        }
        Err(err) => Err(close_after_failure(browser, err).await),
    }
}

async fn export(browser: &Browser, options: &PdfOptions) -> Result<usize> {
    let pdf = browser.print_to_pdf(options).await?;
    let bytes = pdf.len();
    let path = options.path.clone();
    blocking(move || write_pdf(&path, &pdf)).await?;
    Ok(bytes)
}

/// Run synchronous filesystem work on the blocking thread pool.
async fn blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Other(format!("Blocking task failed: {}", e)))?
}

async fn close_after_failure(browser: Browser, err: Error) -> Error {
    if let Err(close_err) = browser.close().await {
        warn!("Failed to close browser after error: {}", close_err);
    }
    err
}

/// Write the PDF, reporting an unopenable destination separately.
///
/// A failure after the file was opened removes the partial file so no
/// truncated PDF is left behind.
pub fn write_pdf(path: &Path, pdf: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|source| Error::DestinationUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    if let Err(e) = file.write_all(pdf).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = std::fs::remove_file(path);
        return Err(Error::file(path, e));
    }
    Ok(())
}
