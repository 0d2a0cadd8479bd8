//! Short-lived on-disk copies of rendered documents.

use crate::markdown::{RenderedDocument, BUNDLED_STYLESHEET, BUNDLED_STYLESHEET_NAME};
use crate::{Error, Result};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir, TempPath};
use url::Url;

/// A rendered page written to a private temp directory.
///
/// Dropping the value deletes the HTML file, the bundled stylesheet (if any)
/// and the directory itself.
#[derive(Debug)]
pub struct TempDocument {
    // Field order matters: the file goes before its directory.
    html: TempPath,
    dir: TempDir,
}

impl TempDocument {
    /// Write `document` to a new uniquely named `.html` file.
    pub fn persist(document: &RenderedDocument) -> Result<Self> {
        let base = std::env::temp_dir();
        let dir = Builder::new()
            .prefix("mdpdf-")
            .tempdir()
            .map_err(|e| Error::file(&base, e))?;

        if document.needs_bundled_stylesheet() {
            let css = dir.path().join(BUNDLED_STYLESHEET_NAME);
            std::fs::write(&css, BUNDLED_STYLESHEET).map_err(|e| Error::file(&css, e))?;
        }

        let mut file = Builder::new()
            .prefix("document-")
            .suffix(".html")
            .tempfile_in(dir.path())
            .map_err(|e| Error::file(dir.path(), e))?;
        file.write_all(document.html.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| Error::file(file.path(), e))?;

        let html = file.into_temp_path();
        debug!("Wrote rendered document to {}", html.display());
        Ok(Self { html, dir })
    }

    /// Path of the HTML file
    pub fn path(&self) -> &Path {
        &self.html
    }

    /// Directory holding the HTML file and its assets
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// `file://` URL the browser should load
    pub fn url(&self) -> Result<Url> {
        let absolute: PathBuf = std::fs::canonicalize(self.path()).map_err(|e| Error::file(self.path(), e))?;
        Url::from_file_path(&absolute)
            .map_err(|_| Error::Other(format!("Cannot build a file URL for {}", absolute.display())))
    }
}
