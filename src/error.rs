//! Error types for the Markdown to PDF pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a document
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration (missing input/output, bad option values)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error while fetching a remote document
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The remote server answered with a non-success status
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The redirect chain was longer than the configured limit
    #[error("Too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects { url: String, limit: usize },

    /// A local file could not be read or written
    #[error("{}: {source}", path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to launch the browser engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load the rendered document in the browser
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// PDF export failed
    #[error("PDF export failed: {0}")]
    RenderError(String),

    /// The output file could not be opened for writing
    #[error("Could not open \"{}\". Is it open in another program?", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the page to settle took too long
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid settings, detected before any I/O
    Config,
    /// Network failure or non-success HTTP status
    Transport,
    /// Unreadable input, unwritable temp file or output
    Filesystem,
    /// Browser launch, page load or PDF export failure
    Rendering,
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileError { path: path.into(), source }
    }

    /// Category of this error, `None` for [`Error::Other`]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::ConfigError(_) => Some(ErrorCategory::Config),
            Error::NetworkError(_) | Error::HttpStatus { .. } | Error::TooManyRedirects { .. } => {
                Some(ErrorCategory::Transport)
            }
            Error::FileError { .. } => Some(ErrorCategory::Filesystem),
            Error::InitializationError(_)
            | Error::LoadError(_)
            | Error::RenderError(_)
            | Error::DestinationUnavailable { .. }
            | Error::Timeout(_) => Some(ErrorCategory::Rendering),
            Error::Other(_) => None,
        }
    }

    /// Process exit code for this error
    ///
    /// `DestinationUnavailable` gets its own code so scripts can tell a locked
    /// output file apart from other rendering failures.
    pub fn exit_code(&self) -> u8 {
        if let Error::DestinationUnavailable { .. } = self {
            return 6;
        }
        match self.category() {
            Some(ErrorCategory::Config) => 2,
            Some(ErrorCategory::Transport) => 3,
            Some(ErrorCategory::Filesystem) => 4,
            Some(ErrorCategory::Rendering) => 5,
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn exit_codes_follow_categories() {
        assert_eq!(Error::ConfigError("x".into()).exit_code(), 2);
        assert_eq!(Error::NetworkError("x".into()).exit_code(), 3);
        assert_eq!(
            Error::HttpStatus { url: "http://a".into(), status: 404 }.exit_code(),
            3
        );
        assert_eq!(
            Error::file("a.md", io::Error::from(io::ErrorKind::NotFound)).exit_code(),
            4
        );
        assert_eq!(Error::LoadError("x".into()).exit_code(), 5);
        assert_eq!(Error::Other("x".into()).exit_code(), 1);
    }

    #[test]
    fn browser_stage_errors_are_rendering_failures() {
        for err in [
            Error::InitializationError("no chrome".into()),
            Error::LoadError("navigation".into()),
            Error::Timeout(30_000),
            Error::RenderError("printToPDF".into()),
        ] {
            assert_eq!(err.category(), Some(ErrorCategory::Rendering), "{}", err);
            assert_eq!(err.exit_code(), 5);
        }
    }

    #[test]
    fn destination_unavailable_is_distinct() {
        let err = Error::DestinationUnavailable {
            path: PathBuf::from("out.pdf"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.category(), Some(ErrorCategory::Rendering));
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("Is it open in another program?"));
    }
}
