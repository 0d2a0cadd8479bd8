//! Fetching Markdown text from a URL or a local file.

use crate::{Error, Result};
use log::{debug, info};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Where the Markdown comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Absolute `http` or `https` URL
    Remote(Url),
    /// Filesystem path
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify an input string.
    ///
    /// Anything starting with `http` is treated as a URL and must parse as an
    /// absolute `http`/`https` URL; everything else is a local path.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(Error::ConfigError("Input location is empty".into()));
        }

        if !input.starts_with("http") {
            return Ok(SourceLocation::Local(PathBuf::from(input)));
        }

        let url = Url::parse(input)
            .map_err(|e| Error::ConfigError(format!("Invalid url {}: {}", input, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(SourceLocation::Remote(url)),
            other => Err(Error::ConfigError(format!("Unsupported URL scheme '{}' in {}", other, input))),
        }
    }
}

impl FromStr for SourceLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Remote(url) => write!(f, "{}", url),
            SourceLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Settings for remote fetches
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum number of redirects followed before giving up
    pub max_redirects: usize,
    /// User agent sent with remote requests
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            user_agent: format!("mdpdf/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Retrieve the Markdown text for `location`.
pub async fn fetch(location: &SourceLocation, options: &FetchOptions) -> Result<String> {
    info!("Fetching {}", location);
    match location {
        SourceLocation::Remote(url) => fetch_remote(url, options).await,
        SourceLocation::Local(path) => read_local(path).await,
    }
}

async fn fetch_remote(url: &Url, options: &FetchOptions) -> Result<String> {
    // Redirects are followed by hand so the hop count stays under our control
    let client = Client::builder()
        .redirect(Policy::none())
        .user_agent(options.user_agent.clone())
        .build()
        .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

    let mut current = url.clone();
    let mut hops = 0usize;

    loop {
        let res = client
            .get(current.clone())
            .send()
            .await
            .map_err(|e| Error::NetworkError(format!("HTTP GET {} failed: {}", current, e)))?;

        let status = res.status();
        if status.is_redirection() {
            if hops >= options.max_redirects {
                return Err(Error::TooManyRedirects {
                    url: url.to_string(),
                    limit: options.max_redirects,
                });
            }

            let location = res
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    Error::NetworkError(format!("{} from {} without a Location header", status, current))
                })?;
            let next = current
                .join(location)
                .map_err(|e| Error::NetworkError(format!("Invalid redirect target '{}': {}", location, e)))?;

            debug!("{} redirected ({}) to {}", current, status.as_u16(), next);
            current = next;
            hops += 1;
            continue;
        }

        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: current.to_string(),
                status: status.as_u16(),
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))?;
        // decoded strictly, like local files
        return String::from_utf8(body.to_vec())
            .map_err(|e| Error::NetworkError(format!("Response body from {} is not valid UTF-8: {}", current, e)));
    }
}

async fn read_local(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::file(path, e))
}
