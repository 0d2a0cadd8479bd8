//! Command-line configuration.
//!
//! [`Args`] is the clap surface of the `mdpdf` binary. Turning it into a
//! [`ConvertRequest`] is a pure step so every configuration error is reported
//! before the pipeline touches the network or the filesystem.

use crate::markdown::{MarkdownOptions, Stylesheet};
use crate::options::{Length, Margins, PaperFormat, PdfOptions};
use crate::pipeline::ConvertRequest;
use crate::source::{FetchOptions, SourceLocation};
use crate::{EngineConfig, Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when only the output path is given
pub const INPUT_ENV: &str = "MDPDF_INPUT";

/// Convert a Markdown file to a PDF file with GitHub styling.
#[derive(Debug, Parser)]
#[command(name = "mdpdf", version, about)]
pub struct Args {
    /// `<INPUT> <OUTPUT>`, or just `<OUTPUT>` with the input taken from $MDPDF_INPUT.
    /// INPUT is a path or an http(s) URL of a Markdown file.
    #[arg(value_name = "PATHS", required = true, num_args = 1..=2)]
    pub paths: Vec<String>,

    /// Scale of the webpage rendering, between 0.1 and 2
    #[arg(long, default_value_t = 0.8)]
    pub scale: f64,

    /// Get a look at the document instead of rendering it as a PDF
    #[arg(long)]
    pub preview: bool,

    /// Paper format
    #[arg(long, value_enum, default_value_t = PaperFormat::Letter)]
    pub format: PaperFormat,

    /// Print in landscape orientation
    #[arg(long)]
    pub landscape: bool,

    /// Do not print background colors and images
    #[arg(long)]
    pub no_background: bool,

    #[arg(long, default_value = "0.25in")]
    pub margin_top: String,

    #[arg(long, default_value = "0.5in")]
    pub margin_right: String,

    #[arg(long, default_value = "0.25in")]
    pub margin_bottom: String,

    #[arg(long, default_value = "0.5in")]
    pub margin_left: String,

    /// Title of the generated HTML document
    #[arg(long, default_value = "Document")]
    pub title: String,

    /// Stylesheet path or URL replacing the bundled GitHub style
    #[arg(long, value_name = "PATH|URL")]
    pub stylesheet: Option<String>,

    /// Subresource integrity hash for a remote --stylesheet
    #[arg(long, value_name = "HASH", requires = "stylesheet")]
    pub stylesheet_integrity: Option<String>,

    /// Maximum number of HTTP redirects to follow
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,

    /// Chrome/Chromium executable to launch
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Disable the browser sandbox (needed in some containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Page load timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 30_000)]
    pub timeout: u64,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter implied by `--verbose`/`--quiet`
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Resolve the arguments into a request.
    ///
    /// `env_input` is the value of [`INPUT_ENV`], used when only one
    /// positional path is given.
    pub fn into_request(self, env_input: Option<String>) -> Result<ConvertRequest> {
        let mut paths = self.paths.into_iter();
        let (input, output) = match (paths.next(), paths.next()) {
            (Some(input), Some(output)) => (input, output),
            (Some(output), None) => {
                let input = env_input.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
                    Error::ConfigError(format!(
                        "No input given: pass <INPUT> <OUTPUT> or set {}",
                        INPUT_ENV
                    ))
                })?;
                (input, output)
            }
            _ => return Err(Error::ConfigError("Missing output path".into())),
        };

        let source = SourceLocation::parse(&input)?;
        let path = std::path::absolute(&output)
            .map_err(|e| Error::ConfigError(format!("Invalid output path '{}': {}", output, e)))?;

        let margins = Margins {
            top: parse_length("margin-top", &self.margin_top)?,
            right: parse_length("margin-right", &self.margin_right)?,
            bottom: parse_length("margin-bottom", &self.margin_bottom)?,
            left: parse_length("margin-left", &self.margin_left)?,
        };

        let pdf = PdfOptions {
            path,
            format: self.format,
            scale: self.scale,
            print_background: !self.no_background,
            landscape: self.landscape,
            margins,
        };
        pdf.validate()?;

        let stylesheet = match self.stylesheet {
            Some(location) => Stylesheet::from_location(&location, self.stylesheet_integrity)?,
            None => Stylesheet::Bundled,
        };

        let engine = EngineConfig {
            executable: self.chrome,
            sandbox: !self.no_sandbox,
            timeout_ms: self.timeout,
            // a preview window may sit idle for as long as the user reads it
            idle_browser_timeout: if self.preview {
                Duration::from_secs(24 * 60 * 60)
            } else {
                EngineConfig::default().idle_browser_timeout
            },
            ..Default::default()
        };

        Ok(ConvertRequest {
            source,
            pdf,
            preview: self.preview,
            fetch: FetchOptions {
                max_redirects: self.max_redirects,
                ..Default::default()
            },
            markdown: MarkdownOptions {
                title: self.title,
                stylesheet,
                ..Default::default()
            },
            engine,
        })
    }
}

fn parse_length(name: &str, value: &str) -> Result<Length> {
    value
        .parse()
        .map_err(|e: Error| Error::ConfigError(format!("--{}: {}", name, e)))
}
