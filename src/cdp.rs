//! Chrome DevTools Protocol engine implementation

use crate::{EngineConfig, Error, PdfEngine, PdfOptions, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};
use serde::Deserialize;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// Reports how far the page has loaded; resource entries appear once a
// request completes, so a stable count means the network went quiet.
const LOAD_PROBE: &str = r#"
(function() {
    return JSON.stringify({
        ready_state: document.readyState,
        resources: performance.getEntriesByType('resource').length
    });
})()
"#;

#[derive(Debug, Deserialize, PartialEq)]
struct LoadProbe {
    ready_state: String,
    resources: usize,
}

/// CDP-based engine (uses the `headless_chrome` crate)
///
/// Launches a Chrome/Chromium instance, manages a single tab and prints the
/// loaded page with `Page.printToPDF`.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl PdfEngine for CdpEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let mut args: Vec<&OsStr> = Vec::new();
        if config.tagged_pdf {
            args.push(OsStr::new("--export-tagged-pdf"));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .path(config.executable.clone())
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(config.idle_browser_timeout)
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        info!(
            "Launched browser ({})",
            if config.headless { "headless" } else { "preview" }
        );

        Ok(Self { browser, tab, config })
    }

    fn load(&mut self, url: &Url) -> Result<()> {
        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        self.wait_for_network_idle()
    }

    fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        debug!("Printing {:?}", options);

        self.tab
            .print_to_pdf(Some(print_options(options)))
            .map_err(|e| Error::RenderError(format!("Page.printToPDF failed: {}", e)))
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

impl CdpEngine {
    fn probe(&self) -> Result<LoadProbe> {
        let eval = self
            .tab
            .evaluate(LOAD_PROBE, false)
            .map_err(|e| Error::LoadError(format!("Load probe failed: {}", e)))?;

        let raw = eval
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| Error::LoadError("Load probe returned no value".into()))?;

        serde_json::from_str(&raw).map_err(|e| Error::LoadError(format!("Bad load probe result: {}", e)))
    }

    /// Block until the document is complete and no resource finished loading
    /// for `network_idle_ms`.
    fn wait_for_network_idle(&self) -> Result<()> {
        let quiet = Duration::from_millis(self.config.network_idle_ms);
        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);

        let mut last = self.probe()?;
        let mut stable_since = Instant::now();

        loop {
            if last.ready_state == "complete" && stable_since.elapsed() >= quiet {
                debug!("Page settled after {} resource loads", last.resources);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(self.config.timeout_ms));
            }

            std::thread::sleep(POLL_INTERVAL);
            let current = self.probe()?;
            if current != last {
                stable_since = Instant::now();
                last = current;
            }
        }
    }
}

fn print_options(options: &PdfOptions) -> PrintToPdfOptions {
    let (paper_width, paper_height) = options.paper_size();
    let margins = &options.margins;

    PrintToPdfOptions {
        landscape: Some(options.landscape),
        print_background: Some(options.print_background),
        scale: Some(options.scale),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margins.top.to_inches()),
        margin_right: Some(margins.right.to_inches()),
        margin_bottom: Some(margins.bottom.to_inches()),
        margin_left: Some(margins.left.to_inches()),
        ..Default::default()
    }
}
