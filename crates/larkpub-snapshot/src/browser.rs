//! Headless browser screenshots of HTML reports.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use larkpub_config::{Region, RendererConfig};
use larkpub_docx::{ImageSource, SourceError};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::RenderError;
use crate::png::{png_dimensions, validate_png};

const SCREENSHOT_NAME: &str = "report.png";

/// Screenshots a per-region HTML file with a headless Chromium-family browser.
///
/// Each render uses its own scratch directory, so regions can be captured
/// concurrently.
#[derive(Debug, Clone)]
pub struct BrowserSource {
    browser: String,
    window: (u32, u32),
    pages: BTreeMap<Region, PathBuf>,
}

impl BrowserSource {
    /// Create a source.
    ///
    /// # Arguments
    /// * `browser` - Executable name or path, e.g. `chromium`
    /// * `window` - Viewport `(width, height)` in pixels
    /// * `pages` - HTML report per region
    #[must_use]
    pub fn new(
        browser: impl Into<String>,
        window: (u32, u32),
        pages: BTreeMap<Region, PathBuf>,
    ) -> Self {
        Self {
            browser: browser.into(),
            window,
            pages,
        }
    }

    #[must_use]
    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(
            config.browser.clone(),
            (config.window_width, config.window_height),
            config.sources.clone(),
        )
    }

    /// Screenshot the report for `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is not configured or missing, the browser
    /// cannot be run or fails, or the screenshot is not a PNG.
    pub fn capture(&self, region: Region) -> Result<Vec<u8>, RenderError> {
        let page = self
            .pages
            .get(&region)
            .ok_or(RenderError::MissingSource(region))?;
        let page = page.canonicalize().map_err(|source| RenderError::Io {
            path: page.clone(),
            source,
        })?;

        let scratch = TempDir::new().map_err(RenderError::TempDir)?;
        let output = scratch.path().join(SCREENSHOT_NAME);

        info!(%region, page = %page.display(), browser = %self.browser, "Capturing report");

        let result = Command::new(&self.browser)
            .args(self.args(&page, scratch.path()))
            .output()
            .map_err(|source| RenderError::Spawn {
                browser: self.browser.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::BrowserExit {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_owned(),
            });
        }

        let data = std::fs::read(&output).map_err(|_| RenderError::NoOutput(output.clone()))?;
        validate_png(&data)?;

        debug!(
            %region,
            bytes = data.len(),
            dimensions = ?png_dimensions(&data),
            "Captured report"
        );
        Ok(data)
    }

    /// Browser arguments for screenshotting `page` into `scratch`.
    fn args(&self, page: &Path, scratch: &Path) -> Vec<OsString> {
        let (width, height) = self.window;

        let mut screenshot = OsString::from("--screenshot=");
        screenshot.push(scratch.join(SCREENSHOT_NAME));
        let mut profile = OsString::from("--user-data-dir=");
        profile.push(scratch.join("profile"));
        let mut url = OsString::from("file://");
        url.push(page);

        vec![
            "--headless".into(),
            "--disable-gpu".into(),
            "--no-sandbox".into(),
            "--hide-scrollbars".into(),
            format!("--window-size={width},{height}").into(),
            profile,
            screenshot,
            url,
        ]
    }
}

impl ImageSource for BrowserSource {
    fn render(&self, region: Region) -> Result<Vec<u8>, SourceError> {
        Ok(self.capture(region)?)
    }
}
