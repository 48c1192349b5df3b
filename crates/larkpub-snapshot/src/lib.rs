//! Report image sources.
//!
//! Implements [`larkpub_docx::ImageSource`] two ways:
//! - [`BrowserSource`] screenshots a per-region HTML report with a headless browser
//! - [`FileSource`] reads pre-rendered PNG files
//!
//! Every image is checked for a PNG signature before it is handed out.

mod browser;
mod error;
mod file;
mod png;

pub use browser::BrowserSource;
pub use error::RenderError;
pub use file::FileSource;
pub use png::{png_dimensions, validate_png};

use larkpub_config::{RendererConfig, RendererKind};
use larkpub_docx::ImageSource;

/// Build the image source described by `[renderer]`.
#[must_use]
pub fn source_from_config(config: &RendererConfig) -> Box<dyn ImageSource> {
    match config.kind {
        RendererKind::Browser => Box::new(BrowserSource::from_config(config)),
        RendererKind::File => Box::new(FileSource::new(config.sources.clone())),
    }
}
