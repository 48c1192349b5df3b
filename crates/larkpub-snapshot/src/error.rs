//! Image source errors.

use std::path::PathBuf;

use larkpub_config::Region;

/// Image source error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No source configured for the region.
    #[error("no report source configured for region {0}")]
    MissingSource(Region),

    /// Source file could not be read.
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scratch directory could not be created.
    #[error("cannot create screenshot directory")]
    TempDir(#[source] std::io::Error),

    /// Browser could not be started.
    #[error("cannot start browser {browser:?}")]
    Spawn {
        browser: String,
        #[source]
        source: std::io::Error,
    },

    /// Browser exited unsuccessfully.
    #[error("browser exited with {status}: {stderr}")]
    BrowserExit { status: String, stderr: String },

    /// Browser succeeded but wrote no screenshot.
    #[error("browser produced no screenshot at {}", .0.display())]
    NoOutput(PathBuf),

    /// Bytes do not start with a PNG signature.
    #[error("invalid PNG data")]
    InvalidPng,
}
