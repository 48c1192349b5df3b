//! Report publisher for Lark docx documents.
//!
//! This module provides the [`Publisher`] struct that replaces the content of a
//! document with a freshly dated report:
//!
//! 1. Acquire a tenant access token
//! 2. Clear the document root
//! 3. Insert the narrative text block at index 0
//! 4. Insert an image placeholder at index 1
//! 5. Upload the image against the placeholder
//! 6. Bind the uploaded file to the placeholder
//!
//! A failing step aborts the run. Earlier mutations are not rolled back.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use larkpub_config::{LarkConfig, Region};
//! use larkpub_docx::{DocumentRef, LarkClient, PublishConfig, Publisher};
//!
//! let client = LarkClient::from_config(&LarkConfig {
//!     base_url: "https://open.larksuite.com/open-apis".to_owned(),
//!     app_id: "cli_xxx".to_owned(),
//!     app_secret: "secret".to_owned(),
//!     timeout_secs: 30,
//! });
//! let publisher = Publisher::new(&client, PublishConfig::default());
//! let target = DocumentRef::new("doxcnXXXX", Region::Global);
//!
//! let png = std::fs::read("report.png")?;
//! let outcome = publisher.publish(&target, &png)?;
//!
//! // Or preview without mutating anything
//! let preview = publisher.dry_run(&target)?;
//! # Ok(())
//! # }
//! ```

mod date;
mod error;
mod executor;
mod result;

pub use date::report_date;
pub use error::{PublishError, PublishErrorKind, PublishStep};
pub use executor::Publisher;
pub use result::{DryRunResult, PublishOutcome};

use std::error::Error;
use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use larkpub_config::{Config, ConfigError, Region, RunConfig, TargetConfig};
use serde::Serialize;

use crate::client::RetryPolicy;
use crate::types::{TextElementStyle, TextRun};

/// Error type image sources report.
pub type SourceError = Box<dyn Error + Send + Sync>;

/// Produces the PNG published for a region.
pub trait ImageSource: Send + Sync {
    /// Render the report image for `region`.
    ///
    /// # Errors
    ///
    /// Returns the source's own error, boxed.
    fn render(&self, region: Region) -> Result<Vec<u8>, SourceError>;
}

/// Document to publish into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    pub document_id: String,
    pub region: Region,
}

impl DocumentRef {
    #[must_use]
    pub fn new(document_id: impl Into<String>, region: Region) -> Self {
        Self {
            document_id: document_id.into(),
            region,
        }
    }
}

impl From<&TargetConfig> for DocumentRef {
    fn from(target: &TargetConfig) -> Self {
        Self::new(target.document_id.clone(), target.region)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.document_id, self.region)
    }
}

/// Narrative text as styled runs with a `{date}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTemplate {
    runs: Vec<TextRun>,
}

impl ReportTemplate {
    /// Placeholder replaced by the report date.
    pub const DATE_PLACEHOLDER: &'static str = "{date}";

    #[must_use]
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// Build from `[[report.runs]]` entries.
    #[must_use]
    pub fn from_runs(runs: &[RunConfig]) -> Self {
        Self::new(
            runs.iter()
                .map(|run| {
                    TextRun::styled(
                        run.text.clone(),
                        TextElementStyle {
                            bold: run.bold,
                            italic: run.italic,
                            underline: run.underline,
                            strikethrough: run.strikethrough,
                            text_color: run.text_color,
                        },
                    )
                })
                .collect(),
        )
    }

    /// Runs with the date substituted.
    #[must_use]
    pub fn render(&self, date: &str) -> Vec<TextRun> {
        self.runs
            .iter()
            .map(|run| TextRun {
                content: run.content.replace(Self::DATE_PLACEHOLDER, date),
                style: run.style,
            })
            .collect()
    }

    /// Unstyled text with the date substituted.
    #[must_use]
    pub fn plain_text(&self, date: &str) -> String {
        self.render(date).into_iter().map(|run| run.content).collect()
    }
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self::from_runs(&larkpub_config::ReportConfig::default().runs)
    }
}

/// Configuration for publishing reports.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Retry policy for block and media calls.
    pub retry: RetryPolicy,
    /// Children listed per clear round.
    pub page_size: u32,
    /// Delete rounds allowed before a clear gives up.
    pub max_clear_rounds: u32,
    /// Offset whose calendar defines "yesterday".
    pub utc_offset: FixedOffset,
    /// File name sent with the uploaded image.
    pub image_name: String,
    /// Narrative text.
    pub template: ReportTemplate,
}

impl Default for PublishConfig {
    fn default() -> Self {
        let clear = larkpub_config::ClearConfig::default();
        let report = larkpub_config::ReportConfig::default();
        Self {
            retry: RetryPolicy::default(),
            page_size: clear.page_size,
            max_clear_rounds: clear.max_rounds,
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
            image_name: report.image_name,
            template: ReportTemplate::from_runs(&report.runs),
        }
    }
}

impl PublishConfig {
    /// Build from the `[retry]`, `[clear]` and `[report]` sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the UTC offset is invalid.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let seconds = config.report.utc_offset_seconds()?;
        let utc_offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
            ConfigError::Validation(format!(
                "report.utc_offset out of range: {}",
                config.report.utc_offset
            ))
        })?;

        Ok(Self {
            retry: RetryPolicy::from_config(&config.retry),
            page_size: config.clear.page_size,
            max_clear_rounds: config.clear.max_rounds,
            utc_offset,
            image_name: config.report.image_name.clone(),
            template: ReportTemplate::from_runs(&config.report.runs),
        })
    }
}
