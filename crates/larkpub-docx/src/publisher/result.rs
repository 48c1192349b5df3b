//! Result types for publish operations.

use larkpub_config::Region;
use serde::Serialize;

use crate::clear::ClearReport;

/// Result of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// Document that was rewritten.
    pub document_id: String,
    /// Report region.
    pub region: Region,
    /// Date written into the narrative, `YYYY.MM.DD`.
    pub report_date: String,
    /// What the clear step removed.
    pub cleared: ClearReport,
    /// New narrative text block.
    pub text_block_id: String,
    /// New image block.
    pub image_block_id: String,
    /// Drive token bound to the image block.
    pub file_token: String,
    /// Size of the uploaded image.
    pub image_bytes: usize,
}

/// Result of a dry-run publish (no changes made).
#[derive(Debug, Clone, Serialize)]
pub struct DryRunResult {
    /// Document that would be rewritten.
    pub document_id: String,
    /// Report region.
    pub region: Region,
    /// Root children that would be deleted.
    pub existing_children: usize,
    /// Date that would be written.
    pub report_date: String,
    /// Narrative text that would be inserted.
    pub text: String,
}
