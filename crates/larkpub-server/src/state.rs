//! Application state.

use std::sync::Arc;

use larkpub_docx::{
    DocumentRef, ImageSource, LarkClient, PublishConfig, PublishError, PublishOutcome, Publisher,
};

/// Application state shared across all request handlers.
pub(crate) struct AppState {
    pub(crate) client: LarkClient,
    pub(crate) publish: PublishConfig,
    pub(crate) targets: Vec<DocumentRef>,
    pub(crate) source: Box<dyn ImageSource>,
    /// Publish targets concurrently.
    pub(crate) parallel: bool,
    /// Held for the whole of a publish run; at most one run mutates the targets.
    pub(crate) publish_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    /// Render and publish every target. Blocks.
    pub(crate) fn publish_all(&self) -> Vec<Result<PublishOutcome, PublishError>> {
        Publisher::new(&self.client, self.publish.clone()).publish_targets(
            &self.targets,
            self.source.as_ref(),
            self.parallel,
        )
    }
}
