//! Publisher implementation.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::client::LarkClient;
use crate::error::LarkError;

use super::error::{PublishError, PublishErrorKind, PublishStep};
use super::result::{DryRunResult, PublishOutcome};
use super::{DocumentRef, ImageSource, PublishConfig, report_date};

/// Publishes dated reports into Lark documents.
pub struct Publisher<'a> {
    client: &'a LarkClient,
    config: PublishConfig,
}

impl<'a> Publisher<'a> {
    /// Create a new publisher.
    #[must_use]
    pub fn new(client: &'a LarkClient, config: PublishConfig) -> Self {
        Self { client, config }
    }

    /// Replace the content of `target` with today's report.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. Steps already performed stay applied.
    pub fn publish(
        &self,
        target: &DocumentRef,
        image: &[u8],
    ) -> Result<PublishOutcome, PublishError> {
        self.publish_at(target, image, Utc::now())
    }

    /// [`Publisher::publish`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. Steps already performed stay applied.
    pub fn publish_at(
        &self,
        target: &DocumentRef,
        image: &[u8],
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, PublishError> {
        let document_id = target.document_id.as_str();
        let failed = |step: PublishStep| {
            move |err: LarkError| PublishError::new(document_id, target.region, step, err)
        };

        // Nothing to upload means nothing should be cleared either.
        if image.is_empty() {
            return Err(failed(PublishStep::UploadImage)(LarkError::InvalidRequest(
                "image is empty".to_owned(),
            )));
        }

        info!(document = %target, "Publishing report");

        let credential = self
            .client
            .acquire_token()
            .map_err(failed(PublishStep::Authenticate))?;
        let docx = self.client.docx(&credential, self.config.retry);

        let cleared = docx
            .clear_document(document_id, self.config.page_size, self.config.max_clear_rounds)
            .map_err(failed(PublishStep::Clear))?;

        let date = report_date(now, self.config.utc_offset);
        let runs = self.config.template.render(&date);
        let text_block_id = docx
            .create_text_block(document_id, document_id, 0, &runs)
            .map_err(failed(PublishStep::InsertText))?;

        let image_block_id = docx
            .create_image_placeholder(document_id, document_id, 1)
            .map_err(failed(PublishStep::CreateImage))?;

        let file_token = docx
            .upload_media(&image_block_id, image, &self.config.image_name, document_id)
            .map_err(failed(PublishStep::UploadImage))?;
        let file_token_text = file_token.as_str().to_owned();

        docx.bind_image(document_id, &image_block_id, file_token)
            .map_err(failed(PublishStep::BindImage))?;

        info!(
            document = %target,
            report_date = %date,
            deleted = cleared.deleted,
            "Report published"
        );

        Ok(PublishOutcome {
            document_id: document_id.to_owned(),
            region: target.region,
            report_date: date,
            cleared,
            text_block_id,
            image_block_id,
            file_token: file_token_text,
            image_bytes: image.len(),
        })
    }

    /// Preview a publish without mutating the document.
    ///
    /// Authenticates and counts the root children that a publish would delete.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or the read-only listing fails.
    pub fn dry_run(&self, target: &DocumentRef) -> Result<DryRunResult, PublishError> {
        self.dry_run_at(target, Utc::now())
    }

    /// [`Publisher::dry_run`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or the read-only listing fails.
    pub fn dry_run_at(
        &self,
        target: &DocumentRef,
        now: DateTime<Utc>,
    ) -> Result<DryRunResult, PublishError> {
        let document_id = target.document_id.as_str();
        let failed = |step: PublishStep| {
            move |err: LarkError| PublishError::new(document_id, target.region, step, err)
        };

        let credential = self
            .client
            .acquire_token()
            .map_err(failed(PublishStep::Authenticate))?;
        let existing = self
            .client
            .docx(&credential, self.config.retry)
            .list_all_children(document_id, document_id, self.config.page_size)
            .map_err(failed(PublishStep::Clear))?;

        let date = report_date(now, self.config.utc_offset);
        Ok(DryRunResult {
            document_id: document_id.to_owned(),
            region: target.region,
            existing_children: existing.len(),
            text: self.config.template.plain_text(&date),
            report_date: date,
        })
    }

    /// Render and publish every target.
    ///
    /// Targets are independent: a failure never stops or rolls back another.
    /// Results come back in input order.
    pub fn publish_targets(
        &self,
        targets: &[DocumentRef],
        source: &dyn ImageSource,
        parallel: bool,
    ) -> Vec<Result<PublishOutcome, PublishError>> {
        let now = Utc::now();
        let run = |target: &DocumentRef| self.render_and_publish(target, source, now);

        let results: Vec<_> = if parallel {
            targets.par_iter().map(run).collect()
        } else {
            targets.iter().map(run).collect()
        };

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!(
                document_id = %err.document_id,
                region = %err.region,
                step = %err.step,
                "Publish failed"
            );
        }
        results
    }

    fn render_and_publish(
        &self,
        target: &DocumentRef,
        source: &dyn ImageSource,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, PublishError> {
        let image = source.render(target.region).map_err(|err| {
            PublishError::new(
                &target.document_id,
                target.region,
                PublishStep::Render,
                PublishErrorKind::Render(err),
            )
        })?;
        self.publish_at(target, &image, now)
    }
}
