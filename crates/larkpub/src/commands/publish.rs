//! `larkpub publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use larkpub_config::{CliSettings, Config, Region};
use larkpub_docx::{
    DocumentRef, DryRunResult, ImageSource, LarkClient, PublishConfig, PublishError,
    PublishOutcome, Publisher,
};
use larkpub_snapshot::{FileSource, source_from_config};
use tracing::info;

use super::{configured_targets, require_lark_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to configuration file (default: auto-discover larkpub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Publish this PNG instead of rendering one.
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Publish into this document only (overrides [[targets]]).
    #[arg(short, long)]
    document: Option<String>,

    /// Region of --document (global, regional or sg).
    #[arg(short, long, requires = "document", default_value = "global")]
    region: Region,

    /// Lark Open API base URL (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Retries per API call (overrides config).
    #[arg(long)]
    max_retries: Option<u32>,

    /// Preview without changing any document.
    #[arg(long)]
    dry_run: bool,

    /// Publish targets one after another instead of concurrently.
    #[arg(long)]
    sequential: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any target fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let lark = require_lark_config(&config, &output)?;
        let client = LarkClient::from_config(lark);
        let publisher = Publisher::new(&client, PublishConfig::from_config(&config)?);
        let targets = self.targets(&config)?;
        info!(
            config = ?config.config_path,
            targets = targets.len(),
            dry_run = self.dry_run,
            "Loaded configuration"
        );

        if self.dry_run {
            for target in &targets {
                let result = publisher.dry_run(target)?;
                print_dry_run_result(&output, &result);
            }
            return Ok(());
        }

        let source: Box<dyn ImageSource> = match &self.image {
            Some(path) => Box::new(FileSource::fixed(path)),
            None => source_from_config(&config.renderer_resolved),
        };

        output.info(&format!("Publishing to {} document(s)...", targets.len()));
        let results = publisher.publish_targets(&targets, source.as_ref(), !self.sequential);

        let failed = results.iter().filter(|r| r.is_err()).count();
        for result in &results {
            match result {
                Ok(outcome) => print_outcome(&output, outcome),
                Err(err) => print_failure(&output, err),
            }
        }

        if failed > 0 {
            return Err(CliError::TargetsFailed {
                failed,
                total: results.len(),
            });
        }
        Ok(())
    }

    fn targets(&self, config: &Config) -> Result<Vec<DocumentRef>, CliError> {
        match &self.document {
            Some(document_id) => Ok(vec![DocumentRef::new(document_id.clone(), self.region)]),
            None => configured_targets(config),
        }
    }
}

fn print_dry_run_result(output: &Output, result: &DryRunResult) {
    output.highlight(&format!(
        "\n[DRY RUN] {} ({}): no changes made.",
        result.document_id, result.region
    ));
    output.info(&format!(
        "Blocks that would be deleted: {}",
        result.existing_children
    ));
    output.info(&format!("Report date: {}", result.report_date));
    output.info(&format!("Text: {}", result.text));
}

fn print_outcome(output: &Output, outcome: &PublishOutcome) {
    output.success(&format!(
        "\n{} ({}) published",
        outcome.document_id, outcome.region
    ));
    output.info(&format!("Report date: {}", outcome.report_date));
    output.info(&format!(
        "Cleared: {} block(s) in {} round(s)",
        outcome.cleared.deleted, outcome.cleared.rounds
    ));
    output.info(&format!("Image block: {}", outcome.image_block_id));
}

fn print_failure(output: &Output, err: &PublishError) {
    output.error(&format!("\n{err}"));
    for cause in larkpub_server::error_chain(err).iter().skip(1) {
        output.warning(&format!("  caused by: {cause}"));
    }
}
