//! `larkpub blocks` command implementation.

use std::path::PathBuf;

use clap::Args;
use larkpub_config::Config;
use larkpub_docx::{LarkClient, RetryPolicy};

use super::require_lark_config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the blocks command.
#[derive(Args)]
pub(crate) struct BlocksArgs {
    /// Document ID.
    document_id: String,

    /// Parent block (default: the document's root block).
    #[arg(short, long)]
    block: Option<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover larkpub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl BlocksArgs {
    /// Execute the blocks command.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocks cannot be listed or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let lark = require_lark_config(&config, &output)?;

        let client = LarkClient::from_config(lark);
        let credential = client.acquire_token()?;
        let docx = client.docx(&credential, RetryPolicy::from_config(&config.retry));

        let block_id = self.block.as_deref().unwrap_or(&self.document_id);
        let blocks = docx.list_all_children(&self.document_id, block_id, config.clear.page_size)?;
        let json = serde_json::to_string_pretty(&blocks)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, json)?;
                output.success(&format!(
                    "Wrote {} block(s) to {}",
                    blocks.len(),
                    path.display()
                ));
            }
            None => output.data(&json)?,
        }
        Ok(())
    }
}
