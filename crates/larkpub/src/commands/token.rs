//! `larkpub token` command implementation.

use std::path::PathBuf;

use clap::Args;
use larkpub_config::Config;
use larkpub_docx::LarkClient;

use super::require_lark_config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the token command.
#[derive(Args)]
pub(crate) struct TokenArgs {
    /// Path to configuration file (default: auto-discover larkpub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl TokenArgs {
    /// Execute the token command.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let lark = require_lark_config(&config, &output)?;

        let client = LarkClient::from_config(lark);
        output.info(&format!("Requesting tenant access token from {}...", client.base_url()));
        let credential = client.acquire_token()?;

        output.success(&format!("Token acquired: {}", credential.masked()));
        if let Some(expires_in) = credential.expires_in() {
            output.info(&format!("Expires in {}s", expires_in.as_secs()));
        }
        Ok(())
    }
}
