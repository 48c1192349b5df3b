//! `larkpub serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use larkpub_config::{CliSettings, Config};
use larkpub_docx::{LarkClient, PublishConfig};
use larkpub_server::{PublishJob, run_server, server_config_from_config};
use larkpub_snapshot::source_from_config;

use super::{configured_targets, require_lark_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover larkpub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host address to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Publish targets one after another instead of concurrently.
    #[arg(long)]
    sequential: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the server fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let lark = require_lark_config(&config, &output)?;
        let job = PublishJob {
            client: LarkClient::from_config(lark),
            publish: PublishConfig::from_config(&config)?,
            targets: configured_targets(&config)?,
            source: source_from_config(&config.renderer_resolved),
        };
        let server_config = server_config_from_config(&config, !self.sequential);

        output.info(&format!(
            "Starting server on {}:{} ({} target(s))...",
            server_config.host,
            server_config.port,
            job.targets.len()
        ));
        output.info("Trigger a run with POST /api/insert_image");

        run_server(server_config, job)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}
