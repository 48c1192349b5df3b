//! HTTP trigger for larkpub.
//!
//! This crate provides an axum server exposing:
//! - `POST /api/insert_image` to publish the report into every configured document
//!   (409 while an earlier trigger is still running)
//! - `GET /api/health` for liveness checks
//!
//! Publishing is blocking work and runs on tokio's blocking pool.
//!
//! # Quick Start
//!
//! ```ignore
//! use larkpub_server::{PublishJob, ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let job = PublishJob { client, publish, targets, source };
//!     run_server(config, job).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use larkpub_docx::{DocumentRef, ImageSource, LarkClient, PublishConfig};
use state::AppState;

pub use error::error_chain;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Publish targets concurrently.
    pub parallel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 18891,
            parallel: true,
        }
    }
}

/// What a trigger publishes.
pub struct PublishJob {
    /// Lark client shared by all runs.
    pub client: LarkClient,
    /// Workflow settings.
    pub publish: PublishConfig,
    /// Documents rewritten on every trigger.
    pub targets: Vec<DocumentRef>,
    /// Report image producer.
    pub source: Box<dyn ImageSource>,
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(
    config: ServerConfig,
    job: PublishJob,
) -> Result<(), Box<dyn std::error::Error>> {
    let targets = job.targets.len();
    let state = Arc::new(AppState {
        client: job.client,
        publish: job.publish,
        targets: job.targets,
        source: job.source,
        parallel: config.parallel,
        publish_lock: Arc::default(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, targets, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from larkpub config.
#[must_use]
pub fn server_config_from_config(config: &larkpub_config::Config, parallel: bool) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        parallel,
    }
}
