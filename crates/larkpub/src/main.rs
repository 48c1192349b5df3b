//! larkpub CLI - publish dated report snapshots into Lark documents.
//!
//! Provides commands for:
//! - `publish`: Render and publish the report into every configured document
//! - `serve`: Start the HTTP trigger
//! - `token`: Check app credentials by acquiring a tenant access token
//! - `blocks`: Dump a document's root blocks as JSON

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BlocksArgs, PublishArgs, ServeArgs, TokenArgs};
use output::Output;

/// larkpub - Lark report publisher.
#[derive(Parser)]
#[command(name = "larkpub", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render and publish the report.
    Publish(PublishArgs),
    /// Start the HTTP trigger.
    Serve(ServeArgs),
    /// Acquire a tenant access token to check credentials.
    Token(TokenArgs),
    /// Dump the root blocks of a document as JSON.
    Blocks(BlocksArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Publish(args) => args.verbose,
            Self::Serve(args) => args.verbose,
            Self::Token(_) | Self::Blocks(_) => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Publish(args) => args.execute(),
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
        Commands::Token(args) => args.execute(),
        Commands::Blocks(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {}", err.chain()));
        std::process::exit(1);
    }
}
