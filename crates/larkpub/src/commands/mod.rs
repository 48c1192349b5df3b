//! CLI command implementations.

pub(crate) mod blocks;
pub(crate) mod publish;
pub(crate) mod serve;
pub(crate) mod token;

pub(crate) use blocks::BlocksArgs;
pub(crate) use publish::PublishArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use token::TokenArgs;

use larkpub_config::{Config, LarkConfig};
use larkpub_docx::DocumentRef;

use crate::error::CliError;
use crate::output::Output;

/// Get the `[lark]` section, explaining how to add it when missing.
fn require_lark_config<'a>(config: &'a Config, output: &Output) -> Result<&'a LarkConfig, CliError> {
    if config.lark.is_none() {
        output.error("Error: lark configuration required in larkpub.toml");
        output.info("\nAdd the following to your larkpub.toml:");
        output.info("\n[lark]");
        output.info(r#"app_id = "${LARK_APP_ID}""#);
        output.info(r#"app_secret = "${LARK_APP_SECRET}""#);
    }
    Ok(config.require_lark()?)
}

/// Configured targets, failing when there are none.
fn configured_targets(config: &Config) -> Result<Vec<DocumentRef>, CliError> {
    if config.targets.is_empty() {
        return Err(CliError::Validation(
            "no targets configured (add [[targets]] to larkpub.toml or pass --document)".to_owned(),
        ));
    }
    Ok(config.targets.iter().map(DocumentRef::from).collect())
}
