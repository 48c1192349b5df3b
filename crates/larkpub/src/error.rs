//! CLI error types.

use larkpub_config::ConfigError;
use larkpub_docx::{LarkError, PublishError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lark(#[from] LarkError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} target(s) failed")]
    TargetsFailed { failed: usize, total: usize },

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Validation(String),
}

impl CliError {
    /// Message followed by each source, joined with `: `.
    pub(crate) fn chain(&self) -> String {
        larkpub_server::error_chain(self).join(": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_includes_sources() {
        let err = CliError::Lark(LarkError::RetryExhausted {
            attempts: 6,
            last: Box::new(LarkError::RateLimited {
                status: 429,
                code: 429,
                message: "Unknown error".to_owned(),
            }),
        });

        assert_eq!(
            err.chain(),
            "gave up after 6 attempts: rate limited: HTTP 429 - code 429: Unknown error"
        );
    }

    #[test]
    fn test_chain_without_source() {
        let err = CliError::Validation("no targets configured".to_owned());
        assert_eq!(err.chain(), "no targets configured");
    }
}
