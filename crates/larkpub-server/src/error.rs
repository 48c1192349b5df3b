//! Error types for the HTTP server.

use std::error::Error;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::handlers::publish::TargetResult;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// At least one target failed to publish.
    #[error("{error}")]
    Publish {
        /// First failure.
        error: String,
        /// Source chain of the first failure.
        trace: Vec<String>,
        /// Per-target results in configuration order.
        results: Vec<TargetResult>,
    },

    /// Another publish run still holds the targets.
    #[error("publish already running")]
    Busy,

    /// The blocking publish task panicked or was cancelled.
    #[error("publish task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Publish {
                error,
                trace,
                results,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": error, "trace": trace, "results": results}),
            ),
            Self::Busy => (StatusCode::CONFLICT, json!({"error": self.to_string()})),
            Self::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": self.to_string(), "trace": error_chain(&self)}),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Messages of `err` and each of its sources, outermost first.
#[must_use]
pub fn error_chain(err: &dyn Error) -> Vec<String> {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain() {
        let err = Outer(std::io::Error::other("inner"));
        assert_eq!(error_chain(&err), vec!["outer", "inner"]);
    }

    #[test]
    fn test_publish_error_is_500() {
        let err = ServerError::Publish {
            error: "clear failed for document d (global)".to_owned(),
            trace: vec!["clear failed for document d (global)".to_owned()],
            results: Vec::new(),
        };
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_busy_is_409() {
        assert_eq!(ServerError::Busy.into_response().status(), StatusCode::CONFLICT);
    }
}
