//! Error types for Lark Open API operations.

/// Envelope `code` Lark returns when the caller is being throttled.
pub const RATE_LIMIT_CODE: i64 = 99_991_400;

/// Error from Lark Open API operations.
///
/// Only the request executor decides retriability; callers inspect
/// [`LarkError::is_retriable`] but never reclassify.
#[derive(Debug, thiserror::Error)]
pub enum LarkError {
    /// Connection, DNS, timeout or I/O failure before a response arrived.
    ///
    /// Other `ureq` failures (malformed URI, TLS setup, protocol) convert to
    /// [`LarkError::InvalidRequest`] and are never retried.
    #[error("HTTP request failed")]
    Transport(#[source] ureq::Error),

    /// Throttled by upstream (HTTP 429 or the rate-limit envelope code).
    #[error("rate limited: HTTP {status} - code {code}: {message}")]
    RateLimited {
        /// HTTP status code.
        status: u16,
        /// Envelope code (HTTP status when the body had none).
        code: i64,
        /// Upstream message.
        message: String,
    },

    /// Upstream rejected the request.
    #[error("HTTP {status} - Error {code}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Envelope code (HTTP status when the body had none).
        code: i64,
        /// Upstream message, or the raw body when it was not JSON.
        message: String,
    },

    /// Every attempt ended in a retriable failure.
    #[error("gave up after {attempts} attempts")]
    RetryExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<LarkError>,
    },

    /// Tenant access token could not be obtained.
    #[error("tenant access token: {0}")]
    Auth(String),

    /// A call succeeded but its payload was structurally unusable.
    #[error("unexpected response: {0}")]
    WorkflowStep(String),

    /// The document kept reporting children after the configured delete rounds.
    #[error("document still has at least {remaining} children after {rounds} delete rounds")]
    ClearIncomplete {
        /// Delete rounds performed.
        rounds: u32,
        /// Children seen in the last listing.
        remaining: usize,
    },

    /// A request was rejected locally before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl From<ureq::Error> for LarkError {
    fn from(err: ureq::Error) -> Self {
        if is_connection_failure(&err) {
            Self::Transport(err)
        } else {
            Self::InvalidRequest(err.to_string())
        }
    }
}

fn is_connection_failure(err: &ureq::Error) -> bool {
    matches!(
        err,
        ureq::Error::Io(_)
            | ureq::Error::Timeout(_)
            | ureq::Error::HostNotFound
            | ureq::Error::ConnectionFailed
    )
}

impl LarkError {
    /// Whether the executor may retry the call that produced this error.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}
