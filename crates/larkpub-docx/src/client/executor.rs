//! Retrying request executor.
//!
//! Every Lark call except token acquisition goes through [`Executor::execute`],
//! which owns the decision of what is worth retrying.

use std::sync::Arc;
use std::time::Duration;

use larkpub_config::RetryConfig;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::transport::{ApiRequest, RawResponse, Transport};
use crate::error::{LarkError, RATE_LIMIT_CODE};

/// Retry settings for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub backoff_base: Duration,
    /// Ceiling for a single delay.
    pub max_backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_millis(500),
            max_backoff: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
            max_backoff: config.max_backoff(),
        }
    }

    /// Delay after a retriable failure on `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = 2u32
            .checked_pow(attempt)
            .and_then(|factor| self.backoff_base.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        match self.max_backoff {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Total number of attempts the policy allows.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] using `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Standard Lark response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<Value>,
}

/// Sends requests and applies the retry policy.
pub(crate) struct Executor {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl Executor {
    pub(crate) fn new(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { transport, sleeper }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn transport_arc(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Run `request` until it succeeds, fails for good, or the policy runs out.
    ///
    /// Returns the envelope `data` (`Value::Null` when absent).
    pub(crate) fn execute(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<Value, LarkError> {
        let mut attempt = 0;
        loop {
            debug!(method = %request.method, url = %request.url, attempt, "Sending Lark request");

            let outcome = self
                .transport
                .send(request)
                .map_err(LarkError::from)
                .and_then(|response| classify(&response));

            let err = match outcome {
                Ok(data) => return Ok(data),
                Err(err) if !err.is_retriable() => return Err(err),
                Err(err) => err,
            };

            if attempt >= policy.max_retries {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt + 1,
                    error = %err,
                    "Giving up on Lark request"
                );
                return Err(LarkError::RetryExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }

            let delay = policy.delay_for(attempt);
            warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Retrying Lark request"
            );
            self.sleeper.sleep(delay);
            attempt += 1;
        }
    }
}

/// Map one HTTP response to envelope data or a classified error.
pub(crate) fn classify(response: &RawResponse) -> Result<Value, LarkError> {
    let status = response.status;
    let envelope = serde_json::from_str::<Envelope>(&response.body).ok();

    match status {
        200 => match envelope {
            Some(Envelope {
                code: Some(0),
                data,
                ..
            }) => Ok(data.unwrap_or(Value::Null)),
            Some(Envelope {
                code: Some(code),
                msg,
                ..
            }) => {
                let message = msg.unwrap_or_default();
                if code == RATE_LIMIT_CODE {
                    Err(LarkError::RateLimited {
                        status,
                        code,
                        message,
                    })
                } else {
                    Err(LarkError::Upstream {
                        status,
                        code,
                        message,
                    })
                }
            }
            _ => Err(LarkError::Upstream {
                status,
                code: i64::from(status),
                message: response.body.clone(),
            }),
        },
        400 | 429 | 503 => {
            let (code, msg) = envelope.map_or((None, None), |e| (e.code, e.msg));
            let code = code.unwrap_or(i64::from(status));
            let message = msg.unwrap_or_else(|| "Unknown error".to_owned());
            if status == 429 || code == RATE_LIMIT_CODE {
                Err(LarkError::RateLimited {
                    status,
                    code,
                    message,
                })
            } else {
                Err(LarkError::Upstream {
                    status,
                    code,
                    message,
                })
            }
        }
        _ => {
            let (code, message) = match envelope {
                Some(e) => (
                    e.code.unwrap_or(i64::from(status)),
                    e.msg.unwrap_or_else(|| "Unknown error".to_owned()),
                ),
                None => (i64::from(status), response.body.clone()),
            };
            Err(LarkError::Upstream {
                status,
                code,
                message,
            })
        }
    }
}
