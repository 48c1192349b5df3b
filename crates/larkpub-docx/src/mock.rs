//! Scripted transport and sleeper for testing.
//!
//! Provides [`MockTransport`] and [`RecordingSleeper`] so the executor, block
//! operations and publish workflow can be exercised without network access or
//! real delays.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

use serde_json::{Value, json};

use crate::client::{ApiRequest, Method, RawResponse, Sleeper, Transport};

/// Build a Lark response envelope.
#[must_use]
pub fn envelope(code: i64, msg: &str, data: Value) -> Value {
    json!({"code": code, "msg": msg, "data": data})
}

#[derive(Debug)]
enum Reply {
    Response(RawResponse),
    Failure(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    suffix: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from per-route reply queues.
///
/// A route is a method plus a URL suffix. Each matching request consumes the
/// next reply queued for its route, and every request is recorded.
///
/// # Example
///
/// ```ignore
/// use larkpub_docx::{Method, MockTransport};
///
/// let transport = MockTransport::new()
///     .reply(Method::Get, "/children", 429, "")
///     .reply(Method::Get, "/children", 200, r#"{"code":0,"data":{}}"#);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: RwLock<Vec<Route>>,
    requests: RwLock<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Create a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, method: Method, suffix: &str, reply: Reply) -> Self {
        {
            let mut routes = self.routes.write().unwrap();
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.method == method && r.suffix == suffix)
            {
                route.replies.push_back(reply);
            } else {
                routes.push(Route {
                    method,
                    suffix: suffix.to_owned(),
                    replies: VecDeque::from([reply]),
                });
            }
        }
        self
    }

    /// Queue a raw response for `method` requests whose URL ends with `suffix`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn reply(self, method: Method, suffix: &str, status: u16, body: impl Into<String>) -> Self {
        let response = RawResponse {
            status,
            body: body.into(),
        };
        self.push(method, suffix, Reply::Response(response))
    }

    /// Queue a JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn reply_json(self, method: Method, suffix: &str, status: u16, body: &Value) -> Self {
        self.reply(method, suffix, status, body.to_string())
    }

    /// Queue a transport failure (no response at all).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn fail(self, method: Method, suffix: &str, message: &str) -> Self {
        self.push(method, suffix, Reply::Failure(message.to_owned()))
    }

    /// All requests received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Requests received for a route.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests_to(&self, method: Method, suffix: &str) -> Vec<ApiRequest> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .cloned()
            .collect()
    }

    /// Number of scripted replies not yet consumed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.routes
            .read()
            .unwrap()
            .iter()
            .map(|r| r.replies.len())
            .sum()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ureq::Error> {
        self.requests.write().unwrap().push(request.clone());

        let reply = self
            .routes
            .write()
            .unwrap()
            .iter_mut()
            .find(|r| {
                r.method == request.method
                    && request.url.ends_with(&r.suffix)
                    && !r.replies.is_empty()
            })
            .and_then(|r| r.replies.pop_front());

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(ureq::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            ))),
            None => panic!("no scripted reply for {} {}", request.method, request.url),
        }
    }
}

/// Sleeper that records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: RwLock<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn durations(&self) -> Vec<Duration> {
        self.slept.read().unwrap().clone()
    }

    /// Sum of all requested delays.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.slept.read().unwrap().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.write().unwrap().push(duration);
    }
}
