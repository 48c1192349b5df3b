//! HTTP transport seam.
//!
//! Block and media operations describe their calls as [`ApiRequest`] values and
//! hand them to a [`Transport`]. Production code sends them with `ureq`; tests
//! swap in a scripted transport.

use std::time::Duration;

use ureq::Agent;
use ureq::typestate::WithBody;

use super::multipart::{MultipartForm, new_boundary};

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// Fully described API call, replayable across retry attempts.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    #[must_use]
    pub fn get(url: String) -> Self {
        Self::new(Method::Get, url)
    }

    #[must_use]
    pub fn post(url: String) -> Self {
        Self::new(Method::Post, url)
    }

    #[must_use]
    pub fn patch(url: String) -> Self {
        Self::new(Method::Patch, url)
    }

    #[must_use]
    pub fn delete(url: String) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Authenticate with a bearer token.
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Value of a query parameter, if present.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// JSON body, if the request carries one.
    #[must_use]
    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status and body of an HTTP response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends API requests.
///
/// Implementations return error statuses as [`RawResponse`] values; only
/// failures that produced no response at all are errors.
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    ///
    /// Returns the transport failure when no response was received.
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ureq::Error>;
}

/// [`Transport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with a global per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ureq::Error> {
        let response = match request.method {
            Method::Get => prepare(self.agent.get(&request.url), request).call()?,
            Method::Post => send_with_body(self.agent.post(&request.url), request)?,
            Method::Patch => send_with_body(self.agent.patch(&request.url), request)?,
            Method::Delete => {
                send_with_body(self.agent.delete(&request.url).force_send_body(), request)?
            }
        };

        let status = response.status().as_u16();
        let body = response.into_body().read_to_string()?;
        Ok(RawResponse { status, body })
    }
}

/// Attach query parameters and the bearer token.
fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &ApiRequest,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(*key, value);
    }
    if let Some(token) = &request.bearer {
        builder = builder.header("Authorization", &format!("Bearer {token}"));
    }
    builder
}

fn send_with_body(
    builder: ureq::RequestBuilder<WithBody>,
    request: &ApiRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = prepare(builder, request);

    match &request.body {
        RequestBody::Empty => builder.send_empty(),
        RequestBody::Json(value) => builder.send_json(value),
        RequestBody::Multipart(form) => {
            let boundary = new_boundary();
            let body = form.encode(&boundary);
            builder
                .header(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={boundary}"),
                )
                .send(&body[..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_collects_parts() {
        let request = ApiRequest::get("https://example.test/blocks".to_owned())
            .query("page_size", "500")
            .query("document_revision_id", "-1")
            .bearer("t-123");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_value("page_size"), Some("500"));
        assert_eq!(request.query_value("document_revision_id"), Some("-1"));
        assert_eq!(request.query_value("page_token"), None);
        assert_eq!(request.bearer.as_deref(), Some("t-123"));
        assert!(request.json_body().is_none());
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("https://example.test".to_owned())
            .json(serde_json::json!({"index": 0}));
        assert_eq!(request.json_body().unwrap()["index"], 0);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
