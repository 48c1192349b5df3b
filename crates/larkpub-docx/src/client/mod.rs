//! Lark Open API client.
//!
//! Provides a sync HTTP client for the docx and drive APIs with tenant access
//! token authentication and a shared retrying executor.

mod auth;
mod blocks;
mod executor;
mod media;
mod multipart;
mod transport;

use std::sync::Arc;

use larkpub_config::LarkConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub use auth::Credential;
pub use executor::{RetryPolicy, Sleeper, ThreadSleeper};
pub(crate) use executor::Executor;
pub use multipart::{FilePart, MultipartForm};
pub use transport::{ApiRequest, Method, RawResponse, RequestBody, Transport, UreqTransport};

/// RFC 3986 unreserved characters: A-Z a-z 0-9 - . _ ~
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Lark Open API client.
///
/// Holds the app credentials and a shared transport. Safe to share across
/// threads; each publish run borrows it read-only.
pub struct LarkClient {
    executor: Executor,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl LarkClient {
    /// Create client from the `[lark]` config section.
    #[must_use]
    pub fn from_config(config: &LarkConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.app_id,
            &config.app_secret,
            Arc::new(UreqTransport::new(config.timeout())),
        )
    }

    /// Create client over an arbitrary transport.
    ///
    /// # Arguments
    /// * `base_url` - Open API base URL, e.g. `https://open.larksuite.com/open-apis`
    /// * `app_id` - App ID of the internal app
    /// * `app_secret` - App secret of the internal app
    /// * `transport` - HTTP transport used for every call
    #[must_use]
    pub fn new(
        base_url: &str,
        app_id: &str,
        app_secret: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            executor: Executor::new(transport, Arc::new(ThreadSleeper)),
            base_url: base_url.trim_end_matches('/').to_owned(),
            app_id: app_id.to_owned(),
            app_secret: app_secret.to_owned(),
        }
    }

    /// Replace the sleeper used between retry attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.executor = Executor::new(self.executor.transport_arc(), sleeper);
        self
    }

    /// Open API base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Block and media operations authenticated with `credential`.
    #[must_use]
    pub fn docx<'a>(&'a self, credential: &'a Credential, policy: RetryPolicy) -> DocxClient<'a> {
        DocxClient {
            client: self,
            credential,
            policy,
        }
    }

    /// Block URL with both IDs encoded as single path segments.
    fn blocks_url(&self, document_id: &str, block_id: &str) -> String {
        format!(
            "{}/docx/v1/documents/{}/blocks/{}",
            self.base_url,
            utf8_percent_encode(document_id, PATH_SEGMENT),
            utf8_percent_encode(block_id, PATH_SEGMENT)
        )
    }
}

/// Authenticated docx operations.
///
/// Every call goes through the retrying executor with the same policy.
pub struct DocxClient<'a> {
    client: &'a LarkClient,
    credential: &'a Credential,
    policy: RetryPolicy,
}

impl DocxClient<'_> {
    /// Retry policy applied to each call.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn execute(&self, request: ApiRequest) -> Result<serde_json::Value, crate::LarkError> {
        let request = request.bearer(self.credential.secret());
        self.client.executor.execute(&request, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::LarkError;
    use crate::mock::{MockTransport, RecordingSleeper, envelope};

    fn client(
        base_url: &str,
        transport: Arc<dyn Transport>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> LarkClient {
        LarkClient::new(base_url, "app", "secret", transport)
            .with_sleeper(Arc::clone(sleeper) as Arc<dyn Sleeper>)
    }

    #[test]
    fn test_blocks_url_encodes_ids() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(
            "https://lark.test/open-apis/",
            Arc::new(MockTransport::new()),
            &sleeper,
        );

        assert_eq!(
            lark.blocks_url("doxcnAb_9-x", "blk.1~"),
            "https://lark.test/open-apis/docx/v1/documents/doxcnAb_9-x/blocks/blk.1~"
        );
        assert_eq!(
            lark.blocks_url("doxcn bad", "a/b?c"),
            "https://lark.test/open-apis/docx/v1/documents/doxcn%20bad/blocks/a%2Fb%3Fc"
        );
    }

    #[test]
    fn test_id_with_slash_stays_on_children_route() {
        let transport = Arc::new(MockTransport::new().reply_json(
            Method::Get,
            "/blocks/doc%2F..%2Fother/children",
            200,
            &envelope(0, "ok", serde_json::json!({"items": [], "has_more": false})),
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(
            "https://lark.test/open-apis",
            Arc::clone(&transport) as Arc<dyn Transport>,
            &sleeper,
        );
        let credential = Credential::new("t");

        let page = lark
            .docx(&credential, RetryPolicy::default())
            .list_children("doc/../other", "doc/../other", None, 500)
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(
            transport.requests()[0].url,
            "https://lark.test/open-apis/docx/v1/documents/doc%2F..%2Fother/blocks/doc%2F..%2Fother/children"
        );
    }

    #[test]
    fn test_unbuildable_request_fails_after_one_attempt() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let transport = Arc::new(UreqTransport::new(std::time::Duration::from_secs(5)));
        let lark = client("http://lark test/open-apis", transport, &sleeper);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .list_children("doxcn", "doxcn", None, 500)
            .unwrap_err();

        assert!(matches!(err, LarkError::InvalidRequest(_)), "got {err:?}");
        assert!(sleeper.durations().is_empty());
    }
}
