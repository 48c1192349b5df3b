//! Drive media upload and image binding.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::DocxClient;
use super::multipart::MultipartForm;
use super::transport::ApiRequest;
use crate::error::LarkError;
use crate::types::FileToken;

/// Upload parent type for images embedded in docx blocks.
const DOCX_IMAGE: &str = "docx_image";

#[derive(Deserialize)]
struct UploadData {
    #[serde(default)]
    file_token: Option<String>,
}

impl DocxClient<'_> {
    /// Upload image bytes against an image block.
    ///
    /// # Arguments
    /// * `block_id` - Image placeholder block receiving the upload
    /// * `data` - Image bytes
    /// * `file_name` - File name reported to drive
    /// * `drive_route_token` - Routing hint, the ID of the document owning the block
    ///
    /// # Errors
    ///
    /// Returns [`LarkError::InvalidRequest`] for empty `data`,
    /// [`LarkError::Json`] for a malformed payload and
    /// [`LarkError::WorkflowStep`] when the response has no file token.
    pub fn upload_media(
        &self,
        block_id: &str,
        data: &[u8],
        file_name: &str,
        drive_route_token: &str,
    ) -> Result<FileToken, LarkError> {
        if data.is_empty() {
            return Err(LarkError::InvalidRequest("refusing to upload an empty image".to_owned()));
        }

        let url = format!("{}/drive/v1/medias/upload_all", self.client.base_url);
        let extra = json!({"drive_route_token": drive_route_token}).to_string();
        let form = MultipartForm::new()
            .text("file_name", file_name)
            .text("parent_type", DOCX_IMAGE)
            .text("parent_node", block_id)
            .text("size", data.len().to_string())
            .text("extra", extra)
            .file("file", file_name, "application/octet-stream", data.to_vec());

        info!(block_id, file_name, size = data.len(), "Uploading image");

        let response = self.execute(ApiRequest::post(url).multipart(form))?;
        let upload: UploadData = if response.is_null() {
            UploadData { file_token: None }
        } else {
            serde_json::from_value(response)?
        };

        upload
            .file_token
            .filter(|t| !t.is_empty())
            .map(FileToken::new)
            .ok_or_else(|| LarkError::WorkflowStep("upload returned no file_token".to_owned()))
    }

    /// Bind an uploaded file to an image block, consuming the token.
    #[allow(clippy::needless_pass_by_value)]
    pub fn bind_image(
        &self,
        document_id: &str,
        block_id: &str,
        file_token: FileToken,
    ) -> Result<(), LarkError> {
        let url = self.client.blocks_url(document_id, block_id);
        let request = ApiRequest::patch(url).json(json!({
            "replace_image": {"token": file_token.as_str()},
        }));

        self.execute(request)?;
        info!(document_id, block_id, "Bound image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::client::{Credential, LarkClient, Method, RequestBody, RetryPolicy, Sleeper, Transport};
    use crate::mock::{MockTransport, RecordingSleeper, envelope};

    const UPLOAD: &str = "/drive/v1/medias/upload_all";

    fn client(transport: &Arc<MockTransport>, sleeper: &Arc<RecordingSleeper>) -> LarkClient {
        LarkClient::new(
            "https://lark.test/open-apis",
            "app",
            "secret",
            Arc::clone(transport) as Arc<dyn Transport>,
        )
        .with_sleeper(Arc::clone(sleeper) as Arc<dyn Sleeper>)
    }

    #[test]
    fn test_upload_media_form_fields() {
        let transport = Arc::new(MockTransport::new().reply_json(
            Method::Post,
            UPLOAD,
            200,
            &envelope(0, "ok", json!({"file_token": "boxabc"})),
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");

        let token = lark
            .docx(&credential, RetryPolicy::default())
            .upload_media("img1", &[0x89, b'P', b'N', b'G'], "shot.png", "doc42")
            .unwrap();

        assert_eq!(token.as_str(), "boxabc");
        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://lark.test/open-apis/drive/v1/medias/upload_all");
        let RequestBody::Multipart(form) = &request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.field("file_name"), Some("shot.png"));
        assert_eq!(form.field("parent_type"), Some("docx_image"));
        assert_eq!(form.field("parent_node"), Some("img1"));
        assert_eq!(form.field("size"), Some("4"));
        let extra: Value = serde_json::from_str(form.field("extra").unwrap()).unwrap();
        assert_eq!(extra, json!({"drive_route_token": "doc42"}));
        let file = form.file_part().unwrap();
        assert_eq!(file.field, "file");
        assert_eq!(file.content_type, "application/octet-stream");
        assert_eq!(file.data, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_upload_retries_rate_limit() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, UPLOAD, 429, "")
                .reply(Method::Post, UPLOAD, 429, "")
                .reply_json(Method::Post, UPLOAD, 200, &envelope(0, "ok", json!({"file_token": "f1"}))),
        );
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_base: Duration::from_millis(500),
            max_backoff: None,
        };

        let token = lark
            .docx(&credential, policy)
            .upload_media("img1", b"png", "shot.png", "doc")
            .unwrap();

        assert_eq!(token.as_str(), "f1");
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(sleeper.total(), Duration::from_millis(500 * (1 + 2)));
    }

    #[test]
    fn test_upload_missing_token() {
        let transport = Arc::new(MockTransport::new().reply_json(
            Method::Post,
            UPLOAD,
            200,
            &envelope(0, "ok", json!({})),
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .upload_media("img1", b"png", "shot.png", "doc")
            .unwrap_err();

        assert!(matches!(err, LarkError::WorkflowStep(_)));
    }

    #[test]
    fn test_upload_malformed_data_keeps_json_error() {
        let transport = Arc::new(MockTransport::new().reply_json(
            Method::Post,
            UPLOAD,
            200,
            &envelope(0, "ok", json!({"file_token": 42})),
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .upload_media("img1", b"png", "shot.png", "doc")
            .unwrap_err();

        assert!(matches!(err, LarkError::Json(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_upload_empty_image_rejected_locally() {
        let transport = Arc::new(MockTransport::new());
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .upload_media("img1", &[], "shot.png", "doc")
            .unwrap_err();

        assert!(matches!(err, LarkError::InvalidRequest(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_bind_image_body() {
        let transport = Arc::new(MockTransport::new().reply_json(
            Method::Patch,
            "/blocks/img1",
            200,
            &envelope(0, "ok", json!({"block": {"block_id": "img1"}})),
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let lark = client(&transport, &sleeper);
        let credential = Credential::new("t");

        lark.docx(&credential, RetryPolicy::default())
            .bind_image("doc", "img1", FileToken::new("boxabc"))
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://lark.test/open-apis/docx/v1/documents/doc/blocks/img1"
        );
        assert!(request.query.is_empty());
        assert_eq!(
            request.json_body().unwrap(),
            &json!({"replace_image": {"token": "boxabc"}})
        );
    }
}
