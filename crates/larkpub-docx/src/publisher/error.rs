//! Error types for the publish workflow.

use std::fmt;

use larkpub_config::Region;
use serde::Serialize;

use super::SourceError;
use crate::error::LarkError;

/// Workflow step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    Render,
    Authenticate,
    Clear,
    InsertText,
    CreateImage,
    UploadImage,
    BindImage,
}

impl PublishStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Authenticate => "authenticate",
            Self::Clear => "clear",
            Self::InsertText => "insert_text",
            Self::CreateImage => "create_image",
            Self::UploadImage => "upload_image",
            Self::BindImage => "bind_image",
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause of a failed step.
#[derive(Debug, thiserror::Error)]
pub enum PublishErrorKind {
    /// Lark API call failed.
    #[error(transparent)]
    Api(#[from] LarkError),

    /// Image source failed.
    #[error("image source failed")]
    Render(#[source] SourceError),
}

/// A publish run stopped at `step`.
///
/// Steps before `step` have already mutated the document.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed for document {document_id} ({region})")]
pub struct PublishError {
    pub document_id: String,
    pub region: Region,
    pub step: PublishStep,
    #[source]
    pub kind: PublishErrorKind,
}

impl PublishError {
    pub(crate) fn new(
        document_id: &str,
        region: Region,
        step: PublishStep,
        kind: impl Into<PublishErrorKind>,
    ) -> Self {
        Self {
            document_id: document_id.to_owned(),
            region,
            step,
            kind: kind.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_names_step_and_target() {
        let err = PublishError::new(
            "doxcn1",
            Region::Global,
            PublishStep::UploadImage,
            LarkError::WorkflowStep("upload returned no file_token".to_owned()),
        );

        assert_eq!(err.to_string(), "upload_image failed for document doxcn1 (global)");
        assert_eq!(
            err.source().unwrap().to_string(),
            "unexpected response: upload returned no file_token"
        );
    }

    #[test]
    fn test_render_failure_keeps_source() {
        let cause: SourceError = "chromium exited with status 1".into();
        let err = PublishError::new(
            "doxcn1",
            Region::Regional,
            PublishStep::Render,
            PublishErrorKind::Render(cause),
        );

        let kind = err.source().unwrap();
        assert_eq!(kind.to_string(), "image source failed");
        assert_eq!(kind.source().unwrap().to_string(), "chromium exited with status 1");
    }

    #[test]
    fn test_step_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(PublishStep::InsertText).unwrap(),
            serde_json::json!("insert_text")
        );
    }
}
