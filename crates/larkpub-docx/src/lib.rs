//! Lark docx client and report publisher.
//!
//! Provides:
//! - [`LarkClient`] for tenant token acquisition, block and media operations
//! - A retrying executor shared by every docx and drive call ([`RetryPolicy`])
//! - [`DocxClient::clear_document`] to empty a document's root block
//! - [`Publisher`] running the clear, insert, upload and bind workflow per document
//! - [`MockTransport`] and [`RecordingSleeper`] for testing (behind `mock` feature flag)

mod clear;
mod client;
mod error;
mod publisher;
mod types;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use clear::ClearReport;
pub use client::{
    ApiRequest, Credential, DocxClient, FilePart, LarkClient, Method, MultipartForm, RawResponse,
    RequestBody, RetryPolicy, Sleeper, ThreadSleeper, Transport, UreqTransport,
};
pub use error::{LarkError, RATE_LIMIT_CODE};
pub use publisher::{
    DocumentRef, DryRunResult, ImageSource, PublishConfig, PublishError, PublishErrorKind,
    PublishOutcome, PublishStep, Publisher, ReportTemplate, SourceError, report_date,
};
pub use types::{
    Block, BlockType, ChildrenPage, FileToken, ImageBody, TextBody, TextElement, TextElementStyle,
    TextRun,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, RecordingSleeper, envelope};
