//! Emptying a document's root block.

use serde::Serialize;
use tracing::{debug, info};

use crate::client::DocxClient;
use crate::error::LarkError;

/// What a clear pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    /// Delete rounds performed.
    pub rounds: u32,
    /// Children deleted across all rounds.
    pub deleted: usize,
}

impl DocxClient<'_> {
    /// Delete every child of the document root.
    ///
    /// Lists the first page of root children and deletes that many from index 0,
    /// repeating until a listing comes back empty. `has_more` is never trusted
    /// as a stop signal.
    ///
    /// # Errors
    ///
    /// Returns [`LarkError::ClearIncomplete`] when children remain after
    /// `max_rounds` delete rounds, or the first listing/delete error.
    pub fn clear_document(
        &self,
        document_id: &str,
        page_size: u32,
        max_rounds: u32,
    ) -> Result<ClearReport, LarkError> {
        let mut report = ClearReport::default();

        loop {
            let page = self.list_children(document_id, document_id, None, page_size)?;
            let count = page.items.len();

            if count == 0 {
                info!(document_id, rounds = report.rounds, deleted = report.deleted, "Document cleared");
                return Ok(report);
            }

            if report.rounds >= max_rounds {
                return Err(LarkError::ClearIncomplete {
                    rounds: report.rounds,
                    remaining: count,
                });
            }

            self.delete_children_range(document_id, document_id, 0, count)?;
            report.rounds += 1;
            report.deleted += count;
            debug!(document_id, round = report.rounds, count, "Deleted root children");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::client::{Credential, LarkClient, Method, RetryPolicy, Sleeper, Transport};
    use crate::mock::{MockTransport, RecordingSleeper, envelope};

    fn listing(count: usize, has_more: bool) -> Value {
        let items: Vec<Value> = (0..count)
            .map(|i| json!({"block_id": format!("b{i}"), "block_type": 2}))
            .collect();
        envelope(0, "ok", json!({"items": items, "has_more": has_more}))
    }

    fn deleted() -> Value {
        envelope(0, "ok", json!({"document_revision_id": 2}))
    }

    fn client(transport: &Arc<MockTransport>) -> LarkClient {
        LarkClient::new(
            "https://lark.test/open-apis",
            "app",
            "secret",
            Arc::clone(transport) as Arc<dyn Transport>,
        )
        .with_sleeper(Arc::new(RecordingSleeper::new()) as Arc<dyn Sleeper>)
    }

    fn delete_ranges(transport: &MockTransport) -> Vec<Value> {
        transport
            .requests_to(Method::Delete, "/batch_delete")
            .iter()
            .map(|r| r.json_body().cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_clear_already_empty_document() {
        let transport =
            Arc::new(MockTransport::new().reply_json(Method::Get, "/children", 200, &listing(0, false)));
        let lark = client(&transport);
        let credential = Credential::new("t");

        let report = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 100)
            .unwrap();

        assert_eq!(report, ClearReport::default());
        assert!(delete_ranges(&transport).is_empty());
    }

    #[test]
    fn test_clear_five_then_empty() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_json(Method::Get, "/children", 200, &listing(5, false))
                .reply_json(Method::Get, "/children", 200, &listing(0, false))
                .reply_json(Method::Delete, "/batch_delete", 200, &deleted()),
        );
        let lark = client(&transport);
        let credential = Credential::new("t");

        let report = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 100)
            .unwrap();

        assert_eq!(report, ClearReport { rounds: 1, deleted: 5 });
        assert_eq!(
            delete_ranges(&transport),
            vec![json!({"start_index": 0, "end_index": 5})]
        );
        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn test_clear_paginated_document_takes_ceil_rounds() {
        // 1200 children, page size 500: 500 + 500 + 200.
        let mut mock = MockTransport::new();
        for count in [500, 500, 200, 0] {
            mock = mock.reply_json(Method::Get, "/children", 200, &listing(count, count == 500));
        }
        for _ in 0..3 {
            mock = mock.reply_json(Method::Delete, "/batch_delete", 200, &deleted());
        }
        let transport = Arc::new(mock);
        let lark = client(&transport);
        let credential = Credential::new("t");

        let report = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 100)
            .unwrap();

        assert_eq!(report, ClearReport { rounds: 3, deleted: 1200 });
        assert_eq!(
            delete_ranges(&transport),
            vec![
                json!({"start_index": 0, "end_index": 500}),
                json!({"start_index": 0, "end_index": 500}),
                json!({"start_index": 0, "end_index": 200}),
            ]
        );
    }

    #[test]
    fn test_clear_ignores_stale_has_more() {
        // has_more=true on an empty listing must not cause another round.
        let transport =
            Arc::new(MockTransport::new().reply_json(Method::Get, "/children", 200, &listing(0, true)));
        let lark = client(&transport);
        let credential = Credential::new("t");

        let report = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 100)
            .unwrap();

        assert_eq!(report.rounds, 0);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_clear_gives_up_after_max_rounds() {
        let mut mock = MockTransport::new();
        for _ in 0..3 {
            mock = mock.reply_json(Method::Get, "/children", 200, &listing(2, false));
        }
        for _ in 0..2 {
            mock = mock.reply_json(Method::Delete, "/batch_delete", 200, &deleted());
        }
        let transport = Arc::new(mock);
        let lark = client(&transport);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 2)
            .unwrap_err();

        assert!(matches!(
            err,
            LarkError::ClearIncomplete {
                rounds: 2,
                remaining: 2
            }
        ));
        assert_eq!(delete_ranges(&transport).len(), 2);
    }

    #[test]
    fn test_clear_propagates_delete_failure() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_json(Method::Get, "/children", 200, &listing(3, false))
                .reply_json(
                    Method::Delete,
                    "/batch_delete",
                    200,
                    &envelope(1_770_002, "forbidden", Value::Null),
                ),
        );
        let lark = client(&transport);
        let credential = Credential::new("t");

        let err = lark
            .docx(&credential, RetryPolicy::default())
            .clear_document("doc", 500, 100)
            .unwrap_err();

        assert!(matches!(err, LarkError::Upstream { code: 1_770_002, .. }));
    }
}
