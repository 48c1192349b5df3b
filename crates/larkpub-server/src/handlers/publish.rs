//! Publish trigger endpoint.
//!
//! Rewrites every configured document with the current report.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use larkpub_config::Region;
use larkpub_docx::{PublishError, PublishOutcome, PublishStep};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{ServerError, error_chain};
use crate::state::AppState;

const SUCCESS_MESSAGE: &str = "Image inserted successfully";

/// Outcome of one target.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum TargetResult {
    Published(PublishOutcome),
    Failed {
        document_id: String,
        region: Region,
        step: PublishStep,
        error: String,
    },
}

impl From<&PublishError> for TargetResult {
    fn from(err: &PublishError) -> Self {
        Self::Failed {
            document_id: err.document_id.clone(),
            region: err.region,
            step: err.step,
            error: error_chain(err).join(": "),
        }
    }
}

/// Response for a fully successful POST /api/insert_image.
#[derive(Debug, Serialize)]
pub(crate) struct InsertImageResponse {
    message: &'static str,
    results: Vec<TargetResult>,
}

/// Handle POST /api/insert_image.
///
/// Answers 409 while an earlier trigger is still publishing. The lock moves
/// into the blocking task, so a dropped request keeps it until the run ends.
pub(crate) async fn insert_image(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsertImageResponse>, ServerError> {
    let Ok(running) = Arc::clone(&state.publish_lock).try_lock_owned() else {
        warn!("Publish already running, rejecting trigger");
        return Err(ServerError::Busy);
    };
    info!(targets = state.targets.len(), "Publish triggered");

    let worker = Arc::clone(&state);
    let outcomes = tokio::task::spawn_blocking(move || {
        let _running = running;
        worker.publish_all()
    })
    .await?;

    let first_failure = outcomes.iter().find_map(|r| r.as_ref().err()).map(|err| {
        let trace = error_chain(err);
        error!(error = %trace.join(": "), "Publish failed");
        (err.to_string(), trace)
    });

    let results: Vec<TargetResult> = outcomes
        .into_iter()
        .map(|r| match r {
            Ok(outcome) => TargetResult::Published(outcome),
            Err(err) => TargetResult::from(&err),
        })
        .collect();

    match first_failure {
        Some((error, trace)) => Err(ServerError::Publish {
            error,
            trace,
            results,
        }),
        None => Ok(Json(InsertImageResponse {
            message: SUCCESS_MESSAGE,
            results,
        })),
    }
}
