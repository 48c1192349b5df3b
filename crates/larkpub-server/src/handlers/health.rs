//! Health API endpoint.

use axum::Json;
use serde::Serialize;

/// Response for GET /api/health.
#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

/// Handle GET /api/health.
pub(crate) async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
