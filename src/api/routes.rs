//! HTTP surface: one intake endpoint and one status endpoint. The API is
//! a thin shell over [`ReportPipeline`]; all semantics live below it.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::ProcessingState;
use crate::pipeline::ReportPipeline;
use crate::tracker::StatusSnapshot;

use super::error::ApiError;

pub fn router(pipeline: Arc<ReportPipeline>) -> Router {
    Router::new()
        .route("/api/reports", post(submit_report))
        .route("/api/reports/:id/status", get(report_status))
        .with_state(pipeline)
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    area: String,
    format: String,
    #[serde(default = "default_principal")]
    principal: String,
    /// Document bytes, base64-encoded.
    data: String,
}

fn default_principal() -> String {
    "anonymous".to_string()
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    submission_id: Uuid,
    state: ProcessingState,
}

async fn submit_report(
    State(pipeline): State<Arc<ReportPipeline>>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let bytes = BASE64
        .decode(request.data.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("data is not valid base64: {e}")))?;

    let submission_id = pipeline.submit(
        &request.area,
        &request.format,
        bytes,
        &request.principal,
    )?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            submission_id,
            state: ProcessingState::Queued,
        }),
    ))
}

async fn report_status(
    State(pipeline): State<Arc<ReportPipeline>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    Ok(Json(pipeline.status(id)?))
}
