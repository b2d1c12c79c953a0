use crate::{error::ApiResult, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use provd_core::{ProvisionRequest, QueueStatus, QueuedJob};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/servers", post(submit_server))
        .route("/api/v1/jobs", get(list_jobs))
        .route("/api/v1/jobs/{id}", get(job_status))
}

/// Accept a provisioning request and hand it off to the queue. The actual
/// work happens in the worker; the caller polls the returned job id.
async fn submit_server(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job = state.queue.enqueue(&request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "provisioning started",
            "job_id": job.id
        })),
    ))
}

/// Status poll for one job. Unknown ids are reported in the body as
/// `not_found`, not as a 404; clients poll this endpoint with ids they were
/// handed at submission.
async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let body = match state.queue.fetch(&id).await? {
        Some(job) => json!({ "status": job.status, "result": job.result }),
        None => json!({ "status": "not_found", "result": null }),
    };

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
struct JobsQuery {
    status: Option<QueueStatus>,
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> ApiResult<Json<Vec<QueuedJob>>> {
    let jobs = state.queue.list(query.status).await?;

    Ok(Json(jobs))
}
