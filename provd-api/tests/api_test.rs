//! Integration tests for REST API endpoints
//!
//! Tests job submission, status polling (including the not-found contract),
//! queue listing, and the health endpoints.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use provd_core::{JobQueue, JobResult, QueueStatus, QueuedJob};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

#[tokio::test]
async fn test_submit_server_enqueues_job() {
    let pool = common::create_test_db().await;
    let app = common::create_test_app(pool.clone()).await;

    let req_body = common::provision_request("1001");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/servers")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&req_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["message"], "provisioning started");
    let job_id = body["job_id"].as_str().expect("job_id").to_string();

    // The job is really in the queue, untouched by any worker yet
    let job = JobQueue::new(pool)
        .fetch(&job_id)
        .await
        .expect("fetch")
        .expect("job");
    assert_eq!(job.status, QueueStatus::Queued);
    assert_eq!(job.device_id, "1001");
    assert_eq!(job.requested_by, "alice");
    assert!(job.result.is_none());
}

#[tokio::test]
async fn test_job_status_round_trip() {
    let pool = common::create_test_db().await;
    let job = common::fixture_job(&pool, "1001").await;
    let app = common::create_test_app(pool.clone()).await;

    // Freshly queued
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/jobs/{}", job.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "queued");
    assert_eq!(body["result"], Value::Null);

    // Worker finishes the job
    let queue = JobQueue::new(pool);
    queue.claim_next().await.expect("claim");
    queue
        .complete(
            &job.id,
            &JobResult {
                success: true,
                output: "Apply complete!".to_string(),
                duration_seconds: 30.5,
            },
        )
        .await
        .expect("complete");

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/jobs/{}", job.id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "finished");
    assert_eq!(body["result"]["success"], true);
    assert_eq!(body["result"]["output"], "Apply complete!");
}

#[tokio::test]
async fn test_unknown_job_reports_not_found_status() {
    let pool = common::create_test_db().await;
    let app = common::create_test_app(pool).await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/jobs/{}", uuid::Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Deliberately 200, not 404: clients poll this endpoint
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["result"], Value::Null);
}

#[tokio::test]
async fn test_list_jobs_endpoint() {
    let pool = common::create_test_db().await;
    common::fixture_job(&pool, "1").await;
    common::fixture_job(&pool, "2").await;
    common::fixture_job(&pool, "3").await;
    JobQueue::new(pool.clone()).claim_next().await.expect("claim");

    let app = common::create_test_app(pool).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/jobs")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let jobs: Vec<QueuedJob> = common::extract_json_body(response).await;
    assert_eq!(jobs.len(), 3);

    // Filtered by status
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/jobs?status=queued")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let jobs: Vec<QueuedJob> = common::extract_json_body(response).await;
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.status == QueueStatus::Queued));
}

#[tokio::test]
async fn test_submit_server_rejects_malformed_body() {
    let pool = common::create_test_db().await;
    let app = common::create_test_app(pool).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/servers")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"device_id": "1001"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health_endpoints() {
    let pool = common::create_test_db().await;
    let app = common::create_test_app(pool).await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "provd-api");

    let request = Request::builder()
        .method("GET")
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "connected");
}
