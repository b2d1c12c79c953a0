//! Common test utilities and helpers for provd-api tests.

#![allow(dead_code)]

use axum::Router;
use provd_core::{JobQueue, ProvisionRequest, QueuedJob};
use sqlx::SqlitePool;

/// Helper to create an in-memory test database with migrations
pub async fn create_test_db() -> SqlitePool {
    provd_core::test_utils::create_test_pool().await
}

/// Create a test app with the given database pool
pub async fn create_test_app(pool: SqlitePool) -> Router {
    provd_api::create_app(pool)
        .await
        .expect("Failed to create test app")
}

/// Create a provisioning request with default values
pub fn provision_request(device_id: &str) -> ProvisionRequest {
    ProvisionRequest {
        device_id: device_id.to_string(),
        instance_name: "web-01".to_string(),
        user: "alice".to_string(),
    }
}

/// Fixture: enqueue a job directly through the queue
pub async fn fixture_job(pool: &SqlitePool, device_id: &str) -> QueuedJob {
    JobQueue::new(pool.clone())
        .enqueue(&provision_request(device_id))
        .await
        .expect("Failed to enqueue fixture job")
}

/// Helper to extract JSON body from axum response
pub async fn extract_json_body<T>(response: axum::response::Response) -> T
where
    T: serde::de::DeserializeOwned,
{
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    serde_json::from_slice(&body).expect("Failed to deserialize JSON")
}
