//! Append-only audit trail for provisioning jobs.
//!
//! Every job writes a `create_started` row when it begins and exactly one
//! terminal row when it ends; rows are never updated or deleted. Provisioned
//! resources are recorded against the `create_started` row of the job that
//! created them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

/// Lifecycle states recorded in `request_logs.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    CreateStarted,
    Success,
    Failed,
    Error,
}

/// Terminal states only; keeps `create_started` out of terminal writes at
/// the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Success,
    Failed,
    Error,
}

impl From<TerminalStatus> for JobStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Success => JobStatus::Success,
            TerminalStatus::Failed => JobStatus::Failed,
            TerminalStatus::Error => JobStatus::Error,
        }
    }
}

/// One `request_logs` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub correlation_id: i64,
    pub user: String,
    pub status: JobStatus,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One `resources` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: i64,
    pub log_id: i64,
    pub resource_type: String,
    pub resource_name: String,
    pub resource_id_value: String,
    pub created_at: DateTime<Utc>,
}

/// A failed audit write means the trail no longer reflects what happened;
/// this error is never folded into a job result.
#[derive(Error, Debug)]
#[error("Audit write failed: {0}")]
pub struct AuditError(#[from] sqlx::Error);

#[derive(Clone)]
pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert the job's `create_started` row. The returned row id keys the
    /// job's resource record on success.
    pub async fn record_start(&self, correlation_id: i64, user: &str) -> Result<i64, AuditError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO request_logs (request_id, user_id, status, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(correlation_id)
        .bind(user)
        .bind(JobStatus::CreateStarted)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert the job's terminal row
    pub async fn record_terminal(
        &self,
        correlation_id: i64,
        user: &str,
        status: TerminalStatus,
        duration_seconds: Option<f64>,
        error_message: Option<&str>,
    ) -> Result<i64, AuditError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO request_logs (request_id, user_id, status, duration_seconds, error_message, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(correlation_id)
        .bind(user)
        .bind(JobStatus::from(status))
        .bind(duration_seconds)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Record a provisioned resource against the job's `create_started` row
    pub async fn record_resource(
        &self,
        log_id: i64,
        resource_type: &str,
        resource_name: &str,
        resource_id_value: &str,
    ) -> Result<i64, AuditError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO resources (log_id, resource_type, resource_name, resource_id_value, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(log_id)
        .bind(resource_type)
        .bind(resource_name)
        .bind(resource_id_value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All audit rows for one correlation id, oldest first
    pub async fn records_for(&self, correlation_id: i64) -> Result<Vec<JobRecord>, AuditError> {
        let rows = sqlx::query_as::<_, JobRecordRow>(
            "SELECT * FROM request_logs WHERE request_id = ? ORDER BY id ASC",
        )
        .bind(correlation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }

    /// Resources recorded against one `create_started` row
    pub async fn resources_for(&self, log_id: i64) -> Result<Vec<ResourceRecord>, AuditError> {
        let rows = sqlx::query_as::<_, ResourceRecordRow>(
            "SELECT * FROM resources WHERE log_id = ? ORDER BY id ASC",
        )
        .bind(log_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }
}

// Internal row types for sqlx
#[derive(sqlx::FromRow)]
struct JobRecordRow {
    id: i64,
    request_id: i64,
    user_id: String,
    status: JobStatus,
    duration_seconds: Option<f64>,
    error_message: Option<String>,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct ResourceRecordRow {
    id: i64,
    log_id: i64,
    resource_type: String,
    resource_name: String,
    resource_id_value: String,
    created_at: i64,
}

impl From<JobRecordRow> for JobRecord {
    fn from(row: JobRecordRow) -> Self {
        Self {
            id: row.id,
            correlation_id: row.request_id,
            user: row.user_id,
            status: row.status,
            duration_seconds: row.duration_seconds,
            error_message: row.error_message,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        }
    }
}

impl From<ResourceRecordRow> for ResourceRecord {
    fn from(row: ResourceRecordRow) -> Self {
        Self {
            id: row.id,
            log_id: row.log_id,
            resource_type: row.resource_type,
            resource_name: row.resource_name,
            resource_id_value: row.resource_id_value,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        }
    }
}
