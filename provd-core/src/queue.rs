//! SQLite-backed job queue.
//!
//! The API enqueues, the worker claims, and results are written back onto
//! the job row. A job whose tool run failed still finishes (its result
//! carries `success = false`); the `failed` status is reserved for jobs
//! whose workflow never produced a result at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::job::{JobResult, ProvisionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

/// One `jobs` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: String,
    pub device_id: String,
    pub instance_name: String,
    pub requested_by: String,
    pub status: QueueStatus,
    pub result: Option<JobResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueuedJob {
    /// The provisioning request this job carries
    pub fn request(&self) -> ProvisionRequest {
        ProvisionRequest {
            device_id: self.device_id.clone(),
            instance_name: self.instance_name.clone(),
            user: self.requested_by.clone(),
        }
    }
}

#[derive(Clone)]
pub struct JobQueue {
    pool: SqlitePool,
}

impl JobQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Submit a new job
    pub async fn enqueue(&self, request: &ProvisionRequest) -> Result<QueuedJob> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO jobs (id, device_id, instance_name, requested_by, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.device_id)
        .bind(&request.instance_name)
        .bind(&request.user)
        .bind(QueueStatus::Queued)
        .bind(now.timestamp())
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;

        self.fetch(&id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id))
    }

    /// Atomically claim the oldest queued job, flipping it to `running`.
    /// Returns `None` when the queue is empty.
    pub async fn claim_next(&self) -> Result<Option<QueuedJob>> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, QueuedJobRow>(
            "UPDATE jobs SET status = ?, updated_at = ?
             WHERE id = (SELECT id FROM jobs WHERE status = ? ORDER BY rowid ASC LIMIT 1)
             RETURNING *",
        )
        .bind(QueueStatus::Running)
        .bind(now)
        .bind(QueueStatus::Queued)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into()))
    }

    /// Persist a finished job's result. Tool-level failures land here too;
    /// the stored result carries the success flag.
    pub async fn complete(&self, id: &str, result: &JobResult) -> Result<()> {
        let now = Utc::now().timestamp();

        let updated = sqlx::query(
            "UPDATE jobs
             SET status = ?, success = ?, output = ?, duration_seconds = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(QueueStatus::Finished)
        .bind(result.success)
        .bind(&result.output)
        .bind(result.duration_seconds)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// Mark a job failed because its workflow faulted before producing a
    /// result. The explanation is stored where the tool output would go.
    pub async fn fail(&self, id: &str, error: &str) -> Result<()> {
        let now = Utc::now().timestamp();

        let updated = sqlx::query(
            "UPDATE jobs
             SET status = ?, success = ?, output = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(QueueStatus::Failed)
        .bind(false)
        .bind(error)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// Get a single job by id
    pub async fn fetch(&self, id: &str) -> Result<Option<QueuedJob>> {
        let row = sqlx::query_as::<_, QueuedJobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.into()))
    }

    /// List jobs, newest first, optionally filtered by status
    pub async fn list(&self, status: Option<QueueStatus>) -> Result<Vec<QueuedJob>> {
        let mut query = "SELECT * FROM jobs WHERE 1=1".to_string();

        if status.is_some() {
            query.push_str(" AND status = ?");
        }

        query.push_str(" ORDER BY rowid DESC");

        let mut q = sqlx::query_as::<_, QueuedJobRow>(&query);

        if let Some(status) = &status {
            q = q.bind(status);
        }

        let rows = q.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }
}

// Internal row type for sqlx
#[derive(sqlx::FromRow)]
struct QueuedJobRow {
    id: String,
    device_id: String,
    instance_name: String,
    requested_by: String,
    status: QueueStatus,
    success: Option<bool>,
    output: Option<String>,
    duration_seconds: Option<f64>,
    created_at: i64,
    updated_at: i64,
}

impl From<QueuedJobRow> for QueuedJob {
    fn from(row: QueuedJobRow) -> Self {
        let result = match (row.success, row.output) {
            (Some(success), Some(output)) => Some(JobResult {
                success,
                output,
                duration_seconds: row.duration_seconds.unwrap_or(0.0),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            device_id: row.device_id,
            instance_name: row.instance_name,
            requested_by: row.requested_by,
            status: row.status,
            result,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_default(),
        }
    }
}
