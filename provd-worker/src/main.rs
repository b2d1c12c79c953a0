mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use provd_core::{
    bridge, db, AuditLog, JobOrchestrator, JobQueue, QueuedJob, TerraformCli, WorkspaceManager,
};
use tracing::{error, info, warn};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("provd_worker=debug,provd_core=debug")
        .init();

    info!("Starting provd-worker...");

    // Load configuration
    let config = WorkerConfig::from_env();
    info!(
        "Configuration loaded: db_path={}, templates_root={}, terraform_bin={}",
        config.db_path.display(),
        config.templates_root.display(),
        config.terraform_bin
    );

    let terraform = TerraformCli::new(&config.terraform_bin)
        .with_step_timeout(Duration::from_secs(config.step_timeout_secs));
    if !terraform.is_available() {
        warn!(
            "{} not found on PATH; jobs will fail until it is installed",
            config.terraform_bin
        );
    }

    // Backup, connect, migrate
    let pool = db::bootstrap(&config.db_path).await?;
    info!("Database ready at {}", config.db_path.display());

    let queue = JobQueue::new(pool.clone());
    let orchestrator = JobOrchestrator::new(
        AuditLog::new(pool),
        WorkspaceManager::new(&config.templates_root),
        Arc::new(terraform),
    );

    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    info!(
        "Worker ready, polling every {}s",
        config.poll_interval_secs
    );

    loop {
        match queue.claim_next().await {
            Ok(Some(job)) => run_job(&queue, &orchestrator, job).await,
            Ok(None) => tokio::time::sleep(poll_interval).await,
            Err(err) => {
                error!("Failed to claim next job: {}", err);
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// Execute one claimed job and persist its outcome.
///
/// Jobs run as non-suspending work units: the closure handed to
/// `spawn_blocking` is a plain function call, and the blocking bridge owns
/// the scheduler the async workflow runs on.
async fn run_job(queue: &JobQueue, orchestrator: &JobOrchestrator, job: QueuedJob) {
    info!(
        job_id = %job.id,
        device_id = %job.device_id,
        instance_name = %job.instance_name,
        "claimed provisioning job"
    );

    let request = job.request();
    let runner = orchestrator.clone();
    let outcome = tokio::task::spawn_blocking(move || bridge::run_blocking(runner, request)).await;

    let stored = match outcome {
        Ok(Ok(result)) => {
            info!(job_id = %job.id, success = result.success, "job finished");
            queue.complete(&job.id, &result).await
        }
        Ok(Err(bridge_err)) => {
            error!(job_id = %job.id, "provisioning workflow faulted: {}", bridge_err);
            queue.fail(&job.id, &bridge_err.to_string()).await
        }
        Err(join_err) => {
            error!(job_id = %job.id, "job dispatch panicked: {}", join_err);
            queue.fail(&job.id, "job dispatch panicked").await
        }
    };

    if let Err(err) = stored {
        error!(job_id = %job.id, "failed to persist job outcome: {}", err);
    }
}
