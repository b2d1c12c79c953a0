//! Blocking entry point for callers that cannot suspend.
//!
//! The queue worker dispatches jobs as plain function calls, but the
//! provisioning workflow is async. [`run_blocking`] hosts the workflow on a
//! scheduler scoped to the call: a fresh current-thread runtime when the
//! caller has none, or a dedicated thread with its own runtime when the
//! caller already sits inside one (building and blocking on a runtime there
//! would panic).

use thiserror::Error;
use tokio::runtime::{Builder, Handle};
use tracing::debug;

use crate::audit::AuditError;
use crate::job::{JobOrchestrator, JobResult, ProvisionRequest};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("Failed to build job runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Provisioning thread panicked")]
    ThreadPanic,
}

/// Run one provisioning job to completion, blocking until it is done.
///
/// Exactly one orchestrator invocation happens per call, on either path,
/// and the runtime hosting the job is torn down before this returns.
pub fn run_blocking(
    orchestrator: JobOrchestrator,
    request: ProvisionRequest,
) -> Result<JobResult, BridgeError> {
    if Handle::try_current().is_ok() {
        debug!("ambient runtime detected, dispatching job to dedicated thread");
        let worker = std::thread::Builder::new()
            .name("provd-job".to_string())
            .spawn(move || block_on_fresh_runtime(orchestrator, request))
            .map_err(BridgeError::Runtime)?;

        worker.join().map_err(|_| BridgeError::ThreadPanic)?
    } else {
        block_on_fresh_runtime(orchestrator, request)
    }
}

fn block_on_fresh_runtime(
    orchestrator: JobOrchestrator,
    request: ProvisionRequest,
) -> Result<JobResult, BridgeError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(BridgeError::Runtime)?;

    let result = runtime.block_on(orchestrator.run(request))?;

    Ok(result)
}
