//! Server provisioning business logic
//!
//! This crate contains the core lifecycle for provisioning jobs: correlation
//! id resolution, per-device Terraform workspaces, tool execution, the
//! append-only audit trail, and the queue the HTTP service and worker share.
//! It is consumed by the provd-api HTTP service and the provd-worker queue
//! worker, but can also back CLI commands or other entry points.

pub mod audit;
pub mod bridge;
pub mod db;
pub mod error;
pub mod identity;
pub mod job;
pub mod queue;
pub mod terraform;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use audit::{AuditError, AuditLog, JobRecord, JobStatus, ResourceRecord, TerminalStatus};
pub use bridge::{run_blocking, BridgeError};
pub use error::{CoreError, Result};
pub use identity::resolve_correlation_id;
pub use job::{JobOrchestrator, JobResult, ProvisionRequest, RESOURCE_TYPE_EC2};
pub use queue::{JobQueue, QueueStatus, QueuedJob};
pub use terraform::{ExecError, ExecOutcome, Provisioner, TerraformCli};
pub use workspace::{WorkspaceError, WorkspaceManager};
