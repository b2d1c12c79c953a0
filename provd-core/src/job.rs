//! Provisioning job lifecycle.
//!
//! One [`JobOrchestrator::run`] call drives a job from `create_started`
//! through workspace preparation and tool execution to a single terminal
//! audit row. Workspace and tool failures are expected outcomes and come
//! back as a normal [`JobResult`]; only audit-trail faults escape as errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::audit::{AuditError, AuditLog, TerminalStatus};
use crate::identity::resolve_correlation_id;
use crate::terraform::Provisioner;
use crate::workspace::WorkspaceManager;

/// Resource type recorded for provisioned servers
pub const RESOURCE_TYPE_EC2: &str = "EC2";

/// A request to provision one server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub device_id: String,
    pub instance_name: String,
    pub user: String,
}

/// What a finished job reports back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    pub output: String,
    pub duration_seconds: f64,
}

impl JobResult {
    /// Result for a job that never reached tool execution
    fn aborted(output: String) -> Self {
        Self {
            success: false,
            output,
            duration_seconds: 0.0,
        }
    }
}

/// Ties identity resolution, workspace preparation, tool execution and audit
/// recording together. All collaborators are injected.
#[derive(Clone)]
pub struct JobOrchestrator {
    audit: AuditLog,
    workspaces: WorkspaceManager,
    provisioner: Arc<dyn Provisioner>,
}

impl JobOrchestrator {
    pub fn new(
        audit: AuditLog,
        workspaces: WorkspaceManager,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            audit,
            workspaces,
            provisioner,
        }
    }

    /// Run one provisioning job to its terminal state.
    ///
    /// Writes exactly one `create_started` row and exactly one terminal row
    /// per invocation. The error path is reserved for audit failures; every
    /// other failure is reported inside the returned [`JobResult`].
    pub async fn run(&self, request: ProvisionRequest) -> Result<JobResult, AuditError> {
        let correlation_id = resolve_correlation_id(&request.device_id);
        info!(
            device_id = %request.device_id,
            correlation_id,
            instance_name = %request.instance_name,
            user = %request.user,
            "provisioning job started"
        );

        let log_id = self.audit.record_start(correlation_id, &request.user).await?;

        let workspace = match self
            .workspaces
            .prepare(&request.device_id, &request.instance_name)
        {
            Ok(path) => path,
            Err(err) => {
                let message = err.to_string();
                warn!(correlation_id, error = %message, "workspace preparation failed");
                self.audit
                    .record_terminal(
                        correlation_id,
                        &request.user,
                        TerminalStatus::Error,
                        None,
                        Some(&message),
                    )
                    .await?;
                return Ok(JobResult::aborted(message));
            }
        };

        match self
            .provisioner
            .execute(&workspace, &request.device_id, &request.instance_name)
            .await
        {
            Ok(outcome) => {
                let status = if outcome.success {
                    TerminalStatus::Success
                } else {
                    TerminalStatus::Failed
                };
                let error_message = (!outcome.success).then_some(outcome.output.as_str());

                self.audit
                    .record_terminal(
                        correlation_id,
                        &request.user,
                        status,
                        Some(outcome.duration_seconds),
                        error_message,
                    )
                    .await?;

                if outcome.success {
                    self.audit
                        .record_resource(
                            log_id,
                            RESOURCE_TYPE_EC2,
                            &request.instance_name,
                            &request.device_id,
                        )
                        .await?;
                    info!(
                        correlation_id,
                        duration_seconds = outcome.duration_seconds,
                        "provisioning succeeded"
                    );
                } else {
                    warn!(
                        correlation_id,
                        duration_seconds = outcome.duration_seconds,
                        "provisioning failed"
                    );
                }

                Ok(JobResult {
                    success: outcome.success,
                    output: outcome.output,
                    duration_seconds: outcome.duration_seconds,
                })
            }
            Err(err) => {
                let message = format!("Unhandled error: {err}");
                error!(correlation_id, error = %message, "provisioning aborted");
                self.audit
                    .record_terminal(
                        correlation_id,
                        &request.user,
                        TerminalStatus::Error,
                        None,
                        Some(&message),
                    )
                    .await?;
                Ok(JobResult::aborted(message))
            }
        }
    }
}
