//! Terraform execution against a prepared workspace.
//!
//! The orchestrator only knows the [`Provisioner`] trait; the real
//! implementation shells out to the `terraform` CLI. Tool-level failures
//! (non-zero exit, step timeout) are part of the normal outcome, so callers
//! can audit them; only failures to invoke the tool at all are errors.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Default per-step timeout; `apply` against a cold provider can take
/// several minutes.
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(600);

/// Outcome of a full init-then-apply pass, as reported to the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutcome {
    pub success: bool,
    pub output: String,
    pub duration_seconds: f64,
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to spawn {binary} in {}: {source}", .path.display())]
    Spawn {
        binary: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Seam between the job orchestrator and the provisioning tool.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Run the tool's full lifecycle against a prepared workspace.
    async fn execute(
        &self,
        path: &Path,
        device_id: &str,
        instance_name: &str,
    ) -> Result<ExecOutcome, ExecError>;
}

struct StepOutput {
    success: bool,
    output: String,
}

/// Invokes the `terraform` CLI: `init` followed by `apply`, sequentially,
/// with `apply` skipped when `init` fails.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
    step_timeout: Duration,
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Whether the configured binary resolves on PATH
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    async fn run_step(&self, path: &Path, args: &[&str]) -> Result<StepOutput, ExecError> {
        let rendered = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %rendered, path = %path.display(), "running provisioning step");

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(args).current_dir(path).kill_on_drop(true);

        match tokio::time::timeout(self.step_timeout, cmd.output()).await {
            Err(_elapsed) => Ok(StepOutput {
                success: false,
                output: format!(
                    "{} timed out after {}s",
                    rendered,
                    self.step_timeout.as_secs()
                ),
            }),
            Ok(Err(source)) => Err(ExecError::Spawn {
                binary: self.binary.clone(),
                path: path.to_path_buf(),
                source,
            }),
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    if !combined.is_empty() && !combined.ends_with('\n') {
                        combined.push('\n');
                    }
                    combined.push_str(&stderr);
                }

                Ok(StepOutput {
                    success: output.status.success(),
                    output: combined,
                })
            }
        }
    }
}

#[async_trait]
impl Provisioner for TerraformCli {
    async fn execute(
        &self,
        path: &Path,
        device_id: &str,
        instance_name: &str,
    ) -> Result<ExecOutcome, ExecError> {
        let started = Instant::now();

        let init = self
            .run_step(path, &["init", "-input=false", "-no-color"])
            .await?;
        if !init.success {
            return Ok(ExecOutcome {
                success: false,
                output: init.output,
                duration_seconds: started.elapsed().as_secs_f64(),
            });
        }

        let device_var = format!("device_id={device_id}");
        let name_var = format!("instance_name={instance_name}");
        let apply = self
            .run_step(
                path,
                &[
                    "apply",
                    "-auto-approve",
                    "-input=false",
                    "-no-color",
                    "-var",
                    &device_var,
                    "-var",
                    &name_var,
                ],
            )
            .await?;

        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            path = %path.display(),
            success = apply.success,
            duration_seconds,
            "provisioning run finished"
        );

        Ok(ExecOutcome {
            success: apply.success,
            output: apply.output,
            duration_seconds,
        })
    }
}
