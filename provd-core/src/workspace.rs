//! Per-device Terraform workspaces.
//!
//! Every device id owns one directory under the templates root. Preparing a
//! job renders the root Terraform configuration into that directory; jobs
//! sharing a device id share the workspace, and the latest render wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

/// Shared template engine for workspace configuration files
static WORKSPACE_TERA: OnceLock<Tera> = OnceLock::new();

fn get_workspace_tera() -> &'static Tera {
    WORKSPACE_TERA.get_or_init(|| {
        const MAIN_TF_TEMPLATE: &str = r#"terraform {
  required_version = ">= 1.5"

  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

provider "aws" {
  region = var.aws_region
}

resource "aws_instance" "server" {
  ami           = var.ami_id
  instance_type = var.instance_type

  tags = {
    Name      = "{{ instance_name }}"
    DeviceId  = "{{ device_id }}"
    ManagedBy = "provd"
  }
}

output "instance_id" {
  value = aws_instance.server.id
}
"#;

        const VARIABLES_TF_TEMPLATE: &str = r#"variable "device_id" {
  type    = string
  default = "{{ device_id }}"
}

variable "instance_name" {
  type    = string
  default = "{{ instance_name }}"
}

variable "aws_region" {
  type    = string
  default = "us-east-1"
}

variable "instance_type" {
  type    = string
  default = "t3.micro"
}

variable "ami_id" {
  type    = string
  default = "ami-0c101f26f147fa7fd"
}
"#;

        let mut tera = Tera::default();
        tera.add_raw_template("main.tf", MAIN_TF_TEMPLATE)
            .expect("Failed to add main.tf template");
        tera.add_raw_template("variables.tf", VARIABLES_TF_TEMPLATE)
            .expect("Failed to add variables.tf template");
        tera
    })
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Invalid device id {device_id:?}: {reason}")]
    InvalidDeviceId {
        device_id: String,
        reason: &'static str,
    },

    #[error("Template render failed: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Maps device ids to isolated working directories and materializes the
/// Terraform root configuration into them.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    templates_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Self {
            templates_root: templates_root.into(),
        }
    }

    /// Root directory under which all device workspaces live
    pub fn templates_root(&self) -> &Path {
        &self.templates_root
    }

    /// Directory a device id maps to, without touching the filesystem
    pub fn workspace_path(&self, device_id: &str) -> PathBuf {
        self.templates_root.join(device_id)
    }

    /// Validate the device id and materialize its workspace.
    ///
    /// Creates the directory if needed and (re)writes the configuration
    /// files. Prior contents are overwritten, never inspected, so repeat
    /// calls with the same inputs are idempotent.
    pub fn prepare(&self, device_id: &str, instance_name: &str) -> Result<PathBuf, WorkspaceError> {
        validate_device_id(device_id)?;

        let workspace = self.workspace_path(device_id);
        fs::create_dir_all(&workspace).map_err(|source| WorkspaceError::Io {
            path: workspace.clone(),
            source,
        })?;

        let mut context = Context::new();
        context.insert("device_id", device_id);
        context.insert("instance_name", instance_name);

        let tera = get_workspace_tera();
        for name in ["main.tf", "variables.tf"] {
            let content = tera.render(name, &context)?;
            let path = workspace.join(name);
            fs::write(&path, content).map_err(|source| WorkspaceError::Io { path, source })?;
        }

        debug!(
            device_id,
            workspace = %workspace.display(),
            "workspace materialized"
        );

        Ok(workspace)
    }
}

/// Device ids become path segments; reject anything that could escape the
/// templates root.
pub fn validate_device_id(device_id: &str) -> Result<(), WorkspaceError> {
    let invalid = |reason| WorkspaceError::InvalidDeviceId {
        device_id: device_id.to_string(),
        reason,
    };

    if device_id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if device_id == "." || device_id == ".." {
        return Err(invalid("must not be a relative path segment"));
    }
    if !device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid(
            "only ASCII letters, digits, '-', '_' and '.' are allowed",
        ));
    }

    Ok(())
}
