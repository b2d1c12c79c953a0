use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_templates_root")]
    pub templates_root: PathBuf,

    #[serde(default = "default_terraform_bin")]
    pub terraform_bin: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("PROVD_DB_PATH") {
        return PathBuf::from(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".provd").join("provd.db")
}

fn default_templates_root() -> PathBuf {
    if let Ok(path) = std::env::var("PROVD_TEMPLATES_ROOT") {
        return PathBuf::from(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".provd").join("templates")
}

fn default_terraform_bin() -> String {
    std::env::var("PROVD_TERRAFORM_BIN").unwrap_or_else(|_| "terraform".to_string())
}

fn default_poll_interval() -> u64 {
    std::env::var("PROVD_WORKER_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2) // 2 seconds
}

fn default_step_timeout() -> u64 {
    std::env::var("PROVD_TERRAFORM_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600) // 10 minutes
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            templates_root: default_templates_root(),
            terraform_bin: default_terraform_bin(),
            poll_interval_secs: default_poll_interval(),
            step_timeout_secs: default_step_timeout(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}
