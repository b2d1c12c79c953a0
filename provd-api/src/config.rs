use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_bind_addr() -> String {
    std::env::var("PROVD_API_BIND").unwrap_or_else(|_| "0.0.0.0:8311".to_string())
}

fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("PROVD_DB_PATH") {
        return PathBuf::from(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".provd").join("provd.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
