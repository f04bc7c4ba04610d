use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "http://localhost:3001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Snapshot file used when the API is down; the bundled snapshot otherwise.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            snapshot_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            base_url: var("CIVIC_API_BASE").unwrap_or_else(|| {
                tracing::info!("CIVIC_API_BASE not set, using default: {DEFAULT_API_BASE}");
                DEFAULT_API_BASE.to_string()
            }),
            snapshot_path: var("CIVIC_SNAPSHOT_PATH").map(PathBuf::from),
        }
    }
}
