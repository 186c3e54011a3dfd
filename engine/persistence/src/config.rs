//! Configuration for the persistence layer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the snapshot store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Base directory for all snapshot and index files
    pub data_dir: PathBuf,

    /// Sub-directory (under `data_dir`) holding leaderboard snapshots
    pub leaderboards_dir: String,

    /// File name of the per-category date index
    pub index_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            leaderboards_dir: "leaderboards".to_string(),
            index_file: "index.json".to_string(),
        }
    }
}

impl PersistenceConfig {
    /// Create a new configuration with custom data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Default::default() }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }

        let dir = self.leaderboards_dir.trim();
        if dir.is_empty() || dir.contains(|c| c == '/' || c == '\\') {
            return Err(format!(
                "leaderboards_dir must be a single path segment, got {:?}",
                self.leaderboards_dir
            ));
        }

        if !self.index_file.ends_with(".json") {
            return Err(format!("index_file must be a .json file, got {:?}", self.index_file));
        }

        Ok(())
    }
}
