//! Local file-based snapshot store constructors

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::snapshot::SnapshotStore;

/// Create a new snapshot store with default configuration
pub fn create_local_store(data_dir: impl Into<std::path::PathBuf>) -> Result<SnapshotStore> {
    SnapshotStore::new(PersistenceConfig::new(data_dir))
}

/// Create a new snapshot store with custom configuration
pub fn create_local_store_with_config(config: PersistenceConfig) -> Result<SnapshotStore> {
    SnapshotStore::new(config)
}
