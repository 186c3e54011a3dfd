//! Date-partitioned snapshot store
//!
//! Every category keeps one JSON file per day at
//! `<data_dir>/[<category dir>/]<YYYY>/<MM>/<DD>.json` plus an `index.json`
//! listing the days that exist. Writes replace whole files via a temporary
//! sibling and a rename, so readers never observe a half-written snapshot.

use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, Result};
use crate::index::{DateIndex, DATE_FORMAT};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Kind of data a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Recent scores, stored directly under the data directory
    Scores,
    /// Composite leaderboard rows, stored under the leaderboards directory
    Leaderboards,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Scores => write!(f, "scores"),
            Category::Leaderboards => write!(f, "leaderboards"),
        }
    }
}

/// Snapshot store rooted at a data directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    config: PersistenceConfig,
}

impl SnapshotStore {
    /// Create a new snapshot store
    pub fn new(config: PersistenceConfig) -> Result<Self> {
        config.validate().map_err(PersistenceError::config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Root directory of a category
    pub fn category_dir(&self, category: Category) -> PathBuf {
        match category {
            Category::Scores => self.config.data_dir.clone(),
            Category::Leaderboards => self.config.data_dir.join(&self.config.leaderboards_dir),
        }
    }

    /// Path of the snapshot file for `date`
    pub fn snapshot_path(&self, category: Category, date: NaiveDate) -> PathBuf {
        self.category_dir(category)
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}.json", date.day()))
    }

    /// Path of the category's date index
    pub fn index_path(&self, category: Category) -> PathBuf {
        self.category_dir(category).join(&self.config.index_file)
    }

    /// Write the snapshot for `date`, replacing any previous one
    pub fn write_snapshot<T: Serialize + ?Sized>(
        &self,
        category: Category,
        date: NaiveDate,
        payload: &T,
    ) -> Result<PathBuf> {
        let path = self.snapshot_path(category, date);
        write_json_atomic(&path, payload)?;

        tracing::info!("Wrote {} snapshot for {} to {:?}", category, date, path);
        Ok(path)
    }

    /// Read the snapshot for `date`, `None` if it has not been written
    pub fn read_snapshot<T: DeserializeOwned>(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> Result<Option<T>> {
        read_json_optional(&self.snapshot_path(category, date))
    }

    /// Load the category's index; a missing file is an empty index
    pub fn read_index(&self, category: Category) -> Result<DateIndex> {
        Ok(read_json_optional(&self.index_path(category))?.unwrap_or_default())
    }

    /// Record `date` in the category's index
    ///
    /// Returns `true` when the date was not listed before. The index is
    /// rewritten either way so that hand-edited files come back sorted.
    pub fn upsert_index(&self, category: Category, date: NaiveDate) -> Result<bool> {
        let path = self.index_path(category);
        let mut index = self.read_index(category)?;
        let added = index.insert(date);
        write_json_atomic(&path, &index)?;

        if added {
            tracing::info!(
                "Added {} to {} index ({} dates)",
                date.format(DATE_FORMAT),
                category,
                index.len()
            );
        } else {
            tracing::debug!("{} index already lists {}", category, date.format(DATE_FORMAT));
        }
        Ok(added)
    }

    /// Write a non-dated document relative to the data directory
    pub fn write_document<T: Serialize + ?Sized>(
        &self,
        relative_path: impl AsRef<Path>,
        payload: &T,
    ) -> Result<PathBuf> {
        let path = self.config.data_dir.join(relative_path);
        write_json_atomic(&path, payload)?;
        Ok(path)
    }
}

/// Serialize `payload` as pretty JSON into `path` via a temp file and rename
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, payload: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let written = write_temp(&temp_path, payload)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| PersistenceError::io(path, e)));

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

fn write_temp<T: Serialize + ?Sized>(temp_path: &Path, payload: &T) -> Result<()> {
    let file = File::create(temp_path).map_err(|e| PersistenceError::io(temp_path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, payload)
        .map_err(|e| PersistenceError::serialization(temp_path, e))?;
    writer.flush().map_err(|e| PersistenceError::io(temp_path, e))
}

/// Deserialize JSON from `path`, `None` if the file does not exist
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };

    let value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PersistenceError::serialization(path, e))?;
    Ok(Some(value))
}
