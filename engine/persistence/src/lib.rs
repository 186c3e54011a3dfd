//! # Persistence Layer
//!
//! Date-partitioned JSON snapshot storage for the osu! country archive.
//!
//! ## Architecture
//!
//! - **SnapshotStore**: resolves `<data>/[leaderboards/]<YYYY>/<MM>/<DD>.json`
//!   paths and writes whole files atomically
//! - **DateIndex**: the sorted, duplicate-free `index.json` per category
//!
//! ## Usage
//!
//! ```rust
//! use persistence::{create_local_store, Category};
//! use chrono::NaiveDate;
//! use tempfile::TempDir;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let store = create_local_store(temp_dir.path())?;
//!
//!     let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//!     store.write_snapshot(Category::Scores, today, &vec![1, 2, 3])?;
//!     store.upsert_index(Category::Scores, today)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod local;
pub mod snapshot;

pub use config::PersistenceConfig;
pub use error::{PersistenceError, Result};
pub use index::{DateIndex, DATE_FORMAT};
pub use local::{create_local_store, create_local_store_with_config};
pub use snapshot::{read_json_optional, write_json_atomic, Category, SnapshotStore};

/// Re-export common types for convenience
pub use chrono::NaiveDate;
