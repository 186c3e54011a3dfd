//! Per-user pp gained today, read back from the day's score snapshot

use crate::models::UserId;
use chrono::NaiveDate;
use persistence::{Category, SnapshotStore};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// The slice of a score snapshot the aggregator needs
#[derive(Debug, Default, Deserialize)]
struct SnapshotScores {
    #[serde(default)]
    scores: Vec<ScorePp>,
}

#[derive(Debug, Deserialize)]
struct ScorePp {
    user_id: UserId,
    pp: Option<f64>,
}

/// Raw sum of pp per user for one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPp {
    by_user: HashMap<UserId, f64>,
}

impl DailyPp {
    /// Sum `(user_id, pp)` pairs; unranked plays (no pp) count as 0
    pub fn from_scores(scores: impl IntoIterator<Item = (UserId, Option<f64>)>) -> Self {
        let mut by_user = HashMap::new();
        for (user_id, pp) in scores {
            *by_user.entry(user_id).or_insert(0.0) += pp.unwrap_or(0.0);
        }
        Self { by_user }
    }

    /// Aggregate the score snapshot for `date`
    ///
    /// A snapshot that does not exist yet, or cannot be read, yields an empty
    /// aggregate: the leaderboard may run before the day's scores are in.
    pub fn load(store: &SnapshotStore, date: NaiveDate) -> Self {
        match store.read_snapshot::<SnapshotScores>(Category::Scores, date) {
            Ok(Some(snapshot)) => {
                let daily = Self::from_scores(snapshot.scores.into_iter().map(|s| (s.user_id, s.pp)));
                info!("Daily pp available for {} players on {}", daily.len(), date);
                daily
            }
            Ok(None) => {
                info!("No score snapshot for {} yet, daily pp defaults to 0", date);
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable score snapshot for {}: {}", date, e);
                Self::default()
            }
        }
    }

    /// pp gained by `user_id`, 0 when the user has no scores today
    pub fn get(&self, user_id: UserId) -> f64 {
        self.by_user.get(&user_id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::create_local_store;
    use serde_json::json;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_sums_pp_per_user() {
        let daily = DailyPp::from_scores([(5, Some(100.0)), (6, Some(50.0)), (5, Some(150.0))]);

        assert_eq!(daily.get(5), 250.0);
        assert_eq!(daily.get(6), 50.0);
        assert_eq!(daily.get(7), 0.0);
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn test_load_reads_score_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_local_store(temp_dir.path()).unwrap();
        store
            .write_snapshot(
                Category::Scores,
                day(),
                &json!({
                    "date": "2024-05-01",
                    "country": "IQ",
                    "generated_at": "2024-05-01T23:00:00.000Z",
                    "scores": [
                        {"user_id": 5, "pp": 100.0, "score_id": 1},
                        {"user_id": 6, "pp": 50.0, "score_id": 2},
                        {"user_id": 5, "pp": 150.0, "score_id": 3},
                        {"user_id": 8, "pp": null, "score_id": 4}
                    ]
                }),
            )
            .unwrap();

        let daily = DailyPp::load(&store, day());
        assert_eq!(daily.get(5), 250.0);
        assert_eq!(daily.get(6), 50.0);
        assert_eq!(daily.get(8), 0.0);
        assert_eq!(daily.get(1234), 0.0);
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_local_store(temp_dir.path()).unwrap();

        let daily = DailyPp::load(&store, day());
        assert!(daily.is_empty());
        assert_eq!(daily.get(5), 0.0);
    }

    #[test]
    fn test_corrupt_snapshot_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_local_store(temp_dir.path()).unwrap();
        let path = store.snapshot_path(Category::Scores, day());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ truncated").unwrap();

        assert!(DailyPp::load(&store, day()).is_empty());
    }
}
