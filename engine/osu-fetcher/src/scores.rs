//! Recent-score collection (`fetch-daily`)

use crate::batch::{fan_out, run_batches, BatchPlan, BatchReport};
use crate::client::{FetchOutcome, OsuApi};
use crate::config::FetcherConfig;
use crate::models::{BeatmapsetSummary, DailySnapshot, RawRecentScore, ScoreRecord, UserId};
use crate::rankings::{collect_user_ids, RankingQuery};
use chrono::{DateTime, NaiveDate, Utc};
use persistence::{Category, SnapshotStore};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// A recent score that lacks a field the snapshot needs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("score {score_id} is missing {field}")]
pub struct NormalizeError {
    pub score_id: u64,
    pub field: &'static str,
}

/// Map one raw recent score to a [`ScoreRecord`]
///
/// Only a missing nested object is an error; null scalars are carried over.
pub fn normalize_score(raw: RawRecentScore, country: &str) -> Result<ScoreRecord, NormalizeError> {
    let score_id = raw.id;
    let missing = |field: &'static str| NormalizeError { score_id, field };

    let user = raw.user.ok_or_else(|| missing("user"))?;
    let beatmapset = raw.beatmapset.ok_or_else(|| missing("beatmapset"))?;
    let cover = beatmapset
        .covers
        .and_then(|covers| covers.card)
        .ok_or_else(|| missing("beatmapset.covers.card"))?;

    Ok(ScoreRecord {
        user: user.username,
        user_id: user.id,
        country: country.to_string(),
        score_id: raw.id,
        rank: raw.rank,
        accuracy: raw.accuracy,
        pp: raw.pp,
        mods: raw.mods.iter().map(|m| m.acronym().to_string()).collect(),
        combo: raw.max_combo,
        created_at: raw.created_at,
        beatmapset: BeatmapsetSummary { id: beatmapset.id, title: beatmapset.title, cover },
    })
}

/// Map all of one user's recent scores; a single bad record drops the list
pub fn normalize_user_scores(
    raw: Vec<RawRecentScore>,
    country: &str,
) -> Result<Vec<ScoreRecord>, NormalizeError> {
    raw.into_iter().map(|score| normalize_score(score, country)).collect()
}

/// Key by score id (last one wins) and sort newest first
///
/// Scores without a parseable `created_at` go last.
pub fn dedupe_and_sort(scores: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    let by_id: HashMap<u64, ScoreRecord> =
        scores.into_iter().map(|score| (score.score_id, score)).collect();

    let mut unique: Vec<ScoreRecord> = by_id.into_values().collect();
    unique.sort_by_cached_key(|score| std::cmp::Reverse(score.played_at()));
    unique
}

/// Outcome of one `fetch-daily` run
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub date: NaiveDate,
    pub users: usize,
    pub scores: usize,
    pub failed_pages: Vec<u32>,
    pub failed_users: Vec<UserId>,
    pub batches: BatchReport,
    pub snapshot_path: PathBuf,
    pub index_updated: bool,
}

/// Collects the day's recent scores for every ranked and manually listed user
pub struct ScoreCollector<'a, A: OsuApi + ?Sized> {
    api: &'a A,
    config: &'a FetcherConfig,
    store: &'a SnapshotStore,
}

/// Per-user result inside a batch
enum UserScores {
    Collected(Vec<ScoreRecord>),
    Dropped(UserId),
}

impl<'a, A: OsuApi + ?Sized> ScoreCollector<'a, A> {
    pub fn new(api: &'a A, config: &'a FetcherConfig, store: &'a SnapshotStore) -> Self {
        Self { api, config, store }
    }

    /// Fetch, normalize, merge and persist the snapshot for `date`
    pub async fn run(
        &self,
        date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> crate::error::Result<CollectionSummary> {
        let settings = &self.config.scores;
        let query = RankingQuery {
            country: &self.config.country,
            mode: &self.config.mode,
            pages: settings.pages_to_scan,
            page_delay: settings.page_delay(),
        };
        let collection = collect_user_ids(self.api, &query, &settings.manual_user_ids).await;
        let user_ids: Vec<UserId> = collection.user_ids.into_iter().collect();

        let plan = BatchPlan::new(settings.batch_size, settings.batch_delay());
        let collector = self;
        let (per_user, batches) = run_batches("recent scores", &user_ids, plan, move |_, batch| {
            fan_out(batch, move |&user_id| collector.fetch_user(user_id))
        })
        .await;

        let mut collected = Vec::new();
        let mut failed_users = Vec::new();
        for result in per_user {
            match result {
                UserScores::Collected(scores) => collected.extend(scores),
                UserScores::Dropped(user_id) => failed_users.push(user_id),
            }
        }

        let scores = dedupe_and_sort(collected);
        let snapshot = DailySnapshot {
            date,
            country: self.config.country.clone(),
            generated_at,
            scores,
        };

        let snapshot_path = self.store.write_snapshot(Category::Scores, date, &snapshot)?;
        let index_updated = self.store.upsert_index(Category::Scores, date)?;

        info!(
            "Archived {} scores from {} players for {} ({} players skipped)",
            snapshot.scores.len(),
            user_ids.len(),
            date,
            failed_users.len()
        );

        Ok(CollectionSummary {
            date,
            users: user_ids.len(),
            scores: snapshot.scores.len(),
            failed_pages: collection.failed_pages,
            failed_users,
            batches,
            snapshot_path,
            index_updated,
        })
    }

    async fn fetch_user(&self, user_id: UserId) -> UserScores {
        let raw = match self.api.recent_scores(user_id, self.config.scores.recent_limit).await {
            FetchOutcome::Fetched(raw) => raw,
            FetchOutcome::Failed(failure) => {
                debug!("Skipping recent scores of user {}: {}", user_id, failure);
                return UserScores::Dropped(user_id);
            }
        };

        match normalize_user_scores(raw, &self.config.country) {
            Ok(scores) => UserScores::Collected(scores),
            Err(e) => {
                debug!("Dropping recent scores of user {}: {}", user_id, e);
                UserScores::Dropped(user_id)
            }
        }
    }
}
