//! Composite country leaderboard (`fetch-leaderboard`)

use crate::batch::{fan_out, run_batches, BatchPlan, BatchReport};
use crate::client::{FetchOutcome, OsuApi};
use crate::config::FetcherConfig;
use crate::daily_pp::DailyPp;
use crate::error::Result;
use crate::models::{LeaderboardRow, RankingEntry, TopPlay, UserFullStats, UserId};
use crate::rankings::{fetch_ranking_rows, RankingQuery};
use chrono::NaiveDate;
use persistence::{Category, SnapshotStore};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of one `fetch-leaderboard` run
#[derive(Debug, Clone)]
pub struct LeaderboardSummary {
    pub date: NaiveDate,
    pub rows: usize,
    pub with_stats: usize,
    pub with_top_play: usize,
    pub failed_pages: Vec<u32>,
    pub stats_batches: BatchReport,
    pub top_play_batches: BatchReport,
    pub snapshot_path: PathBuf,
    pub index_updated: bool,
}

/// Builds the day's leaderboard from rankings, profiles, daily pp and best plays
pub struct LeaderboardBuilder<'a, A: OsuApi + ?Sized> {
    api: &'a A,
    config: &'a FetcherConfig,
    store: &'a SnapshotStore,
}

impl<'a, A: OsuApi + ?Sized> LeaderboardBuilder<'a, A> {
    pub fn new(api: &'a A, config: &'a FetcherConfig, store: &'a SnapshotStore) -> Self {
        Self { api, config, store }
    }

    /// Build and persist the leaderboard snapshot for `date`
    pub async fn run(&self, date: NaiveDate) -> Result<LeaderboardSummary> {
        let settings = &self.config.leaderboard;
        let query = RankingQuery {
            country: &self.config.country,
            mode: &self.config.mode,
            pages: settings.pages_to_scan,
            page_delay: settings.page_delay(),
        };
        let ranking = fetch_ranking_rows(self.api, &query).await;

        let user_ids: Vec<UserId> = ranking.rows.iter().map(|row| row.user.id).collect();
        let (full_stats, stats_batches) = self.fetch_full_stats(&user_ids).await;

        let daily_pp = DailyPp::load(self.store, date);

        info!("Fetching #1 top plays for {} players...", ranking.rows.len());
        let builder = self;
        let full_stats_ref = &full_stats;
        let daily_pp_ref = &daily_pp;
        let plan = BatchPlan::new(settings.top_play_batch_size, settings.batch_delay());
        let (rows, top_play_batches) =
            run_batches("top plays", &ranking.rows, plan, move |_, batch| {
                fan_out(batch, move |entry| builder.build_row(entry, full_stats_ref, daily_pp_ref))
            })
            .await;

        let snapshot_path = self.store.write_snapshot(Category::Leaderboards, date, &rows)?;
        let index_updated = self.store.upsert_index(Category::Leaderboards, date)?;

        let with_top_play = rows.iter().filter(|row| row.top_play.is_some()).count();
        info!("Saved {} players to the {} leaderboard ({} with a top play)", rows.len(), date, with_top_play);

        Ok(LeaderboardSummary {
            date,
            rows: rows.len(),
            with_stats: full_stats.len(),
            with_top_play,
            failed_pages: ranking.failed_pages,
            stats_batches,
            top_play_batches,
            snapshot_path,
            index_updated,
        })
    }

    /// Medal counts and last visits through the bulk user lookup
    async fn fetch_full_stats(&self, user_ids: &[UserId]) -> (HashMap<UserId, UserFullStats>, BatchReport) {
        info!("Fetching full stats (medals/activity) for {} users...", user_ids.len());

        let settings = &self.config.leaderboard;
        let plan = BatchPlan::new(settings.stats_batch_size, settings.batch_delay());
        let api = self.api;
        let (stats, report) = run_batches("user stats", user_ids, plan, move |index, batch| async move {
            match api.users(batch).await {
                FetchOutcome::Fetched(body) => body
                    .users
                    .iter()
                    .map(|user| (user.id, UserFullStats::from(user)))
                    .collect::<Vec<_>>(),
                FetchOutcome::Failed(failure) => {
                    warn!("Failed user stats batch {}: {}", index + 1, failure);
                    Vec::new()
                }
            }
        })
        .await;

        (stats.into_iter().collect(), report)
    }

    async fn build_row(
        &self,
        entry: &RankingEntry,
        full_stats: &HashMap<UserId, UserFullStats>,
        daily_pp: &DailyPp,
    ) -> LeaderboardRow {
        let user_id = entry.user.id;
        let top_play = self.fetch_top_play(user_id).await;
        let stats = full_stats.get(&user_id).cloned().unwrap_or_default();

        LeaderboardRow::new(entry, &stats, daily_pp.get(user_id), top_play)
    }

    async fn fetch_top_play(&self, user_id: UserId) -> Option<TopPlay> {
        match self.api.best_scores(user_id, &self.config.mode).await {
            FetchOutcome::Fetched(scores) => scores.first().map(TopPlay::from),
            FetchOutcome::Failed(failure) => {
                debug!("No top play for user {}: {}", user_id, failure);
                None
            }
        }
    }
}
