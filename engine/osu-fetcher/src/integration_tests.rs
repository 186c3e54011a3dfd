//! End-to-end pipeline tests against the in-memory API and a temp data dir

use crate::client::{FetchFailure, FetchOutcome};
use crate::config::FetcherConfig;
use crate::leaderboard::LeaderboardBuilder;
use crate::models::{DailySnapshot, LeaderboardRow, UserId};
use crate::scores::ScoreCollector;
use crate::testing::{best_score, full_user, ranking_page, recent_score, StubApi};
use chrono::{NaiveDate, TimeZone, Utc};
use persistence::{create_local_store, Category, DateIndex, SnapshotStore};
use tempfile::TempDir;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn fast_config() -> FetcherConfig {
    let mut config = FetcherConfig::default();
    config.scores.pages_to_scan = 1;
    config.scores.batch_delay_ms = 0;
    config.leaderboard.pages_to_scan = 1;
    config.leaderboard.page_delay_ms = 0;
    config.leaderboard.batch_delay_ms = 0;
    config
}

fn setup() -> (TempDir, SnapshotStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = create_local_store(temp_dir.path()).unwrap();
    (temp_dir, store)
}

fn read_scores(store: &SnapshotStore) -> serde_json::Value {
    store.read_snapshot(Category::Scores, day()).unwrap().unwrap()
}

#[tokio::test]
async fn test_malformed_user_is_dropped_rest_of_batch_kept() {
    let ids: Vec<UserId> = (1..=10).collect();
    let mut api = StubApi::default().with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&ids)));
    for &id in &ids {
        let outcome = if id == 4 {
            FetchOutcome::Failed(FetchFailure::Malformed("expected value at line 1".to_string()))
        } else {
            FetchOutcome::Fetched(vec![recent_score(id * 100, id, "2024-05-01T12:00:00Z", 50.0)])
        };
        api = api.with_recent(id, outcome);
    }
    let config = fast_config();
    let (_temp_dir, store) = setup();

    let summary = ScoreCollector::new(&api, &config, &store)
        .run(day(), Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.users, 10);
    assert_eq!(summary.scores, 9);
    assert_eq!(summary.failed_users, vec![4]);

    let snapshot: DailySnapshot = store.read_snapshot(Category::Scores, day()).unwrap().unwrap();
    assert!(snapshot.scores.iter().all(|s| s.user_id != 4));
    assert_eq!(snapshot.country, "IQ");
}

#[tokio::test]
async fn test_23_users_run_in_three_batches() {
    let ids: Vec<UserId> = (1..=23).collect();
    let api = StubApi::default().with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&ids)));
    let config = fast_config();
    let (_temp_dir, store) = setup();

    let summary = ScoreCollector::new(&api, &config, &store).run(day(), Utc::now()).await.unwrap();

    assert_eq!(summary.batches.batches, 3);
    assert_eq!(summary.batches.pauses, 2);
    assert_eq!(api.calls().recent.len(), 23);
}

#[tokio::test]
async fn test_snapshot_layout_and_generated_at_format() {
    let api = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[7])))
        .with_recent(7, FetchOutcome::Fetched(vec![recent_score(1, 7, "2024-05-01T08:30:00Z", 12.5)]));
    let config = fast_config();
    let (temp_dir, store) = setup();

    let generated_at = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
    ScoreCollector::new(&api, &config, &store).run(day(), generated_at).await.unwrap();

    assert!(temp_dir.path().join("2024/05/01.json").exists());
    let value = read_scores(&store);
    assert_eq!(value["date"], "2024-05-01");
    assert_eq!(value["generated_at"], "2024-05-01T23:59:59.000Z");
    assert_eq!(value["scores"][0]["user_id"], 7);
    assert_eq!(value["scores"][0]["mods"][0], "HD");
}

#[tokio::test]
async fn test_rerun_same_date_overwrites_snapshot_and_keeps_one_index_entry() {
    let config = fast_config();
    let (_temp_dir, store) = setup();

    let first = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[1])))
        .with_recent(1, FetchOutcome::Fetched(vec![recent_score(10, 1, "2024-05-01T08:00:00Z", 1.0)]));
    let summary = ScoreCollector::new(&first, &config, &store).run(day(), Utc::now()).await.unwrap();
    assert!(summary.index_updated);

    let second = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[1])))
        .with_recent(
            1,
            FetchOutcome::Fetched(vec![
                recent_score(10, 1, "2024-05-01T08:00:00Z", 1.0),
                recent_score(11, 1, "2024-05-01T09:00:00Z", 2.0),
            ]),
        );
    let summary = ScoreCollector::new(&second, &config, &store).run(day(), Utc::now()).await.unwrap();
    assert!(!summary.index_updated);

    let index: DateIndex = store.read_index(Category::Scores).unwrap();
    assert_eq!(index.available_dates, vec!["2024-05-01"]);

    let snapshot: DailySnapshot = store.read_snapshot(Category::Scores, day()).unwrap().unwrap();
    let ids: Vec<u64> = snapshot.scores.iter().map(|s| s.score_id).collect();
    assert_eq!(ids, vec![11, 10]);
}

#[tokio::test]
async fn test_failed_ranking_page_still_writes_snapshot() {
    let mut config = fast_config();
    config.scores.pages_to_scan = 2;
    config.scores.manual_user_ids = vec![99];
    let api = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[1])))
        .with_ranking_page(2, FetchOutcome::Failed(FetchFailure::Status(502)));
    let (_temp_dir, store) = setup();

    let summary = ScoreCollector::new(&api, &config, &store).run(day(), Utc::now()).await.unwrap();

    assert_eq!(summary.failed_pages, vec![2]);
    assert_eq!(summary.users, 2);
    let mut checked = api.calls().recent;
    checked.sort_unstable();
    assert_eq!(checked, vec![1, 99]);
}

#[tokio::test]
async fn test_leaderboard_joins_stats_daily_pp_and_top_play() {
    let config = fast_config();
    let (temp_dir, store) = setup();

    let scores = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[5, 6])))
        .with_recent(
            5,
            FetchOutcome::Fetched(vec![
                recent_score(1, 5, "2024-05-01T08:00:00Z", 100.0),
                recent_score(2, 5, "2024-05-01T09:00:00Z", 150.0),
            ]),
        )
        .with_recent(6, FetchOutcome::Fetched(vec![recent_score(3, 6, "2024-05-01T10:00:00Z", 50.0)]));
    ScoreCollector::new(&scores, &config, &store).run(day(), Utc::now()).await.unwrap();

    let api = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[5, 6, 7])))
        .with_user(full_user(5, 3, "2024-05-01T10:00:00Z"))
        .with_best(5, FetchOutcome::Fetched(vec![best_score("Blue Zenith", 7.1, &["HD"], 820.0, 0.9912)]));
    let summary = LeaderboardBuilder::new(&api, &config, &store).run(day()).await.unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.with_stats, 1);
    assert_eq!(summary.with_top_play, 1);
    assert!(temp_dir.path().join("leaderboards/2024/05/01.json").exists());

    let rows: Vec<LeaderboardRow> = store.read_snapshot(Category::Leaderboards, day()).unwrap().unwrap();
    let ids: Vec<UserId> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 6, 7]);

    assert_eq!(rows[0].daily_pp, 250.0);
    assert_eq!(rows[0].medals, 3);
    assert_eq!(rows[0].last_active, "2024-05-01T10:00:00Z");
    assert_eq!(rows[0].a_ranks, 300);
    let top = rows[0].top_play.as_ref().unwrap();
    assert_eq!(top.title, "Blue Zenith");
    assert_eq!(top.mods, "+HD");

    assert_eq!(rows[1].daily_pp, 50.0);
    assert_eq!(rows[1].medals, 0);
    assert_eq!(rows[1].last_active, "1970-01-01T00:00:00.000Z");
    assert!(rows[1].top_play.is_none());

    assert_eq!(rows[2].daily_pp, 0.0);

    let index = store.read_index(Category::Leaderboards).unwrap();
    assert_eq!(index.available_dates, vec!["2024-05-01"]);
    assert!(store.read_index(Category::Scores).unwrap().contains(day()));
}

#[tokio::test]
async fn test_leaderboard_without_score_snapshot_or_stats() {
    let mut config = fast_config();
    config.leaderboard.stats_batch_size = 2;
    let api = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[1, 2, 3])))
        .with_failing_user_lookups();
    let (_temp_dir, store) = setup();

    let summary = LeaderboardBuilder::new(&api, &config, &store).run(day()).await.unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.with_stats, 0);
    assert_eq!(summary.stats_batches.batches, 2);
    assert_eq!(api.calls().users, vec![vec![1, 2], vec![3]]);

    let value: serde_json::Value = store.read_snapshot(Category::Leaderboards, day()).unwrap().unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["last_active"], "1970-01-01T00:00:00.000Z");
    assert_eq!(value[0]["daily_pp"], 0.0);
}

#[tokio::test]
async fn test_null_combo_score_is_archived_with_raw_timestamp() {
    let mut score = recent_score(77, 7, "2024-05-01T08:30:00+00:00", 12.5);
    score.max_combo = None;
    let api = StubApi::default()
        .with_ranking_page(1, FetchOutcome::Fetched(ranking_page(&[7])))
        .with_recent(7, FetchOutcome::Fetched(vec![score]));
    let config = fast_config();
    let (_temp_dir, store) = setup();

    let summary = ScoreCollector::new(&api, &config, &store).run(day(), Utc::now()).await.unwrap();

    assert_eq!(summary.scores, 1);
    assert!(summary.failed_users.is_empty());
    let value = read_scores(&store);
    assert!(value["scores"][0]["combo"].is_null());
    assert_eq!(value["scores"][0]["created_at"], "2024-05-01T08:30:00+00:00");
}
