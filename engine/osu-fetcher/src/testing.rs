//! In-memory osu! API for tests

use crate::client::{FetchFailure, FetchOutcome, OsuApi};
use crate::models::{RankingPage, RawBestScore, RawRecentScore, RawUser, UserId, UsersResponse};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned responses keyed by page or user id, with a call log
///
/// Unstubbed ranking pages fail with 404; unstubbed users have no scores.
#[derive(Default)]
pub struct StubApi {
    ranking_pages: HashMap<u32, FetchOutcome<RankingPage>>,
    recent: HashMap<UserId, FetchOutcome<Vec<RawRecentScore>>>,
    users: HashMap<UserId, RawUser>,
    failing_user_lookups: bool,
    best: HashMap<UserId, FetchOutcome<Vec<RawBestScore>>>,
    calls: Mutex<CallLog>,
}

#[derive(Debug, Default, Clone)]
pub struct CallLog {
    pub ranking: Vec<u32>,
    pub recent: Vec<UserId>,
    pub users: Vec<Vec<UserId>>,
    pub best: Vec<UserId>,
}

impl StubApi {
    pub fn with_ranking_page(mut self, page: u32, outcome: FetchOutcome<RankingPage>) -> Self {
        self.ranking_pages.insert(page, outcome);
        self
    }

    pub fn with_recent(mut self, user_id: UserId, outcome: FetchOutcome<Vec<RawRecentScore>>) -> Self {
        self.recent.insert(user_id, outcome);
        self
    }

    pub fn with_user(mut self, user: RawUser) -> Self {
        self.users.insert(user.id, user);
        self
    }

    pub fn with_failing_user_lookups(mut self) -> Self {
        self.failing_user_lookups = true;
        self
    }

    pub fn with_best(mut self, user_id: UserId, outcome: FetchOutcome<Vec<RawBestScore>>) -> Self {
        self.best.insert(user_id, outcome);
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.lock().unwrap().clone()
    }

    pub fn ranking_calls(&self) -> Vec<u32> {
        self.calls().ranking
    }
}

#[async_trait]
impl OsuApi for StubApi {
    async fn ranking_page(&self, _mode: &str, _country: &str, page: u32) -> FetchOutcome<RankingPage> {
        self.calls.lock().unwrap().ranking.push(page);
        self.ranking_pages
            .get(&page)
            .cloned()
            .unwrap_or(FetchOutcome::Failed(FetchFailure::Status(404)))
    }

    async fn recent_scores(&self, user_id: UserId, _limit: u32) -> FetchOutcome<Vec<RawRecentScore>> {
        self.calls.lock().unwrap().recent.push(user_id);
        self.recent.get(&user_id).cloned().unwrap_or(FetchOutcome::Fetched(Vec::new()))
    }

    async fn users(&self, ids: &[UserId]) -> FetchOutcome<UsersResponse> {
        self.calls.lock().unwrap().users.push(ids.to_vec());
        if self.failing_user_lookups {
            return FetchOutcome::Failed(FetchFailure::Transport("connection reset".to_string()));
        }
        let users = ids.iter().filter_map(|id| self.users.get(id).cloned()).collect();
        FetchOutcome::Fetched(UsersResponse { users })
    }

    async fn best_scores(&self, user_id: UserId, _mode: &str) -> FetchOutcome<Vec<RawBestScore>> {
        self.calls.lock().unwrap().best.push(user_id);
        self.best.get(&user_id).cloned().unwrap_or(FetchOutcome::Fetched(Vec::new()))
    }
}

/// A ranking page listing `ids` in order
pub fn ranking_page(ids: &[UserId]) -> RankingPage {
    let ranking: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "user": {
                    "id": id,
                    "username": format!("player{id}"),
                    "avatar_url": format!("https://a.ppy.sh/{id}")
                },
                "pp": 9000.0 - i as f64,
                "global_rank": 1000 + i,
                "hit_accuracy": 98.5,
                "play_count": 12000,
                "play_time": 3_600_000,
                "total_score": 50_000_000_000u64,
                "total_hits": 8_000_000,
                "grade_counts": {"ss": 1, "ssh": 0, "s": 10, "sh": 2, "a": 300}
            })
        })
        .collect();
    serde_json::from_value(json!({ "ranking": ranking })).unwrap()
}

/// A complete recent score
pub fn recent_score(score_id: u64, user_id: UserId, created_at: &str, pp: f64) -> RawRecentScore {
    serde_json::from_value(json!({
        "id": score_id,
        "user": {"id": user_id, "username": format!("player{user_id}")},
        "rank": "A",
        "accuracy": 0.95,
        "pp": pp,
        "mods": ["HD"],
        "max_combo": 700,
        "created_at": created_at,
        "beatmapset": {
            "id": score_id * 10,
            "title": format!("Map {score_id}"),
            "covers": {"card": format!("https://assets.ppy.sh/{score_id}/card.jpg")}
        }
    }))
    .unwrap()
}

/// A best score on a beatmap with a known difficulty
pub fn best_score(title: &str, stars: f64, mods: &[&str], pp: f64, accuracy: f64) -> RawBestScore {
    serde_json::from_value(json!({
        "beatmapset": {"id": 1, "title": title, "covers": {"card": "https://assets.ppy.sh/1/card.jpg"}},
        "beatmap": {"version": "Insane", "difficulty_rating": stars},
        "mods": mods,
        "pp": pp,
        "accuracy": accuracy
    }))
    .unwrap()
}

/// A bulk-lookup user with `medals` achievements
pub fn full_user(id: UserId, medals: usize, last_visit: &str) -> RawUser {
    let achievements: Vec<_> = (0..medals).map(|i| json!({"achievement_id": i})).collect();
    serde_json::from_value(json!({
        "id": id,
        "user_achievements": achievements,
        "last_visit": last_visit
    }))
    .unwrap()
}
