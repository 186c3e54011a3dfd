use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// osu! user identifier
pub type UserId = u64;

/// One page of `GET /rankings/{mode}/performance`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingPage {
    #[serde(default)]
    pub ranking: Vec<RankingEntry>,
}

/// A row of the country performance ranking
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankingEntry {
    pub user: RankedUser,
    pub pp: Option<f64>,
    pub global_rank: Option<u64>,
    pub hit_accuracy: Option<f64>,
    pub play_count: Option<u64>,
    pub play_time: Option<u64>,
    pub total_score: Option<u64>,
    pub total_hits: Option<u64>,
    pub grade_counts: Option<GradeCounts>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankedUser {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GradeCounts {
    #[serde(default)]
    pub ss: u64,
    #[serde(default)]
    pub ssh: u64,
    #[serde(default)]
    pub s: u64,
    #[serde(default)]
    pub sh: u64,
    #[serde(default)]
    pub a: u64,
}

/// A mod as returned by the API: a bare acronym on the legacy score
/// format, an object on the lazer format
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMod {
    Acronym(String),
    Object { acronym: String },
}

impl RawMod {
    pub fn acronym(&self) -> &str {
        match self {
            RawMod::Acronym(acronym) | RawMod::Object { acronym } => acronym,
        }
    }
}

/// Entry of `GET /users/{id}/scores/recent`
///
/// Nested objects are optional here so that a partial record reaches the
/// normalizer, which decides what to do with it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecentScore {
    pub id: u64,
    pub user: Option<RawScoreUser>,
    pub rank: Option<String>,
    pub accuracy: Option<f64>,
    pub pp: Option<f64>,
    #[serde(default)]
    pub mods: Vec<RawMod>,
    pub max_combo: Option<u32>,
    pub created_at: Option<String>,
    pub beatmapset: Option<RawBeatmapset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScoreUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBeatmapset {
    pub id: u64,
    pub title: String,
    pub covers: Option<RawCovers>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCovers {
    pub card: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBeatmap {
    pub version: String,
    #[serde(default)]
    pub difficulty_rating: f64,
}

/// Entry of `GET /users/{id}/scores/best`
#[derive(Debug, Clone, Deserialize)]
pub struct RawBestScore {
    pub beatmapset: RawBeatmapset,
    pub beatmap: Option<RawBeatmap>,
    #[serde(default)]
    pub mods: Vec<RawMod>,
    pub pp: Option<f64>,
    pub accuracy: f64,
}

/// Body of `GET /users?ids[]=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<RawUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: UserId,
    pub user_achievements: Option<Vec<serde_json::Value>>,
    pub last_visit: Option<String>,
}

/// A normalized recent play
///
/// Scalars the API leaves null stay null; `created_at` is the timestamp
/// string exactly as the API sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user: String,
    pub user_id: UserId,
    pub country: String,
    pub score_id: u64,
    pub rank: Option<String>,
    pub accuracy: Option<f64>,
    pub pp: Option<f64>,
    pub mods: Vec<String>,
    pub combo: Option<u32>,
    pub created_at: Option<String>,
    pub beatmapset: BeatmapsetSummary,
}

impl ScoreRecord {
    /// Parsed `created_at`, `None` when absent or not RFC 3339
    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapsetSummary {
    pub id: u64,
    pub title: String,
    pub cover: String,
}

/// The `scores` category snapshot for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub country: String,
    #[serde(serialize_with = "serialize_millis")]
    pub generated_at: DateTime<Utc>,
    pub scores: Vec<ScoreRecord>,
}

/// `last_active` of a player whose profile could not be looked up
pub const NEVER_ACTIVE: &str = "1970-01-01T00:00:00.000Z";

/// Profile details only available through the bulk user lookup
#[derive(Debug, Clone, PartialEq)]
pub struct UserFullStats {
    pub medals: usize,
    /// As sent by the API
    pub last_visit: String,
}

impl Default for UserFullStats {
    fn default() -> Self {
        Self { medals: 0, last_visit: NEVER_ACTIVE.to_string() }
    }
}

impl From<&RawUser> for UserFullStats {
    fn from(user: &RawUser) -> Self {
        Self {
            medals: user.user_achievements.as_ref().map_or(0, Vec::len),
            last_visit: user.last_visit.clone().unwrap_or_else(|| NEVER_ACTIVE.to_string()),
        }
    }
}

/// Summary of a user's best score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPlay {
    pub title: String,
    pub diff: String,
    pub cover: Option<String>,
    pub stars: f64,
    pub mods: String,
    pub pp: Option<f64>,
    pub acc: f64,
}

impl From<&RawBestScore> for TopPlay {
    fn from(score: &RawBestScore) -> Self {
        Self {
            title: score.beatmapset.title.clone(),
            diff: score.beatmap.as_ref().map(|b| b.version.clone()).unwrap_or_default(),
            cover: score.beatmapset.covers.as_ref().and_then(|c| c.card.clone()),
            stars: score.beatmap.as_ref().map_or(0.0, |b| b.difficulty_rating),
            mods: format_mods(&score.mods),
            pp: score.pp,
            acc: score.accuracy * 100.0,
        }
    }
}

/// `+HDDT` style mod string, empty without mods
pub fn format_mods(mods: &[RawMod]) -> String {
    if mods.is_empty() {
        return String::new();
    }
    let joined: String = mods.iter().map(RawMod::acronym).collect();
    format!("+{joined}")
}

/// One row of the `leaderboards` category snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: Option<u64>,
    pub id: UserId,
    pub user: String,
    pub avatar: Option<String>,
    pub pp: Option<f64>,
    pub accuracy: Option<f64>,
    pub play_count: Option<u64>,
    pub play_time: Option<u64>,
    pub total_score: Option<u64>,
    pub total_hits: Option<u64>,
    pub a_ranks: u64,
    pub medals: usize,
    pub last_active: String,
    pub daily_pp: f64,
    pub top_play: Option<TopPlay>,
}

impl LeaderboardRow {
    pub fn new(
        entry: &RankingEntry,
        stats: &UserFullStats,
        daily_pp: f64,
        top_play: Option<TopPlay>,
    ) -> Self {
        Self {
            rank: entry.global_rank,
            id: entry.user.id,
            user: entry.user.username.clone(),
            avatar: entry.user.avatar_url.clone(),
            pp: entry.pp,
            accuracy: entry.hit_accuracy,
            play_count: entry.play_count,
            play_time: entry.play_time,
            total_score: entry.total_score,
            total_hits: entry.total_hits,
            a_ranks: entry.grade_counts.as_ref().map_or(0, |g| g.a),
            medals: stats.medals,
            last_active: stats.last_visit.clone(),
            daily_pp,
            top_play,
        }
    }
}

/// A channel upload listed by yt-dlp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub published: String,
}

/// RFC 3339 with millisecond precision and a `Z` suffix
fn serialize_millis<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
