//! osu! Country Fetcher
//!
//! Collects a country's osu! performance ranking into dated JSON snapshots:
//! the day's recent scores of ranked and tracked players (`fetch-daily`),
//! a composite leaderboard with medals, activity, daily pp and each player's
//! best play (`fetch-leaderboard`), and a list of channel uploads
//! (`fetch-videos`).
//!
//! Requests go out in fixed-size concurrent batches separated by a fixed
//! pause. A page or user that fails is logged and skipped; only missing
//! credentials, a failed token exchange and storage errors abort a run.

pub mod auth;
pub mod batch;
pub mod client;
pub mod config;
pub mod daily_pp;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod models;
pub mod rankings;
pub mod scores;
pub mod videos;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod testing;

pub use auth::{request_token, AccessToken, Credentials};
pub use batch::{BatchPlan, BatchReport};
pub use client::{FetchFailure, FetchOutcome, OsuApi, OsuClient};
pub use config::FetcherConfig;
pub use daily_pp::DailyPp;
pub use error::{FetcherError, Result};
pub use leaderboard::{LeaderboardBuilder, LeaderboardSummary};
pub use logging::initialize_logging;
pub use models::*;
pub use scores::{CollectionSummary, ScoreCollector};
pub use videos::{VideoCollector, VideoSummary};
