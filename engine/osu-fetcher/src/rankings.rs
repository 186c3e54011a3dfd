use crate::client::{FetchOutcome, OsuApi};
use crate::models::{RankingEntry, UserId};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Which ranking pages to read and how fast
#[derive(Debug, Clone)]
pub struct RankingQuery<'a> {
    pub country: &'a str,
    pub mode: &'a str,
    pub pages: u32,
    pub page_delay: Duration,
}

/// Rows gathered from the ranking pages that answered
#[derive(Debug, Clone, Default)]
pub struct RankingFetch {
    pub rows: Vec<RankingEntry>,
    pub failed_pages: Vec<u32>,
}

/// Read pages `1..=pages` in order, skipping pages that fail
pub async fn fetch_ranking_rows<A: OsuApi + ?Sized>(api: &A, query: &RankingQuery<'_>) -> RankingFetch {
    info!(
        "Fetching top {} {} players from {}...",
        query.pages.saturating_mul(50),
        query.mode,
        query.country
    );

    let mut fetch = RankingFetch::default();
    for page in 1..=query.pages {
        if page > 1 && !query.page_delay.is_zero() {
            sleep(query.page_delay).await;
        }

        match api.ranking_page(query.mode, query.country, page).await {
            FetchOutcome::Fetched(body) => {
                info!("Ranking page {}: {} players", page, body.ranking.len());
                fetch.rows.extend(body.ranking);
            }
            FetchOutcome::Failed(failure) => {
                warn!("Failed to fetch ranking page {}: {}", page, failure);
                fetch.failed_pages.push(page);
            }
        }
    }

    fetch
}

/// Ranked user ids merged with a manual allow-list
#[derive(Debug, Clone, Default)]
pub struct UserIdCollection {
    pub user_ids: BTreeSet<UserId>,
    pub failed_pages: Vec<u32>,
}

/// Collect the ids of every ranked player plus `manual_ids`, de-duplicated
pub async fn collect_user_ids<A: OsuApi + ?Sized>(
    api: &A,
    query: &RankingQuery<'_>,
    manual_ids: &[UserId],
) -> UserIdCollection {
    let fetch = fetch_ranking_rows(api, query).await;

    let mut user_ids: BTreeSet<UserId> = manual_ids.iter().copied().collect();
    user_ids.extend(fetch.rows.iter().map(|row| row.user.id));

    info!("Total players to check: {}", user_ids.len());
    UserIdCollection { user_ids, failed_pages: fetch.failed_pages }
}
