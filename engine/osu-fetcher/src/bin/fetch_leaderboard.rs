use anyhow::Context;
use chrono::Utc;
use osu_fetcher::{
    initialize_logging, request_token, Credentials, FetcherConfig, LeaderboardBuilder, OsuClient,
};
use persistence::create_local_store_with_config;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = FetcherConfig::from_env().context("Failed to load fetcher configuration")?;
    initialize_logging(&config.logging)?;

    info!("Building the {} leaderboard ({})", config.country, config.mode);

    let credentials = Credentials::from_env(&config.osu)?;
    let http = OsuClient::http_client(&config)?;
    let token = request_token(&http, &config.osu.token_url, &credentials)
        .await
        .context("Failed to obtain an osu! API token")?;
    let client = OsuClient::new(http, &config, token);

    let store = create_local_store_with_config(config.persistence())
        .context("Failed to open the snapshot store")?;

    let summary = LeaderboardBuilder::new(&client, &config, &store).run(Utc::now().date_naive()).await?;

    if !summary.failed_pages.is_empty() {
        warn!("Ranking pages skipped: {:?}", summary.failed_pages);
    }
    info!(
        "Done: {} players ({} with full stats, {} with a top play), saved to {:?}",
        summary.rows, summary.with_stats, summary.with_top_play, summary.snapshot_path
    );
    Ok(())
}
