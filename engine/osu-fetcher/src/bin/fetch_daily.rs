use anyhow::Context;
use chrono::Utc;
use osu_fetcher::{initialize_logging, request_token, Credentials, FetcherConfig, OsuClient, ScoreCollector};
use persistence::create_local_store_with_config;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = FetcherConfig::from_env().context("Failed to load fetcher configuration")?;
    initialize_logging(&config.logging)?;

    info!("Starting daily score collection for {} ({})", config.country, config.mode);

    let credentials = Credentials::from_env(&config.osu)?;
    let http = OsuClient::http_client(&config)?;
    let token = request_token(&http, &config.osu.token_url, &credentials)
        .await
        .context("Failed to obtain an osu! API token")?;
    let client = OsuClient::new(http, &config, token);
    info!("Authenticated against the osu! API");

    let store = create_local_store_with_config(config.persistence())
        .context("Failed to open the snapshot store")?;

    let now = Utc::now();
    let summary = ScoreCollector::new(&client, &config, &store).run(now.date_naive(), now).await?;

    if !summary.failed_pages.is_empty() {
        warn!("Ranking pages skipped: {:?}", summary.failed_pages);
    }
    info!(
        "Done: {} scores from {} players in {} batches, saved to {:?}",
        summary.scores, summary.users, summary.batches.batches, summary.snapshot_path
    );
    Ok(())
}
