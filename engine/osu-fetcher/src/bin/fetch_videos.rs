use anyhow::Context;
use osu_fetcher::{initialize_logging, FetcherConfig, VideoCollector};
use persistence::create_local_store_with_config;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = FetcherConfig::from_env().context("Failed to load fetcher configuration")?;
    initialize_logging(&config.logging)?;

    let store = create_local_store_with_config(config.persistence())
        .context("Failed to open the snapshot store")?;

    let summary = VideoCollector::new(&config, &store).run().await?;

    if !summary.skipped_channels.is_empty() {
        warn!("Channels skipped: {:?}", summary.skipped_channels);
    }
    info!("Done: {} videos saved to {:?}", summary.videos, summary.output_path);
    Ok(())
}
