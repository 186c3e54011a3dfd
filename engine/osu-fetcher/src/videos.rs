//! Channel upload listing through yt-dlp (`fetch-videos`)

use crate::config::{ChannelConfig, FetcherConfig};
use crate::error::Result;
use crate::models::Video;
use persistence::SnapshotStore;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// The fields of a `--dump-json --flat-playlist` line we use
#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: String,
    #[serde(default)]
    title: String,
    upload_date: Option<String>,
}

/// A listed upload with its raw `YYYYMMDD` date kept for sorting
#[derive(Debug, Clone, PartialEq)]
pub struct ListedVideo {
    pub upload_date: String,
    pub video: Video,
}

/// `YYYYMMDD` to `YYYY-MM-DD`, `None` for anything else
pub fn format_upload_date(raw: &str) -> Option<String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]))
}

/// Parse yt-dlp JSON lines for `channel`
///
/// Lines that are not JSON and entries without a usable `upload_date` are
/// skipped.
pub fn parse_playlist(output: &str, channel: &str) -> Vec<ListedVideo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unparseable yt-dlp line for {}: {}", channel, e);
                None
            }
        })
        .filter_map(|entry| {
            let upload_date = entry.upload_date?;
            let published = format_upload_date(&upload_date)?;
            Some(ListedVideo {
                upload_date,
                video: Video {
                    id: entry.id,
                    title: entry.title,
                    channel: channel.to_string(),
                    published,
                },
            })
        })
        .collect()
}

/// Newest first by raw upload date
pub fn sort_newest_first(videos: &mut [ListedVideo]) {
    videos.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
}

/// Outcome of one `fetch-videos` run
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub videos: usize,
    pub skipped_channels: Vec<String>,
    pub output_path: PathBuf,
}

/// Lists uploads of the configured channels into one document
pub struct VideoCollector<'a> {
    config: &'a FetcherConfig,
    store: &'a SnapshotStore,
}

impl<'a> VideoCollector<'a> {
    pub fn new(config: &'a FetcherConfig, store: &'a SnapshotStore) -> Self {
        Self { config, store }
    }

    pub async fn run(&self) -> Result<VideoSummary> {
        let mut listed = Vec::new();
        let mut skipped_channels = Vec::new();

        for channel in &self.config.videos.channels {
            match self.list_channel(channel).await {
                Some(videos) => {
                    info!("{}: {} videos", channel.name, videos.len());
                    listed.extend(videos);
                }
                None => skipped_channels.push(channel.name.clone()),
            }
        }

        sort_newest_first(&mut listed);
        let videos: Vec<Video> = listed.into_iter().map(|listed| listed.video).collect();

        let output_path = self.store.write_document(&self.config.videos.output_file, &videos)?;
        info!("Saved {} videos to {:?}", videos.len(), output_path);

        Ok(VideoSummary { videos: videos.len(), skipped_channels, output_path })
    }

    async fn list_channel(&self, channel: &ChannelConfig) -> Option<Vec<ListedVideo>> {
        let url = format!("https://www.youtube.com/channel/{}/videos", channel.id);
        info!("Listing uploads of {} ({})", channel.name, channel.id);

        let output = match Command::new(&self.config.videos.yt_dlp_bin)
            .args(["--dump-json", "--flat-playlist", url.as_str()])
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Could not run {} for {}: {}", self.config.videos.yt_dlp_bin, channel.name, e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "{} exited with {} for {}: {}",
                self.config.videos.yt_dlp_bin,
                output.status,
                channel.name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Some(parse_playlist(&String::from_utf8_lossy(&output.stdout), &channel.name))
    }
}
