use crate::error::{FetcherError, Result};
use crate::models::UserId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "OSU_FETCHER_CONFIG";

/// Prefix for environment overrides, e.g. `OSU_FETCHER__COUNTRY=DE`
pub const ENV_PREFIX: &str = "OSU_FETCHER";

const GAME_MODES: [&str; 4] = ["osu", "taiko", "fruits", "mania"];

/// The ranking endpoint serves at most 200 pages of 50 players
pub const MAX_RANKING_PAGES: u32 = 200;

/// Configuration for the osu! fetcher binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// ISO 3166-1 alpha-2 country code the rankings are filtered by
    pub country: String,

    /// Game mode (`osu`, `taiko`, `fruits`, `mania`)
    pub mode: String,

    /// Root directory for snapshots and indexes
    pub data_dir: PathBuf,

    /// osu! API configuration
    pub osu: OsuApiConfig,

    /// Recent-score collection (`fetch-daily`)
    pub scores: ScoreCollectionConfig,

    /// Leaderboard build (`fetch-leaderboard`)
    pub leaderboard: LeaderboardConfig,

    /// Channel video listing (`fetch-videos`)
    pub videos: VideoConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsuApiConfig {
    /// Base URL of the v2 REST API
    pub api_base_url: String,

    /// OAuth token endpoint
    pub token_url: String,

    /// Environment variable holding the OAuth client id
    pub client_id_env: String,

    /// Environment variable holding the OAuth client secret
    pub client_secret_env: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCollectionConfig {
    /// Ranking pages to scan (50 players per page)
    pub pages_to_scan: u32,

    /// Users tracked regardless of rank
    #[serde(default)]
    pub manual_user_ids: Vec<UserId>,

    /// Users whose recent scores are fetched concurrently
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    pub batch_delay_ms: u64,

    /// Pause between ranking pages in milliseconds
    pub page_delay_ms: u64,

    /// Recent scores requested per user
    pub recent_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Ranking pages to scan (50 players per page)
    pub pages_to_scan: u32,

    /// Pause between ranking pages in milliseconds
    pub page_delay_ms: u64,

    /// Ids per bulk user lookup (the API caps this at 50)
    pub stats_batch_size: usize,

    /// Users whose best score is fetched concurrently
    pub top_play_batch_size: usize,

    /// Pause between batches in milliseconds
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Output file, relative to the data directory
    pub output_file: PathBuf,

    /// yt-dlp executable
    pub yt_dlp_bin: String,

    /// Channels to list
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Output format (`pretty`, `json`, `compact`)
    pub format: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            country: "IQ".to_string(),
            mode: "osu".to_string(),
            data_dir: PathBuf::from("data"),
            osu: OsuApiConfig {
                api_base_url: "https://osu.ppy.sh/api/v2".to_string(),
                token_url: "https://osu.ppy.sh/oauth/token".to_string(),
                client_id_env: "OSU_CLIENT_ID".to_string(),
                client_secret_env: "OSU_CLIENT_SECRET".to_string(),
                request_timeout_secs: 30,
            },
            scores: ScoreCollectionConfig {
                pages_to_scan: 4,
                manual_user_ids: Vec::new(),
                batch_size: 10,
                batch_delay_ms: 1000,
                page_delay_ms: 0,
                recent_limit: 10,
            },
            leaderboard: LeaderboardConfig {
                pages_to_scan: 10,
                page_delay_ms: 300,
                stats_batch_size: 50,
                top_play_batch_size: 10,
                batch_delay_ms: 800,
            },
            videos: VideoConfig {
                output_file: PathBuf::from("videos.json"),
                yt_dlp_bin: "yt-dlp".to_string(),
                channels: vec![
                    ChannelConfig {
                        id: "UCuzHfz9jikRLrow8lcyjEQQ".to_string(),
                        name: "FancyToast".to_string(),
                    },
                    ChannelConfig {
                        id: "UC2tN8yIRVdZ8-Ig2REhPPWg".to_string(),
                        name: "Ano".to_string(),
                    },
                ],
            },
            logging: LoggingConfig { level: "info".to_string(), format: "pretty".to_string() },
        }
    }
}

impl FetcherConfig {
    /// Load configuration from defaults, the optional file named by
    /// `OSU_FETCHER_CONFIG`, and `OSU_FETCHER__*` environment overrides
    pub fn from_env() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load(file.as_deref(), default_environment())
    }

    /// Load configuration layering defaults, an optional TOML file and an
    /// environment source
    pub fn load(file: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            tracing::debug!("Loading configuration from file: {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder.add_source(environment).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(FetcherError::invalid_config(format!(
                "country must be a two-letter uppercase code, got {:?}",
                self.country
            )));
        }

        if !GAME_MODES.contains(&self.mode.as_str()) {
            return Err(FetcherError::invalid_config(format!(
                "mode must be one of {:?}, got {:?}",
                GAME_MODES, self.mode
            )));
        }

        if self.scores.batch_size == 0
            || self.leaderboard.stats_batch_size == 0
            || self.leaderboard.top_play_batch_size == 0
        {
            return Err(FetcherError::invalid_config("batch sizes must be greater than 0"));
        }

        if self.leaderboard.stats_batch_size > 50 {
            return Err(FetcherError::invalid_config(
                "leaderboard.stats_batch_size cannot exceed 50 ids per lookup",
            ));
        }

        for (key, pages) in [
            ("scores.pages_to_scan", self.scores.pages_to_scan),
            ("leaderboard.pages_to_scan", self.leaderboard.pages_to_scan),
        ] {
            if pages > MAX_RANKING_PAGES {
                return Err(FetcherError::invalid_config(format!(
                    "{key} cannot exceed {MAX_RANKING_PAGES}, got {pages}"
                )));
            }
        }

        if self.scores.recent_limit == 0 {
            return Err(FetcherError::invalid_config("scores.recent_limit must be greater than 0"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.osu.request_timeout_secs)
    }

    /// Persistence configuration rooted at `data_dir`
    pub fn persistence(&self) -> persistence::PersistenceConfig {
        persistence::PersistenceConfig::new(&self.data_dir)
    }
}

impl ScoreCollectionConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl LeaderboardConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

fn default_environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("scores.manual_user_ids")
}
