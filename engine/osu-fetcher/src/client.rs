use crate::auth::AccessToken;
use crate::config::FetcherConfig;
use crate::error::Result;
use crate::models::{RankingPage, RawBestScore, RawRecentScore, UserId, UsersResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Result of a single API call that the pipelines are allowed to skip
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Failed(FetchFailure),
}

/// Why a skippable API call produced nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request never produced a response body
    Transport(String),
    /// The server answered with a non-2xx status
    Status(u16),
    /// The body was not the expected JSON shape
    Malformed(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Transport(e) => write!(f, "transport error: {e}"),
            FetchFailure::Status(code) => write!(f, "HTTP status {code}"),
            FetchFailure::Malformed(e) => write!(f, "malformed body: {e}"),
        }
    }
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            FetchOutcome::Fetched(value) => Some(value),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Fetched(value) => FetchOutcome::Fetched(f(value)),
            FetchOutcome::Failed(failure) => FetchOutcome::Failed(failure),
        }
    }
}

/// The osu! API v2 endpoints the collectors read
#[async_trait]
pub trait OsuApi: Send + Sync {
    /// `GET /rankings/{mode}/performance?country=..&cursor[page]=..`
    async fn ranking_page(&self, mode: &str, country: &str, page: u32) -> FetchOutcome<RankingPage>;

    /// `GET /users/{id}/scores/recent?limit=..&include_fails=0`
    async fn recent_scores(&self, user_id: UserId, limit: u32)
        -> FetchOutcome<Vec<RawRecentScore>>;

    /// `GET /users?ids[]=..` for up to 50 ids
    async fn users(&self, ids: &[UserId]) -> FetchOutcome<UsersResponse>;

    /// `GET /users/{id}/scores/best?limit=1&mode=..`
    async fn best_scores(&self, user_id: UserId, mode: &str) -> FetchOutcome<Vec<RawBestScore>>;
}

/// reqwest-backed osu! API client holding one bearer token for the run
pub struct OsuClient {
    client: Client,
    api_base_url: String,
    token: AccessToken,
}

impl OsuClient {
    /// Create a new client from an already built HTTP client
    pub fn new(client: Client, config: &FetcherConfig, token: AccessToken) -> Self {
        Self {
            client,
            api_base_url: config.osu.api_base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build the shared HTTP client with the configured timeout
    pub fn http_client(config: &FetcherConfig) -> Result<Client> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("osu-fetcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> FetchOutcome<T>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.api_base_url, path);
        debug!("GET {}", url);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(self.token.secret())
            .query(query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(FetchFailure::Transport(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failed(FetchFailure::Status(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::Failed(FetchFailure::Transport(e.to_string())),
        };

        match serde_json::from_slice(&body) {
            Ok(value) => FetchOutcome::Fetched(value),
            Err(e) => FetchOutcome::Failed(FetchFailure::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl OsuApi for OsuClient {
    async fn ranking_page(&self, mode: &str, country: &str, page: u32) -> FetchOutcome<RankingPage> {
        let page = page.to_string();
        self.get_json(
            &format!("/rankings/{mode}/performance"),
            &[("country", country), ("cursor[page]", page.as_str())],
        )
        .await
    }

    async fn recent_scores(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> FetchOutcome<Vec<RawRecentScore>> {
        let limit = limit.to_string();
        self.get_json(
            &format!("/users/{user_id}/scores/recent"),
            &[("limit", limit.as_str()), ("include_fails", "0")],
        )
        .await
    }

    async fn users(&self, ids: &[UserId]) -> FetchOutcome<UsersResponse> {
        let query: Vec<(&str, UserId)> = ids.iter().map(|id| ("ids[]", *id)).collect();
        self.get_json("/users", &query).await
    }

    async fn best_scores(&self, user_id: UserId, mode: &str) -> FetchOutcome<Vec<RawBestScore>> {
        self.get_json(&format!("/users/{user_id}/scores/best"), &[("limit", "1"), ("mode", mode)])
            .await
    }
}
