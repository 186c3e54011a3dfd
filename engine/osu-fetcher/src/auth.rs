//! OAuth client-credentials exchange against the osu! token endpoint

use crate::config::OsuApiConfig;
use crate::error::{FetcherError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// OAuth client credentials read from the environment
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read the client id and secret from the variables named in the config
    pub fn from_env(config: &OsuApiConfig) -> Result<Self> {
        Ok(Self {
            client_id: read_var(&config.client_id_env)?,
            client_secret: read_var(&config.client_secret_env)?,
        })
    }
}

fn read_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FetcherError::MissingCredential { var: name.to_string() }),
    }
}

/// Bearer token valid for the rest of the run
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    scope: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

impl<'a> TokenRequest<'a> {
    fn client_credentials(credentials: &'a Credentials) -> Self {
        Self {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
            grant_type: "client_credentials",
            scope: "public",
        }
    }
}

/// Exchange client credentials for a bearer token
///
/// Every failure is fatal: nothing else can be fetched without a token.
pub async fn request_token(
    client: &Client,
    token_url: &str,
    credentials: &Credentials,
) -> Result<AccessToken> {
    let response = client
        .post(token_url)
        .json(&TokenRequest::client_credentials(credentials))
        .send()
        .await
        .map_err(|e| FetcherError::auth(format!("token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetcherError::auth(format!("token endpoint returned {status}")));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| FetcherError::auth(format!("invalid token response: {e}")))?;

    let token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FetcherError::auth("token response has no access_token"))?;

    info!("Obtained osu! API token (expires in {}s)", body.expires_in.unwrap_or_default());
    Ok(AccessToken(token))
}
