//! # Spotify Integration Module
//!
//! This module is the thin client layer between the proxy's HTTP handlers and
//! the Spotify Web API. It owns a single [`reqwest::Client`] and the endpoint
//! configuration, and exposes one method per upstream operation.
//!
//! ## Architecture
//!
//! ```text
//! API Layer (axum handlers)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code grant, refresh)
//!     ├── Search (tracks)
//!     └── Player (start playback)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /authorize` - Authorization URL the user is redirected to
//! - `POST /api/token` - Code exchange and token refresh
//! - `GET /search?type=track` - Track search
//! - `PUT /me/player/play` - Start or resume playback
//!
//! ## Error Handling
//!
//! Every call returns [`SpotifyError`]. Non-2xx responses become
//! [`SpotifyError::Api`] with the message Spotify put in the body. Nothing is
//! retried; rate limits surface as `429` API errors.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

pub mod auth;
pub mod player;
pub mod search;

/// Upper bound for a whole upstream request, connect to last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("request to Spotify failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spotify responded with {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("not logged in, visit /login first")]
    NotAuthenticated,
    #[error("no tracks found")]
    NoTracks,
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

/// Client for the subset of the Spotify Web API the proxy needs.
///
/// Cheap to clone: the underlying connection pool and configuration are shared.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    config: Arc<Config>,
}

impl SpotifyClient {
    pub fn new(config: Arc<Config>) -> Result<Self, SpotifyError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: Client, config: Arc<Config>) -> Self {
        SpotifyClient { http, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn api(&self, path: &str) -> String {
        format!("{base}{path}", base = self.config.api_url)
    }
}

/// Passes 2xx responses through and turns everything else into [`SpotifyError::Api`].
async fn check_status(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SpotifyError::Api {
        status,
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        }),
    })
}

/// Extracts the human readable message from a Spotify error body.
///
/// The Web API nests it as `{"error": {"message": ..}}` while the accounts
/// service uses `{"error": .., "error_description": ..}`.
pub fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    if let Some(message) = json["error"]["message"].as_str() {
        return Some(message.to_string());
    }
    if let Some(description) = json["error_description"].as_str() {
        return Some(description.to_string());
    }
    json["error"].as_str().map(str::to_string)
}
