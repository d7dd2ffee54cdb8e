use std::sync::Arc;

use tokio::sync::Mutex;

use super::TokenManager;
use crate::{
    config::Config,
    spotify::{SpotifyClient, SpotifyError},
};

/// Everything the request handlers share.
#[derive(Debug)]
pub struct AppState {
    pub client: SpotifyClient,
    pub tokens: Arc<TokenManager>,
    pending_state: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(client: SpotifyClient) -> Self {
        AppState {
            client,
            tokens: Arc::new(TokenManager::new()),
            pending_state: Mutex::new(None),
        }
    }

    pub fn from_config(config: Config) -> Result<Self, SpotifyError> {
        Ok(Self::new(SpotifyClient::new(Arc::new(config))?))
    }

    /// Remembers the `state` value sent with the latest authorize redirect.
    pub async fn begin_login(&self, state: String) {
        *self.pending_state.lock().await = Some(state);
    }

    /// Checks a callback's `state` against the pending login and consumes it.
    ///
    /// Returns `false` when no login is pending or the values differ. The
    /// pending value is kept on mismatch so a forged callback cannot cancel
    /// the real one.
    pub async fn finish_login(&self, state: Option<&str>) -> bool {
        let mut pending = self.pending_state.lock().await;
        let matched = matches!(
            (pending.as_deref(), state),
            (Some(expected), Some(got)) if expected == got
        );
        if matched {
            pending.take();
        }
        matched
    }
}
