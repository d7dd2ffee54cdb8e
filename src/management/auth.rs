use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle, time::sleep};

use crate::{
    spotify::{SpotifyClient, SpotifyError},
    success,
    types::Token,
    utils, warning,
};

/// Owner of the single in-memory token and its refresh timer.
#[derive(Debug, Default)]
pub struct TokenManager {
    token: Mutex<Option<Token>>,
    refresher: Mutex<Option<JoinHandle<()>>>,
    // Held for the duration of a refresh request, never together with `token`.
    refreshing: Mutex<()>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly obtained token and (re)starts the refresh timer.
    ///
    /// A previous timer, left over from an earlier login, is aborted first so
    /// only one refresh loop runs at a time.
    pub async fn install(self: &Arc<Self>, token: Token, client: SpotifyClient) {
        let interval = utils::refresh_interval(token.expires_in);

        let mut refresher = self.refresher.lock().await;
        if let Some(previous) = refresher.take() {
            previous.abort();
        }
        // A refresh of the aborted loop may still be in flight; wait it out so
        // its result cannot replace the new token.
        let _refreshing = self.refreshing.lock().await;
        *self.token.lock().await = Some(token);

        let manager = Arc::clone(self);
        *refresher = Some(tokio::spawn(async move {
            manager.refresh_loop(client, interval).await;
        }));
    }

    /// Replaces the stored token without touching the timer.
    pub async fn set(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    pub async fn current(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.lock().await.is_some()
    }

    /// Returns an access token that is not about to expire.
    ///
    /// The timer normally keeps the token fresh; if it falls behind (failed
    /// refresh, suspended machine) the token is refreshed on the spot.
    pub async fn valid_access_token(&self, client: &SpotifyClient) -> Result<String, SpotifyError> {
        let token = self.current().await.ok_or(SpotifyError::NotAuthenticated)?;
        if !utils::is_expired(&token, utils::now_timestamp()) {
            return Ok(token.access_token);
        }

        let _refreshing = self.refreshing.lock().await;
        // Another request may have refreshed while we waited.
        let token = self.current().await.ok_or(SpotifyError::NotAuthenticated)?;
        if !utils::is_expired(&token, utils::now_timestamp()) {
            return Ok(token.access_token);
        }

        let refreshed = client.refresh_token(&token.refresh_token).await?;
        let access = refreshed.access_token.clone();
        self.set(refreshed).await;
        Ok(access)
    }

    async fn refresh_loop(self: Arc<Self>, client: SpotifyClient, mut interval: std::time::Duration) {
        loop {
            sleep(interval).await;

            let _refreshing = self.refreshing.lock().await;
            let Some(refresh) = self.current().await.map(|t| t.refresh_token) else {
                return;
            };

            match client.refresh_token(&refresh).await {
                Ok(token) => {
                    interval = utils::refresh_interval(token.expires_in);
                    self.set(token).await;
                    success!("Access token refreshed");
                }
                Err(e) => warning!("Token refresh failed: {}", e),
            }
        }
    }

    /// Stops the refresh timer, if one is running.
    pub async fn stop(&self) {
        if let Some(handle) = self.refresher.lock().await.take() {
            handle.abort();
        }
    }
}
