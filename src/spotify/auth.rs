use reqwest::Url;

use super::{SpotifyClient, SpotifyError, check_status};
use crate::{
    types::{Token, TokenResponse},
    utils,
};

impl SpotifyClient {
    /// Builds the URL the user is redirected to for granting access.
    ///
    /// # Arguments
    ///
    /// * `state` - Opaque value echoed back on the callback, used to match
    ///   the callback with the login that started it
    ///
    /// # Example
    ///
    /// ```
    /// let url = client.authorize_url("Xy12ab")?;
    /// // https://accounts.spotify.com/authorize?client_id=..&response_type=code&..
    /// ```
    pub fn authorize_url(&self, state: &str) -> Result<Url, SpotifyError> {
        let config = self.config();
        let scope = config.scopes.join(" ");
        Url::parse_with_params(
            &config.auth_url,
            &[
                ("client_id", config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyError::InvalidUrl(format!("{}: {}", config.auth_url, e)))
    }

    /// Exchanges an authorization code for an access and refresh token.
    ///
    /// Completes the authorization-code grant with the confidential client
    /// credentials sent as HTTP Basic auth. The code is single-use and
    /// expires within minutes, so this runs straight from the callback.
    ///
    /// # Errors
    ///
    /// - [`SpotifyError::Api`] for an invalid or reused code, or a redirect
    ///   URI that doesn't match the registered one
    /// - [`SpotifyError::Http`] for network or decoding failures
    pub async fn exchange_code(&self, code: &str) -> Result<Token, SpotifyError> {
        let config = self.config();
        let response = self
            .http
            .post(&config.token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let body = check_status(response).await?.json::<TokenResponse>().await?;
        Ok(utils::token_from_response(body, None, utils::now_timestamp()))
    }

    /// Obtains a new access token with a refresh token.
    ///
    /// Spotify may or may not rotate the refresh token. When the response
    /// doesn't carry one, the returned [`Token`] keeps `refresh_token`.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token, SpotifyError> {
        let config = self.config();
        let response = self
            .http
            .post(&config.token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let body = check_status(response).await?.json::<TokenResponse>().await?;
        Ok(utils::token_from_response(
            body,
            Some(refresh_token),
            utils::now_timestamp(),
        ))
    }
}
