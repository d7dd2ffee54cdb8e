use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{spotify::SpotifyError, warning};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Callback Error: {0}")]
    Callback(String),
    #[error("Callback Error: state mismatch")]
    StateMismatch,
    #[error("Callback Error: missing code")]
    MissingCode,
    #[error("Error building login URL")]
    Login(#[source] SpotifyError),
    #[error("Error getting tokens")]
    Tokens(#[source] SpotifyError),
    #[error("Error occurred during search")]
    Search(#[source] SpotifyError),
    #[error("Error occurred during search")]
    MissingQuery,
    #[error("Error occurred during playback")]
    Play(#[source] SpotifyError),
    #[error("Error occurred during playback")]
    MissingUri,
}

impl ApiError {
    fn upstream(&self) -> Option<&SpotifyError> {
        match self {
            ApiError::Login(e) | ApiError::Tokens(e) | ApiError::Search(e) | ApiError::Play(e) => {
                Some(e)
            }
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.upstream() {
            None => StatusCode::BAD_REQUEST,
            Some(SpotifyError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            Some(SpotifyError::NoTracks) => StatusCode::NOT_FOUND,
            Some(SpotifyError::InvalidUrl(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Some(SpotifyError::Api { .. }) | Some(SpotifyError::Http(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text sent to the client. Upstream details only go to the log.
    pub fn body(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match (&self, self.upstream()) {
            (_, Some(cause)) => warning!("{}: {}", self, cause),
            (ApiError::MissingQuery, _) => warning!("{}: missing `q` parameter", self),
            (ApiError::MissingUri, _) => warning!("{}: missing `uri` parameter", self),
            _ => warning!("{}", self),
        }
        (self.status_code(), self.body()).into_response()
    }
}
