use std::sync::Arc;

use axum::{Extension, response::Redirect};

use super::ApiError;
use crate::{management::AppState, utils};

/// Redirects the browser to Spotify's consent page.
pub async fn login(Extension(state): Extension<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let oauth_state = utils::generate_state();
    let url = state
        .client
        .authorize_url(&oauth_state)
        .map_err(ApiError::Login)?;

    state.begin_login(oauth_state).await;
    Ok(Redirect::to(url.as_str()))
}
