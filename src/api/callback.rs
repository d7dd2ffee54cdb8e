use std::sync::Arc;

use axum::{Extension, extract::Query, response::Html};

use super::ApiError;
use crate::{info, management::AppState, success, types::CallbackParams};

pub const LOGIN_SUCCESS: &str = "Login successful! You can now use the /search and /play endpoints.";

/// Completes the login: validates the callback and exchanges the code.
///
/// On success the token is installed in the shared [`AppState`] and the
/// refresh timer starts.
pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<&'static str>, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::Callback(error));
    }

    if !state.finish_login(params.state.as_deref()).await {
        return Err(ApiError::StateMismatch);
    }

    let Some(code) = params.code else {
        return Err(ApiError::MissingCode);
    };

    let token = state
        .client
        .exchange_code(&code)
        .await
        .map_err(ApiError::Tokens)?;

    info!("The access token is {}", token.access_token);
    info!("The refresh token is {}", token.refresh_token);
    state.tokens.install(token, state.client.clone()).await;
    success!("Login successful");

    Ok(Html(LOGIN_SUCCESS))
}
