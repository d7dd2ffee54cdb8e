use std::sync::Arc;

use axum::{Extension, extract::Query};

use super::ApiError;
use crate::{management::AppState, types::PlayParams};

pub const PLAYBACK_STARTED: &str = "Playback started";

pub async fn play(
    Query(params): Query<PlayParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<&'static str, ApiError> {
    let uri = params.uri.ok_or(ApiError::MissingUri)?;
    let token = state
        .tokens
        .valid_access_token(&state.client)
        .await
        .map_err(ApiError::Play)?;

    state
        .client
        .play(&token, vec![uri], params.device_id.as_deref())
        .await
        .map_err(ApiError::Play)?;

    Ok(PLAYBACK_STARTED)
}
