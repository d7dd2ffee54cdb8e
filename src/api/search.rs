use std::sync::Arc;

use axum::{Extension, extract::Query, response::Json};

use super::ApiError;
use crate::{
    management::AppState,
    types::{SearchParams, UriResponse},
};

pub async fn search(
    Query(params): Query<SearchParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<UriResponse>, ApiError> {
    let query = params.q.ok_or(ApiError::MissingQuery)?;
    let token = state
        .tokens
        .valid_access_token(&state.client)
        .await
        .map_err(ApiError::Search)?;

    let uri = state
        .client
        .first_track_uri(&token, &query)
        .await
        .map_err(ApiError::Search)?;

    Ok(Json(UriResponse { uri }))
}
