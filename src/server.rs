use axum::{Extension, Router, routing::get};
use std::sync::Arc;

use crate::{Res, api, config::Config, info, management::AppState, spotify::SpotifyError, warning};

pub fn build_state(config: Config) -> Result<Arc<AppState>, SpotifyError> {
    Ok(Arc::new(AppState::from_config(config)?))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/search", get(api::search))
        .route("/play", get(api::play))
        .layer(Extension(state))
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn start_api_server(state: Arc<AppState>) -> Res<()> {
    let addr = state.client.config().server_address;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening at http://{}", listener.local_addr()?);

    let tokens = Arc::clone(&state.tokens);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tokens.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warning!("Cannot listen for Ctrl-C, serving until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
