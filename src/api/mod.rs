//! # API Module
//!
//! HTTP endpoints of the proxy. Each handler is a thin async function that
//! pulls the shared [`AppState`](crate::management::AppState) out of an axum
//! `Extension`, calls the Spotify client and maps the outcome to a response.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Redirects to Spotify's authorization page.
//! - [`callback`] - Receives the authorization code, exchanges it for tokens
//!   and starts the refresh timer.
//!
//! ### Proxy
//!
//! - [`search`] - `GET /search?q=..` returns `{"uri": ..}` of the first matching track.
//! - [`play`] - `GET /play?uri=..` starts playback of a track URI.
//!
//! ### Monitoring
//!
//! - [`health`] - Application status, version and whether a user is logged in.
//!
//! ## Errors
//!
//! Failures are reported through [`ApiError`], which logs the cause and
//! answers with a short generic message and a matching status code.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use spotproxy::api::{login, callback};
//!
//! let app = Router::new()
//!     .route("/login", get(login))
//!     .route("/callback", get(callback))
//!     .layer(Extension(state));
//! ```

mod callback;
mod error;
mod health;
mod login;
mod play;
mod search;

pub use callback::{LOGIN_SUCCESS, callback};
pub use error::ApiError;
pub use health::health;
pub use login::login;
pub use play::{PLAYBACK_STARTED, play};
pub use search::search;
