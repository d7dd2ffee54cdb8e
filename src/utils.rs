use std::time::Duration;

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

use crate::types::{Token, TokenResponse};

pub const STATE_LENGTH: usize = 16;

/// Seconds before expiry at which a token is treated as expired.
pub const EXPIRY_MARGIN_SECS: u64 = 240;

pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

pub fn now_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Delay between two scheduled refreshes: half the token lifetime, at least a second.
pub fn refresh_interval(expires_in: u64) -> Duration {
    Duration::from_secs((expires_in / 2).max(1))
}

pub fn is_expired(token: &Token, now: u64) -> bool {
    let deadline = token
        .obtained_at
        .saturating_add(token.expires_in)
        .saturating_sub(EXPIRY_MARGIN_SECS);
    now >= deadline
}

/// Turns a token endpoint response into a [`Token`].
///
/// `previous_refresh` is used when the response carries no refresh token.
pub fn token_from_response(
    response: TokenResponse,
    previous_refresh: Option<&str>,
    obtained_at: u64,
) -> Token {
    let refresh_token = response
        .refresh_token
        .or_else(|| previous_refresh.map(str::to_string))
        .unwrap_or_default();

    Token {
        access_token: response.access_token,
        refresh_token,
        scope: response.scope.unwrap_or_default(),
        expires_in: response.expires_in,
        obtained_at,
    }
}
