//! Spotify Web API Proxy Library
//!
//! This library provides a small, single-user HTTP server in front of the
//! Spotify Web API. It performs the OAuth 2.0 authorization-code login, keeps
//! the access token fresh on a timer, and exposes convenience endpoints for
//! track search and playback.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the proxy endpoints
//! - `config` - Configuration management and environment variables
//! - `management` - Token lifecycle and shared application state
//! - `server` - Router construction and the HTTP server loop
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and wire types
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotproxy::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotproxy::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(server::build_state(config)?).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the top level of the application where errors of several kinds
/// (configuration, I/O, server) meet. Library code returns the concrete
/// error enums instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening at http://{}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for fatal startup errors. Request handlers report failures
/// with [`warning!`] and keep serving.
///
/// # Example
///
/// ```
/// error!("Cannot load configuration: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable failures, e.g. a failed token refresh or an upstream
/// error while serving a request.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
