//! Error types for the dashboard client.
//!
//! `DashboardError` collects every failure the client can observe. None of
//! them is fatal: the session turns each into a log line, a user-visible
//! notification, or both, and keeps running.
//!
//! ## Error Categories
//!
//! - **Transport**: the server channel could not be opened or dropped. The
//!   connection manager recovers from these by reconnecting.
//! - **`NotConnected`**: a command was issued while the channel was down. It
//!   is reported once and never queued.
//! - **`Json`** / **`UnknownEventType`**: inbound payloads that cannot be
//!   routed. These are logged and dropped.
//! - **`Http`** / **`MediaRejected`**: media listing or deletion failed. The
//!   catalog is left as it was.
//! - **`Config`** / **`InvalidAddress`**: startup configuration problems.

use thiserror::Error;

use crate::address::AddressError;

/// Result type alias using [`DashboardError`].
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors that can occur while running the dashboard client.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A command was sent while the server channel was not open.
    #[error("Not connected to server")]
    NotConnected,

    /// The configured server address could not be normalised.
    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The WebSocket channel failed to open or broke while in use.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound or outbound payload was not valid JSON for its type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An inbound message carried a `type` this client does not handle.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// A media endpoint could not be reached or returned garbage.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered a media request with `success: false`.
    #[error("Media request rejected: {0}")]
    MediaRejected(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session loop has stopped and no longer accepts requests.
    #[error("Dashboard session has stopped")]
    SessionClosed,
}

impl From<figment::Error> for DashboardError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DashboardError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
