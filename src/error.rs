//! src/error.rs
//!
//! Defines the library's custom, comprehensive `Error` enum using `thiserror`.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize or deserialize: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Transport unavailable, dropped `{command}` command")]
    TransportUnavailable { command: &'static str },

    #[error("A session transition is already in flight")]
    TransitionPending,

    #[error("Invalid device URL: {0}")]
    InvalidUrl(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Tokio task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("API server error: {0}")]
    ApiServer(#[from] axum::Error),
}
