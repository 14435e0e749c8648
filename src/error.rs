//! Typed errors for the storage collaborator and the outbound path.

use thiserror::Error;

use crate::live::ConnectionState;

/// Failure talking to the chat service.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("401 Unauthorized; token may be invalid, run `pairchat login`")]
    Unauthorized,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Failure to hand a message to the live channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("message content is empty")]
    EmptyContent,

    #[error("live channel is {0}, not open")]
    NotOpen(ConnectionState),

    #[error("live channel has shut down")]
    ChannelGone,

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeline has been disposed")]
    Disposed,
}
