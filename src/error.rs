//! Error types for the chat relay
//!
//! Defines application-level errors and outbound queue errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Everything except listener failures is local to one connection:
/// the session logs it and closes that connection only.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the connection, or for the server when raised by the listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (line too long or transport failure)
    #[error("Line framing error: {0}")]
    Lines(#[from] LinesCodecError),

    /// Channel send error (fatal - relay actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Handshake line failed username validation
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    /// Peer closed the connection before sending a username
    #[error("Connection closed during handshake")]
    HandshakeAborted,

    /// Active session was silent longer than the configured idle timeout
    #[error("Idle timeout")]
    IdleTimeout,

    /// Log subscriber could not be installed
    #[error("Failed to init logging: {0}")]
    Logging(String),
}

/// Outbound queue errors
///
/// Raised when the relay cannot hand a line to a peer's writer.
/// Either variant means the peer gets pruned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The peer's writer has gone away
    #[error("Channel closed")]
    ChannelClosed,

    /// The queue stayed full for the whole stall timeout
    #[error("Writer stalled")]
    Stalled,
}

impl<T> From<tokio::sync::mpsc::error::SendTimeoutError<T>> for SendError {
    fn from(err: tokio::sync::mpsc::error::SendTimeoutError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::SendTimeoutError::Timeout(_) => SendError::Stalled,
            tokio::sync::mpsc::error::SendTimeoutError::Closed(_) => SendError::ChannelClosed,
        }
    }
}
