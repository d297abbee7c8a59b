//! Peer struct definition
//!
//! The registry's view of an active session: identity, username and the
//! sending half of the session's outbound queue. The session task keeps
//! the connection itself.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::{SessionId, Username};

/// Registered session
#[derive(Debug)]
pub struct Peer {
    /// Connection identity
    pub id: SessionId,
    /// Username fixed at handshake
    pub username: Username,
    /// Relay → session outbound line queue
    pub sender: mpsc::Sender<String>,
}

impl Peer {
    /// Create a new peer with the given identity and outbound queue
    pub fn new(id: SessionId, username: Username, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            username,
            sender,
        }
    }

    /// Queue one line for this peer
    ///
    /// Waits for queue space while the writer drains it. Fails if the
    /// writer is gone, or if no space frees up within `stall`.
    pub async fn send(&self, line: &str, stall: Duration) -> Result<(), SendError> {
        self.sender.send_timeout(line.to_string(), stall).await?;
        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.username.as_str()
    }
}
