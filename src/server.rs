//! Relay actor implementation
//!
//! The single owner of the registry. Sessions talk to it through an mpsc
//! channel, which serializes every registry mutation and fan-out without
//! locks and keeps each session's messages in the order they were read.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broadcast::{broadcast_message, broadcast_user_list};
use crate::message::ChatMessage;
use crate::peer::Peer;
use crate::registry::Registry;
use crate::types::SessionId;

/// Commands sent from sessions to the relay actor
#[derive(Debug)]
pub enum RelayCommand {
    /// Handshake succeeded; register and announce the roster
    Join { peer: Peer },
    /// Session closed; deregister and announce the roster
    Leave { id: SessionId },
    /// A line was read from an active session
    Chat { id: SessionId, message: ChatMessage },
}

/// The relay actor
///
/// Holds the registry and runs the broadcaster on it.
pub struct Relay {
    registry: Registry,
    /// How long a full outbound queue may block a fan-out before its peer is dropped
    write_stall: Duration,
    /// Command receiver channel
    receiver: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    /// Create a new relay with the given command receiver
    pub fn new(receiver: mpsc::Receiver<RelayCommand>, write_stall: Duration) -> Self {
        Self {
            registry: Registry::new(),
            write_stall,
            receiver,
        }
    }

    /// Run the relay event loop
    ///
    /// Processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("Relay started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Relay shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Join { peer } => self.handle_join(peer).await,
            RelayCommand::Leave { id } => self.handle_leave(id).await,
            RelayCommand::Chat { id, message } => self.handle_chat(id, message).await,
        }
    }

    async fn handle_join(&mut self, peer: Peer) {
        let id = peer.id;
        let username = peer.username.clone();
        if !self.registry.add(peer) {
            debug!("Session {} already registered", id);
            return;
        }

        info!("{} joined ({} active)", username, self.registry.len());
        let pruned = broadcast_user_list(&mut self.registry, self.write_stall).await;
        self.log_pruned(pruned);
    }

    async fn handle_leave(&mut self, id: SessionId) {
        let Some(peer) = self.registry.remove(id) else {
            return;
        };

        info!("{} left ({} active)", peer.username, self.registry.len());
        let pruned = broadcast_user_list(&mut self.registry, self.write_stall).await;
        self.log_pruned(pruned);
    }

    async fn handle_chat(&mut self, id: SessionId, message: ChatMessage) {
        if !self.registry.contains(id) {
            debug!("Dropping message from unregistered session {}", id);
            return;
        }

        debug!("Received from {}: {}", message.sender, message.text);
        let pruned =
            broadcast_message(&mut self.registry, &message.to_line(), self.write_stall).await;
        self.log_pruned(pruned);
    }

    fn log_pruned(&self, pruned: Vec<Peer>) {
        for peer in pruned {
            info!(
                "{} dropped after write failure ({} active)",
                peer.username,
                self.registry.len()
            );
        }
    }
}
