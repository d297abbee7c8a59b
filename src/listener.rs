//! TCP listener and connection dispatch
//!
//! Owns the listening socket and the relay actor. Every accepted
//! connection gets its own task; a semaphore bounds how many of them may
//! be in the handshake at once, and the rest wait their turn.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::server::{Relay, RelayCommand};
use crate::session::{handle_connection, SessionOptions};

/// Channel buffer size for relay commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Bound listening socket, ready to serve
pub struct Listener {
    listener: TcpListener,
    config: ServerConfig,
    handshake_slots: Arc<Semaphore>,
}

impl Listener {
    /// Bind the configured address
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!("Chat relay listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            handshake_slots: Arc::new(Semaphore::new(config.handshake_workers.max(1))),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the relay and accept connections until `shutdown` resolves
    ///
    /// A failed `accept` ends the loop with an error: the server must not
    /// keep running without accepting anyone.
    pub async fn run<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        let (relay_tx, relay_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        tokio::spawn(Relay::new(relay_rx, self.config.write_stall()).run());

        let options = SessionOptions::from(&self.config);
        let mut tick = tokio::time::interval(self.config.accept_tick());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        tick.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            return Err(e.into());
                        }
                    };
                    info!("New connection from {}", addr);
                    self.dispatch(stream, addr, relay_tx.clone(), options.clone());
                }
                _ = tick.tick() => {
                    debug!(
                        "Waiting for client connections ({} handshake slots free)",
                        self.handshake_slots.available_permits()
                    );
                }
            }
        }
    }

    /// Spawn the session task; it queues for a handshake slot before reading
    fn dispatch(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        relay_tx: mpsc::Sender<RelayCommand>,
        options: SessionOptions,
    ) {
        let slots = Arc::clone(&self.handshake_slots);

        tokio::spawn(async move {
            let Ok(permit) = slots.acquire_owned().await else {
                return;
            };
            let peer_addr = addr.to_string();
            if let Err(e) = handle_connection(stream, peer_addr, relay_tx, permit, options).await {
                warn!("Connection {} ended with error: {}", addr, e);
            }
        });
    }
}
