//! Per-connection session
//!
//! Runs the username handshake, registers with the relay, then pumps
//! lines both ways until either side ends. Generic over the byte stream,
//! so tests can drive it with in-memory pipes.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tokio_util::codec::{Framed, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::codec::{self, RelayLineCodec};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{ChatMessage, REJECTION_LINE};
use crate::peer::Peer;
use crate::server::RelayCommand;
use crate::types::{SessionId, Username};

/// Session lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Active,
    Closed,
}

/// Per-connection tuning taken from the server config
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub outbound_buffer: usize,
    pub idle_timeout: Option<Duration>,
    pub max_line_length: usize,
}

impl From<&ServerConfig> for SessionOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            outbound_buffer: config.outbound_buffer,
            idle_timeout: config.idle_timeout(),
            max_line_length: config.max_line_length,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Server-side state of one connection
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub peer_addr: String,
    username: Option<Username>,
    state: ConnectionState,
}

impl Session {
    pub fn new(peer_addr: String) -> Self {
        Self {
            id: SessionId::new(),
            peer_addr,
            username: None,
            state: ConnectionState::Handshaking,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    /// Handshaking → Active. The username is fixed from here on.
    ///
    /// Returns false if the session was not handshaking.
    pub fn activate(&mut self, username: Username) -> bool {
        if self.state != ConnectionState::Handshaking {
            return false;
        }
        self.username = Some(username);
        self.state = ConnectionState::Active;
        true
    }

    /// Move to Closed from any state.
    ///
    /// Returns true only on the call that closes an Active session, i.e.
    /// when the caller must deregister it.
    pub fn close(&mut self) -> bool {
        let was_active = self.state == ConnectionState::Active;
        self.state = ConnectionState::Closed;
        was_active
    }
}

/// Handle one accepted connection until it closes
///
/// `handshake_permit` is held only while the username is awaited and is
/// released as soon as the session becomes active.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: String,
    relay_tx: mpsc::Sender<RelayCommand>,
    handshake_permit: OwnedSemaphorePermit,
    options: SessionOptions,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut session = Session::new(peer_addr);
    let mut lines = Framed::new(
        stream,
        RelayLineCodec::with_max_length(options.max_line_length),
    );
    debug!("Session {} handshaking with {}", session.id, session.peer_addr);

    let candidate = match next_line(&mut lines, options.idle_timeout).await {
        Some(line) => line?,
        None => {
            session.close();
            return Err(AppError::HandshakeAborted);
        }
    };

    let username = match Username::parse(&candidate) {
        Ok(username) => username,
        Err(e) => {
            warn!("Rejecting {} from {}: {}", session.id, session.peer_addr, e);
            lines.send(REJECTION_LINE).await?;
            session.close();
            return Ok(());
        }
    };

    session.activate(username.clone());
    drop(handshake_permit);
    let id = session.id;
    info!("{} connected from {} as {}", id, session.peer_addr, username);

    // Relay -> client line queue
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(options.outbound_buffer.max(1));

    if relay_tx
        .send(RelayCommand::Join {
            peer: Peer::new(id, username.clone(), msg_tx),
        })
        .await
        .is_err()
    {
        error!("Failed to register {} - relay closed", id);
        session.close();
        return Err(AppError::ChannelSend);
    }

    let (mut sink, mut stream) = lines.split::<String>();

    // Client -> relay
    let read_loop = async {
        while let Some(line) = next_line(&mut stream, options.idle_timeout).await {
            let message = ChatMessage::new(username.clone(), codec::decode(&line?));
            if relay_tx
                .send(RelayCommand::Chat { id, message })
                .await
                .is_err()
            {
                debug!("Relay closed, ending read loop for {}", id);
                return Err(AppError::ChannelSend);
            }
        }
        Ok::<(), AppError>(())
    };

    // Relay -> client
    let write_loop = async {
        while let Some(line) = msg_rx.recv().await {
            sink.send(line).await?;
        }
        // Queue closed: the relay dropped us
        if let Err(e) = sink.close().await {
            debug!("Closing connection for {} failed: {}", id, e);
        }
        Ok::<(), AppError>(())
    };

    let outcome = tokio::select! {
        res = read_loop => {
            debug!("Read side finished for {}", id);
            res
        }
        res = write_loop => {
            debug!("Write side finished for {}", id);
            res
        }
    };

    if session.close() {
        let _ = relay_tx.send(RelayCommand::Leave { id }).await;
    }
    drop((sink, stream));

    info!("{} ({}) disconnected", username, id);
    outcome
}

/// Next inbound line, giving up after `idle` if set
async fn next_line<St>(stream: &mut St, idle: Option<Duration>) -> Option<Result<String, AppError>>
where
    St: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    let item = match idle {
        Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
            Ok(item) => item,
            Err(_) => return Some(Err(AppError::IdleTimeout)),
        },
        None => stream.next().await,
    };
    item.map(|res| res.map_err(AppError::from))
}
