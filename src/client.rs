//! Client side of the line protocol
//!
//! What a presentation layer needs: connect with a username, send user
//! text, receive classified lines, and learn when the connection is lost.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::{self, RelayLineCodec};
use crate::error::AppError;
use crate::message::ServerLine;

type ClientLines = Framed<TcpStream, RelayLineCodec>;

/// Connected relay client
pub struct RelayClient {
    sender: RelaySender,
    receiver: RelayReceiver,
}

/// Outbound half: user text to the server
pub struct RelaySender {
    sink: SplitSink<ClientLines, String>,
}

/// Inbound half: server lines to the display
pub struct RelayReceiver {
    stream: SplitStream<ClientLines>,
}

impl RelayClient {
    /// Connect and send the username line
    ///
    /// A rejected name is not detected here; the server answers with a
    /// rejection line and closes, which shows up through `recv`.
    pub async fn connect<A: ToSocketAddrs>(addr: A, username: &str) -> Result<Self, AppError> {
        let stream = TcpStream::connect(addr).await?;
        let mut lines = Framed::new(stream, RelayLineCodec::new());
        lines.send(username).await?;
        debug!("Connected as {}", username);

        let (sink, stream) = lines.split::<String>();
        Ok(Self {
            sender: RelaySender { sink },
            receiver: RelayReceiver { stream },
        })
    }

    pub async fn send(&mut self, text: &str) -> Result<(), AppError> {
        self.sender.send(text).await
    }

    pub async fn recv(&mut self) -> Option<ServerLine> {
        self.receiver.recv().await
    }

    /// Close the connection
    pub async fn disconnect(self) -> Result<(), AppError> {
        self.sender.disconnect().await
    }

    /// Split into halves that can be driven from separate tasks
    pub fn into_split(self) -> (RelaySender, RelayReceiver) {
        (self.sender, self.receiver)
    }
}

impl RelaySender {
    /// Send one user message
    ///
    /// Line breaks in `text` become spaces, then the text is encoded.
    pub async fn send(&mut self, text: &str) -> Result<(), AppError> {
        let wire = codec::encode(&codec::flatten_line(text));
        self.sink.send(wire).await?;
        Ok(())
    }

    pub async fn disconnect(mut self) -> Result<(), AppError> {
        self.sink.close().await?;
        Ok(())
    }
}

impl RelayReceiver {
    /// Next server line; `None` once the connection is lost
    pub async fn recv(&mut self) -> Option<ServerLine> {
        match self.stream.next().await? {
            Ok(line) => Some(ServerLine::parse(&line)),
            Err(e) => {
                warn!("Connection to server lost: {}", e);
                None
            }
        }
    }
}
