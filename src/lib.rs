//! Line-oriented TCP Chat Relay Library
//!
//! A multi-client broadcast relay built on tokio: every line a client
//! sends is stamped with time and sender and fanned out to everyone
//! connected, and every join or leave is followed by a roster update.
//!
//! # Protocol
//! - Client → server, first line: username (`[A-Za-z0-9_]+`)
//! - Client → server, then: message text, reversed on the wire
//! - Server → client: `[HH:MM:SS] <username>: <text>` or
//!   `USERLIST:<name1>, <name2>, ...`
//!
//! All lines are CRLF-terminated.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Relay` owns the `Registry` and runs the broadcaster on it
//! - Each connection runs a `session` task talking to the relay
//! - `Listener` accepts connections and bounds concurrent handshakes
//!
//! # Example
//! ```ignore
//! use chat_relay::{Listener, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_relay::AppError> {
//!     let listener = Listener::bind(ServerConfig::default()).await?;
//!     listener.run(std::future::pending()).await
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod message;
pub mod peer;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use client::{RelayClient, RelayReceiver, RelaySender};
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use listener::Listener;
pub use message::{ChatMessage, ServerLine};
pub use peer::Peer;
pub use registry::Registry;
pub use server::{Relay, RelayCommand};
pub use session::{handle_connection, ConnectionState, Session, SessionOptions};
pub use types::{SessionId, Username};
