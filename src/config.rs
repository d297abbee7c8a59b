//! Server configuration
//!
//! Command line flags with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Port the reference deployment listens on
pub const DEFAULT_PORT: u16 = 2003;

/// Handshakes admitted concurrently
pub const DEFAULT_HANDSHAKE_WORKERS: usize = 10;

/// Lines queued per peer before broadcasts wait on its writer
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Seconds a broadcast waits on a full peer queue before dropping the peer
pub const DEFAULT_WRITE_STALL_SECS: u64 = 10;

/// Environment variables the server reads its flags from
pub const ENV_VARS: [&str; 7] = [
    "CHAT_RELAY_HOST",
    "CHAT_RELAY_PORT",
    "CHAT_RELAY_HANDSHAKE_WORKERS",
    "CHAT_RELAY_OUTBOUND_BUFFER",
    "CHAT_RELAY_WRITE_STALL_SECS",
    "CHAT_RELAY_IDLE_TIMEOUT_SECS",
    "CHAT_RELAY_LOG_FILE",
];

/// Chat relay server
#[derive(Parser, Clone, Debug)]
#[command(name = "chat_relay", version, about = "Line-oriented TCP chat relay")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, env = "CHAT_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CHAT_RELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connections allowed to run their handshake at the same time;
    /// further connections wait for a slot
    #[arg(
        long,
        env = "CHAT_RELAY_HANDSHAKE_WORKERS",
        default_value_t = DEFAULT_HANDSHAKE_WORKERS
    )]
    pub handshake_workers: usize,

    /// Outbound lines buffered per client
    #[arg(
        long,
        env = "CHAT_RELAY_OUTBOUND_BUFFER",
        default_value_t = DEFAULT_OUTBOUND_BUFFER
    )]
    pub outbound_buffer: usize,

    /// Drop a client whose outbound queue stays full this many seconds
    #[arg(
        long,
        env = "CHAT_RELAY_WRITE_STALL_SECS",
        default_value_t = DEFAULT_WRITE_STALL_SECS
    )]
    pub write_stall_secs: u64,

    /// Also append log events to this file
    #[arg(long, env = "CHAT_RELAY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Close active sessions silent for this many seconds (off when unset)
    #[arg(long, env = "CHAT_RELAY_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Longest accepted inbound line, in bytes
    #[arg(long, default_value_t = crate::codec::DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Seconds between "waiting for connections" log lines
    #[arg(long, default_value_t = 5)]
    pub accept_tick_secs: u64,
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    pub fn write_stall(&self) -> Duration {
        Duration::from_secs(self.write_stall_secs)
    }

    pub fn accept_tick(&self) -> Duration {
        Duration::from_secs(self.accept_tick_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            handshake_workers: DEFAULT_HANDSHAKE_WORKERS,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            write_stall_secs: DEFAULT_WRITE_STALL_SECS,
            log_file: None,
            idle_timeout_secs: None,
            max_line_length: crate::codec::DEFAULT_MAX_LINE_LENGTH,
            accept_tick_secs: 5,
        }
    }
}
