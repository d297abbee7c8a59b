//! Chat Relay Server - Entry Point
//!
//! Parses configuration, binds the listener and serves until Ctrl-C.

use clap::Parser;
use tracing::{error, info};

use chat_relay::{logging, Listener, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    // Use RUST_LOG env var to control log level
    logging::init(config.log_file.as_deref())?;

    let listener = match Listener::bind(config.clone()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr(), e);
            return Err(e.into());
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = listener.run(shutdown).await {
        error!("Listener stopped: {}", e);
        return Err(e.into());
    }

    info!("Chat relay stopped");
    Ok(())
}
