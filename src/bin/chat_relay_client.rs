//! Terminal client for the chat relay
//!
//! Sends each stdin line as a message and prints what the server relays.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::config::DEFAULT_PORT;
use chat_relay::{RelayClient, ServerLine};

/// Chat relay terminal client
#[derive(Parser, Debug)]
#[command(name = "chat_relay_client", version, about = "Terminal client for the chat relay")]
struct ClientArgs {
    /// Username to join with
    username: String,

    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, env = "CHAT_RELAY_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ClientArgs::parse();
    let client = match RelayClient::connect((args.host.as_str(), args.port), &args.username).await {
        Ok(client) => client,
        Err(e) => {
            error!("Could not connect to {}:{}: {}", args.host, args.port, e);
            return Err(e.into());
        }
    };
    let (mut sender, mut receiver) = client.into_split();

    let display = tokio::spawn(async move {
        while let Some(line) = receiver.recv().await {
            match line {
                ServerLine::Chat(text) => println!("{}", text),
                ServerLine::Roster(users) => println!("Active Users: {}", users.join(", ")),
            }
        }
        println!("Connection to server lost.");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    tokio::select! {
        _ = display => {}
        res = async {
            while let Some(line) = stdin.next_line().await? {
                if !line.trim().is_empty() {
                    sender.send(&line).await?;
                }
            }
            sender.disconnect().await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        } => {
            if let Err(e) = res {
                error!("Input loop failed: {}", e);
            }
            info!("Disconnected");
        }
    }

    Ok(())
}
