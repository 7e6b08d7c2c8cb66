//! CLI for tinymq
//!
//! Subcommands:
//! - `server`: run the broker behind a WebSocket listener
//! - `client`: interactive client reading commands from stdin

use clap::Parser;
use tinymq::broker::Broker;
use tinymq::config::load_config;
use tinymq::transport::client::run_client;
use tinymq::transport::start_websocket_server;
use tinymq::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tinymq")]
enum Command {
    /// Start the broker
    Server,
    /// Connect to a broker and forward stdin lines as commands
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8092")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    match Command::parse() {
        Command::Server => {
            if let Err(e) = run_server().await {
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url } => {
            logging::init("info");
            if let Err(e) = run_client(&url).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init(&config.log.level);

    let broker = Broker::with_topics(&config.broker.topics)?.into_shared();
    info!(topics = config.broker.topics.len(), "broker ready");

    let addr = config.bind_addr();
    tokio::select! {
        result = start_websocket_server(&addr, broker, config.broker.max_connections) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}
