//! Interactive terminal client
//!
//! Connects to a tinymq server, prints every message the server sends, and
//! forwards each line typed on stdin as one command. The connect and
//! disconnect handshakes are answered automatically.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tracing::{debug, info};
use tungstenite::protocol::Message as WsMessage;

use crate::protocol::reply::{CONN_ACK, DISC_ACK};
use crate::utils::TransportError;

pub const CONN_ACK_REPLY: &str = "CONN_ACK accepted by client";
pub const DISC_ACK_REPLY: &str = "DISC_ACK accepted by client";

/// What the client should do with one message from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent<'a> {
    /// Acknowledge with this text and keep going.
    Acknowledge(&'static str),
    /// Acknowledge with this text, then stop.
    AcknowledgeAndClose(&'static str),
    Print(&'a str),
}

pub fn classify(text: &str) -> ServerEvent<'_> {
    match text {
        CONN_ACK => ServerEvent::Acknowledge(CONN_ACK_REPLY),
        DISC_ACK => ServerEvent::AcknowledgeAndClose(DISC_ACK_REPLY),
        other => ServerEvent::Print(other),
    }
}

pub async fn run_client(url: &str) -> Result<(), TransportError> {
    let (ws_stream, _response) = connect_async(url).await?;
    info!("Connected to {url}");
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => text.to_string(),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        println!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                };
                match classify(&text) {
                    ServerEvent::Acknowledge(reply) => {
                        println!("{text} received from server");
                        ws_sender.send(WsMessage::text(reply)).await?;
                    }
                    ServerEvent::AcknowledgeAndClose(reply) => {
                        println!("{text} received from server");
                        ws_sender.send(WsMessage::text(reply)).await?;
                        break;
                    }
                    ServerEvent::Print(message) => println!("{message}"),
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => ws_sender.send(WsMessage::text(line)).await?,
                    None => {
                        debug!("stdin closed");
                        break;
                    }
                }
            }
        }
    }

    let _ = ws_sender.close().await;
    println!("socket closed");
    Ok(())
}
