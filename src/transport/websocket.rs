//! WebSocket transport
//!
//! This file implements the WebSocket listener that carries the text protocol.
//! Responsibilities:
//! - Accept TCP/WebSocket connections, up to a configured connection cap
//! - Spawn one worker task per connection running the protocol state machine
//! - Forward the connection's outbound channel to the socket, closing the
//!   socket once every sender is gone
//!
//! One WebSocket text frame carries one protocol unit. Binary frames are
//! accepted when they hold UTF-8; ping/pong frames are ignored.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt, future};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, mpsc};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::SharedBroker;
use crate::protocol::{Inbound, run_session};
use crate::utils::TransportError;

/// Bind `addr` and serve until the listener fails.
pub async fn start_websocket_server(
    addr: &str,
    broker: SharedBroker,
    max_connections: usize,
) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, broker, max_connections).await
}

/// Serve connections from an already bound listener.
pub async fn serve(
    listener: TcpListener,
    broker: SharedBroker,
    max_connections: usize,
) -> Result<(), TransportError> {
    info!("WebSocket server listening on ws://{}", listener.local_addr()?);
    let permits = Arc::new(Semaphore::new(max_connections));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        let Ok(permit) = permits.clone().try_acquire_owned() else {
            warn!(%peer, max_connections, "connection limit reached, dropping connection");
            continue;
        };

        let broker = broker.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, broker).await;
            drop(permit);
        });
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, broker: SharedBroker) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    debug!(%peer, "connection accepted");

    let (mut ws_sender, ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                warn!(%peer, "Failed to send message: {e}");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let inbound = ws_receiver.filter_map(|frame| future::ready(inbound_text(frame)));
    futures_util::pin_mut!(inbound);

    if let Err(e) = run_session(broker, inbound, tx).await {
        debug!(%peer, "connection ended: {e}");
    }
    let _ = writer.await;
    debug!(%peer, "connection closed");
}

/// Map one WebSocket frame to a protocol unit. Control frames yield `None`.
fn inbound_text(frame: Result<WsMessage, tungstenite::Error>) -> Option<Inbound> {
    match frame {
        Ok(WsMessage::Text(text)) => Some(Ok(text.to_string())),
        Ok(WsMessage::Binary(data)) => Some(
            String::from_utf8(data.to_vec()).map_err(|_| TransportError::InvalidUtf8),
        ),
        Ok(WsMessage::Close(_)) => Some(Err(TransportError::Closed)),
        Ok(_) => None,
        Err(e) => Some(Err(e.into())),
    }
}
