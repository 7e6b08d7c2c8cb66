//! Per-connection protocol state machine
//!
//! A `SessionWorker` drives one connection through its phases:
//!
//! ```text
//! Handshake --(non-empty ack)--> Active --(/DISC)--> Disconnecting --(any ack)--> Closed
//!     \                            \                                               ^
//!      `--------------------------- `--------- transport failure ------------------'
//! ```
//!
//! The worker is transport-agnostic: it reads text messages from any `Stream`
//! and writes replies into the connection's outbound channel. Whatever way the
//! worker ends, the session is removed from the broker and the worker's sender
//! is dropped, which lets the transport close.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::broker::engine::{SharedBroker, lock};
use crate::protocol::command::Command;
use crate::protocol::reply::{self, CONN_ACK, DISC_ACK, INVALID_COMMAND};
use crate::session::{Session, SessionId};
use crate::utils::TransportError;

/// One inbound protocol unit as delivered by the transport.
pub type Inbound = Result<String, TransportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Handshake,
    Active,
    Disconnecting,
    Closed,
}

/// What the worker does after a command has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Reply(String),
    Silent,
    Disconnect,
}

pub struct SessionWorker {
    broker: SharedBroker,
    outbound: UnboundedSender<String>,
    session: Option<SessionId>,
    phase: Phase,
}

/// Run the protocol for one connection until it disconnects or fails.
pub async fn run_session<S>(
    broker: SharedBroker,
    inbound: S,
    outbound: UnboundedSender<String>,
) -> Result<(), TransportError>
where
    S: Stream<Item = Inbound> + Unpin,
{
    SessionWorker::new(broker, outbound).run(inbound).await
}

impl SessionWorker {
    pub fn new(broker: SharedBroker, outbound: UnboundedSender<String>) -> Self {
        Self {
            broker,
            outbound,
            session: None,
            phase: Phase::Handshake,
        }
    }

    pub async fn run<S>(mut self, mut inbound: S) -> Result<(), TransportError>
    where
        S: Stream<Item = Inbound> + Unpin,
    {
        let result = self.drive(&mut inbound).await;
        match &result {
            Ok(()) => debug!(session = ?self.session, "session closed gracefully"),
            Err(e) => warn!(session = ?self.session, "session ended: {e}"),
        }
        self.teardown();
        result
    }

    async fn drive<S>(&mut self, inbound: &mut S) -> Result<(), TransportError>
    where
        S: Stream<Item = Inbound> + Unpin,
    {
        loop {
            match self.phase {
                Phase::Handshake => self.handshake(inbound).await?,
                Phase::Active => {
                    let text = next_message(inbound).await?;
                    let Some(id) = self.session.as_deref() else {
                        return Err(TransportError::Closed);
                    };
                    debug!(session = id, command = %text, "command received");
                    match dispatch(&self.broker, id, &text) {
                        Step::Reply(reply) => self.send(reply)?,
                        Step::Silent => {}
                        Step::Disconnect => {
                            self.send(DISC_ACK)?;
                            self.phase = Phase::Disconnecting;
                        }
                    }
                }
                Phase::Disconnecting => {
                    // any acknowledgment, or the peer going away, completes the disconnect
                    match inbound.next().await {
                        Some(Ok(ack)) => debug!(session = ?self.session, ack = %ack, "disconnect acknowledged"),
                        Some(Err(e)) => debug!(session = ?self.session, "disconnect ack not received: {e}"),
                        None => {}
                    }
                    self.phase = Phase::Closed;
                }
                Phase::Closed => return Ok(()),
            }
        }
    }

    async fn handshake<S>(&mut self, inbound: &mut S) -> Result<(), TransportError>
    where
        S: Stream<Item = Inbound> + Unpin,
    {
        self.send(CONN_ACK)?;
        let ack = next_message(inbound).await?;
        if ack.is_empty() {
            return Err(TransportError::HandshakeRejected);
        }

        let session = Session::new(self.outbound.clone());
        let id = session.id.clone();
        lock(&self.broker).register_session(session);
        info!(session = %id, ack = %ack, "connection acknowledged");

        self.session = Some(id);
        self.phase = Phase::Active;
        Ok(())
    }

    fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.outbound
            .send(text.into())
            .map_err(|_| TransportError::Closed)
    }

    fn teardown(&mut self) {
        if let Some(id) = self.session.take() {
            lock(&self.broker).remove_session(&id);
        }
        self.phase = Phase::Closed;
    }
}

/// Parse `text` and apply it to the broker on behalf of session `id`.
///
/// User-facing failures become replies; nothing here fails the connection.
pub fn dispatch(broker: &SharedBroker, id: &str, text: &str) -> Step {
    let command = match Command::parse(text) {
        Ok(command) => command,
        Err(e) => return Step::Reply(e.to_string()),
    };

    let mut broker = lock(broker);
    let result = match command {
        Command::Disconnect => broker.begin_disconnect(id).map(|()| Step::Disconnect),
        Command::Subscribe { pattern } => broker
            .subscribe(id, &pattern)
            .map(|outcome| Step::Reply(reply::subscribed(&outcome))),
        Command::Unsubscribe { pattern } => broker
            .unsubscribe(id, &pattern)
            .map(|outcome| Step::Reply(reply::unsubscribed(&outcome))),
        Command::Publish { pattern, body } => {
            broker.publish(id, &pattern, &body).map(|_| Step::Silent)
        }
        Command::PublishRetain { pattern, body } => broker
            .publish_retain(id, &pattern, &body)
            .map(|_| Step::Silent),
        Command::List => broker
            .list(id)
            .map(|topics| Step::Reply(reply::listed(&topics))),
        Command::Unknown => Ok(Step::Reply(INVALID_COMMAND.to_string())),
    };
    result.unwrap_or_else(|e| Step::Reply(e.to_string()))
}

async fn next_message<S>(inbound: &mut S) -> Result<String, TransportError>
where
    S: Stream<Item = Inbound> + Unpin,
{
    inbound.next().await.unwrap_or(Err(TransportError::Closed))
}
