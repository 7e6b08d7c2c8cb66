//! Session representation
//!
//! `Session` models one connected client. It holds the sending side of the
//! per-connection outbound channel; the transport forwards everything sent on
//! it to the peer. Dropping every sender closes the transport.

use std::collections::BTreeSet;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::utils::TransportError;

pub type SessionId = String;

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    sender: UnboundedSender<String>,
    subscriptions: BTreeSet<String>,
    disconnecting: bool,
}

impl Session {
    /// Create a session with a fresh `session-<uuid>` identity.
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self::with_id(format!("session-{}", Uuid::new_v4()), sender)
    }

    pub fn with_id(id: impl Into<SessionId>, sender: UnboundedSender<String>) -> Self {
        Self {
            id: id.into(),
            sender,
            subscriptions: BTreeSet::new(),
            disconnecting: false,
        }
    }

    /// Add a topic to the subscription set. Returns `false` if it was already held.
    pub fn subscribe(&mut self, topic: &str) -> bool {
        if self.subscriptions.contains(topic) {
            return false;
        }
        self.subscriptions.insert(topic.to_string())
    }

    /// Remove a topic from the subscription set. Returns `false` if it was not held.
    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        self.subscriptions.remove(topic)
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }

    /// Subscribed topic names in sorted order.
    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(String::as_str)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn mark_disconnecting(&mut self) {
        self.disconnecting = true;
    }

    pub fn is_disconnecting(&self) -> bool {
        self.disconnecting
    }

    /// Queue a text message for the peer.
    pub fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.sender
            .send(text.into())
            .map_err(|_| TransportError::Closed)
    }
}
