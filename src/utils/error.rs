//! The `error` module defines the error types used within the `tinymq` application.
//!
//! Two families exist:
//! - [`BrokerError`]: user-facing failures of a broker operation. They are
//!   recovered at the protocol boundary and their `Display` text is what the
//!   requesting client receives.
//! - [`TransportError`]: failures of the connection itself. They are never
//!   reported to the peer; they end that connection's worker and trigger
//!   session teardown.

use thiserror::Error;

use crate::session::SessionId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Cannot create topic with +, # symbol.")]
    InvalidTopicName(String),

    #[error("Invalid topic.")]
    UnknownTopic(String),

    #[error("You are not subscribed to this topic.")]
    NotSubscribed(String),

    #[error("No topic matches for {0}.")]
    NoWildcardMatch(String),

    /// Carries the usage string of the offending command.
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(&'static str),

    #[error("Unknown session {0}")]
    UnknownSession(SessionId),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    Closed,

    #[error("connection handshake was not acknowledged")]
    HandshakeRejected,

    #[error("received a frame that is not valid UTF-8")]
    InvalidUtf8,
}
