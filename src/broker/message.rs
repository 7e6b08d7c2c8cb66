//! Message and outcome definitions for the broker
//!
//! `Message` is what a broadcast delivers to subscribers. The outcome types
//! describe what a broker operation did; the protocol layer renders them into
//! the text sent back to the requesting client.

use std::fmt;

/// A published body routed to one concrete topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub body: String,
}

impl Message {
    pub fn new(topic: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            body: body.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.topic, self.body)
    }
}

/// A topic newly added to a session, with the retained message it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub topic: String,
    pub retained: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// An exact topic name was added.
    Subscribed(Grant),
    /// A wildcard expanded; only the topics not already held are listed.
    Expanded(Vec<Grant>),
    AlreadySubscribed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed(String),
    Expanded(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Concrete topics the body was routed to.
    pub topics: Vec<String>,
    /// Copies handed to session transports across all topics.
    pub deliveries: usize,
}
