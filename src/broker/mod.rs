//! tinymq broker
//!
//! The broker contains the topic registry, the wildcard matcher and the engine
//! that composes them with the session registry.
//!
//! Public types:
//! - `Broker`: subscribe, unsubscribe, publish, retain, list and broadcast.
//! - `TopicRegistry` / `Topic`: topic names and retained messages.
//! - `TopicFilter`: exact, multilevel (`/#`) and single-level (`+`) patterns.

pub mod engine;
pub mod matcher;
pub mod message;
pub mod topic;

pub use engine::{Broker, DEFAULT_TOPICS, SharedBroker};
pub use matcher::TopicFilter;
pub use topic::{Topic, TopicRegistry};
