//! Topic management
//!
//! The `TopicRegistry` owns every known topic and its retained message.
//! Topics are created on demand and never removed. Names are unique and never
//! contain the wildcard characters `+` or `#`.
//!
//! Concurrency note: callers must synchronize access to the registry (for
//! example via the broker lock) when creating topics or retaining messages.

use std::collections::{BTreeMap, BTreeSet};

use crate::utils::BrokerError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    retained: Option<String>,
}

impl Topic {
    /// Create a new topic with the given name and no retained message.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            retained: None,
        }
    }

    pub fn retained(&self) -> Option<&str> {
        self.retained.as_deref()
    }

    /// Overwrite the retained message. An empty body clears it.
    pub fn retain(&mut self, body: &str) {
        self.retained = if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        };
    }
}

/// Whether `name` may be used as a concrete topic name.
pub fn is_valid_topic_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['+', '#'])
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: BTreeMap<String, Topic>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            topics: BTreeMap::new(),
        }
    }

    /// Build a registry pre-populated with `names`.
    pub fn with_topics<I, S>(names: I) -> Result<Self, BrokerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.create_if_absent(name.as_ref())?;
        }
        Ok(registry)
    }

    /// Return the topic named `name`, creating it first if needed.
    pub fn create_if_absent(&mut self, name: &str) -> Result<&Topic, BrokerError> {
        if !is_valid_topic_name(name) {
            return Err(BrokerError::InvalidTopicName(name.to_string()));
        }
        Ok(self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    pub fn retained(&self, name: &str) -> Option<&str> {
        self.topics.get(name).and_then(Topic::retained)
    }

    pub fn retain(&mut self, name: &str, body: &str) -> Result<(), BrokerError> {
        let topic = self
            .topics
            .get_mut(name)
            .ok_or_else(|| BrokerError::UnknownTopic(name.to_string()))?;
        topic.retain(body);
        Ok(())
    }

    /// Topic names in sorted order, borrowed from the registry.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Owned snapshot of every topic name.
    pub fn all_names(&self) -> BTreeSet<String> {
        self.topics.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
