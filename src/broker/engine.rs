//! Broker engine
//!
//! This module contains the in-memory broker implementation responsible for:
//! - owning the topic registry and the live session registry
//! - resolving exact and wildcard topic patterns
//! - subscribe / unsubscribe / publish / publish-and-retain / list
//! - broadcasting published bodies to every subscribed session
//!
//! Concurrency and usage notes:
//! - The public API is synchronous and designed to be held behind a lock
//!   (`SharedBroker`) by the protocol layer. Every operation, including a
//!   whole broadcast, runs under that one lock, so topic creation is atomic
//!   and a broadcast never observes a half-applied subscription change.
//! - Delivery is a non-blocking channel send. Never hold the lock across an
//!   `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::broker::matcher::TopicFilter;
use crate::broker::message::{Grant, Message, PublishReport, SubscribeOutcome, UnsubscribeOutcome};
use crate::broker::topic::TopicRegistry;
use crate::session::{Session, SessionId, SessionRegistry};
use crate::utils::BrokerError;

/// Topics available before any client connects.
pub const DEFAULT_TOPICS: &[&str] = &[
    "WEATHER",
    "NEWS",
    "HEALTH",
    "SECURITY",
    "WEATHER/MINNESOTA",
    "WEATHER/WISCONSIN/NINE",
    "WEATHER/MINNESOTA/NINE",
];

pub type SharedBroker = Arc<Mutex<Broker>>;

/// Lock the broker, recovering from a poisoned lock.
///
/// Every operation leaves the state consistent before it can panic, so the
/// data behind a poisoned lock is still usable.
pub fn lock(broker: &SharedBroker) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Broker {
    topics: TopicRegistry,
    sessions: SessionRegistry,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// A broker seeded with [`DEFAULT_TOPICS`].
    pub fn new() -> Self {
        match Self::with_topics(DEFAULT_TOPICS) {
            Ok(broker) => broker,
            Err(e) => {
                error!("default topics rejected, starting without topics: {e}");
                Self {
                    topics: TopicRegistry::new(),
                    sessions: SessionRegistry::new(),
                }
            }
        }
    }

    /// A broker seeded with `names`. Fails on the first invalid name.
    pub fn with_topics<I, S>(names: I) -> Result<Self, BrokerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            topics: TopicRegistry::with_topics(names)?,
            sessions: SessionRegistry::new(),
        })
    }

    pub fn into_shared(self) -> SharedBroker {
        Arc::new(Mutex::new(self))
    }

    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn register_session(&mut self, session: Session) {
        info!(session = %session.id, "session registered");
        self.sessions.add(session);
    }

    /// Remove a session together with all of its subscriptions.
    pub fn remove_session(&mut self, id: &str) -> Option<Session> {
        let removed = self.sessions.remove(id);
        if let Some(session) = &removed {
            info!(
                session = %session.id,
                subscriptions = session.subscription_count(),
                "session removed"
            );
        }
        removed
    }

    /// Flag a session so broadcasts skip it while its disconnect completes.
    pub fn begin_disconnect(&mut self, id: &str) -> Result<(), BrokerError> {
        self.session_mut(id)?.mark_disconnecting();
        Ok(())
    }

    pub fn subscribe(&mut self, id: &str, pattern: &str) -> Result<SubscribeOutcome, BrokerError> {
        if !self.sessions.contains(id) {
            return Err(unknown_session(id));
        }

        match TopicFilter::parse(pattern) {
            TopicFilter::Exact(name) => {
                if !self.topics.exists(name) {
                    self.topics.create_if_absent(name)?;
                    info!(topic = name, "topic created");
                }
                let session = self.session_mut(id)?;
                if !session.subscribe(name) {
                    return Ok(SubscribeOutcome::AlreadySubscribed(name.to_string()));
                }
                debug!(session = id, topic = name, "subscribed");
                Ok(SubscribeOutcome::Subscribed(Grant {
                    topic: name.to_string(),
                    retained: self.topics.retained(name).map(str::to_string),
                }))
            }
            filter => {
                let matched = filter.expand(self.topics.names());
                if matched.is_empty() {
                    return Err(BrokerError::NoWildcardMatch(pattern.to_string()));
                }
                let session = self
                    .sessions
                    .get_mut(id)
                    .ok_or_else(|| unknown_session(id))?;
                let topics = &self.topics;
                let grants: Vec<Grant> = matched
                    .into_iter()
                    .filter(|topic| session.subscribe(topic))
                    .map(|topic| Grant {
                        retained: topics.retained(&topic).map(str::to_string),
                        topic,
                    })
                    .collect();
                debug!(session = id, pattern, added = grants.len(), "subscribed to wildcard");
                Ok(SubscribeOutcome::Expanded(grants))
            }
        }
    }

    pub fn unsubscribe(
        &mut self,
        id: &str,
        pattern: &str,
    ) -> Result<UnsubscribeOutcome, BrokerError> {
        let filter = TopicFilter::parse(pattern);
        let matched = match filter {
            TopicFilter::Exact(_) => Vec::new(),
            _ => filter.expand(self.topics.names()),
        };

        let session = self.session_mut(id)?;
        match filter {
            TopicFilter::Exact(name) => {
                if session.unsubscribe(name) {
                    debug!(session = id, topic = name, "unsubscribed");
                    Ok(UnsubscribeOutcome::Unsubscribed(name.to_string()))
                } else {
                    Err(BrokerError::NotSubscribed(name.to_string()))
                }
            }
            _ => {
                if matched.is_empty() {
                    return Err(BrokerError::NoWildcardMatch(pattern.to_string()));
                }
                let removed: Vec<String> = matched
                    .into_iter()
                    .filter(|topic| session.unsubscribe(topic))
                    .collect();
                if removed.is_empty() {
                    return Err(BrokerError::NotSubscribed(pattern.to_string()));
                }
                debug!(session = id, pattern, removed = removed.len(), "unsubscribed from wildcard");
                Ok(UnsubscribeOutcome::Expanded(removed))
            }
        }
    }

    pub fn publish(
        &mut self,
        id: &str,
        pattern: &str,
        body: &str,
    ) -> Result<PublishReport, BrokerError> {
        self.route(id, pattern, body, false)
    }

    /// Publish and overwrite the retained message of every resolved topic.
    pub fn publish_retain(
        &mut self,
        id: &str,
        pattern: &str,
        body: &str,
    ) -> Result<PublishReport, BrokerError> {
        self.route(id, pattern, body, true)
    }

    /// Sorted names of the topics a session holds.
    pub fn list(&self, id: &str) -> Result<Vec<String>, BrokerError> {
        let session = self.sessions.get(id).ok_or_else(|| unknown_session(id))?;
        Ok(session.subscriptions().map(str::to_string).collect())
    }

    /// Send `message` to every session holding its topic. Returns the number of copies sent.
    pub fn broadcast(&self, message: &Message) -> usize {
        let text = message.to_string();
        let mut delivered = 0;
        self.sessions.for_each(|session| {
            if session.is_disconnecting() || !session.is_subscribed(&message.topic) {
                return;
            }
            match session.send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(session = %session.id, topic = %message.topic, "delivery skipped: {e}"),
            }
        });
        delivered
    }

    fn route(
        &mut self,
        id: &str,
        pattern: &str,
        body: &str,
        retain: bool,
    ) -> Result<PublishReport, BrokerError> {
        let topics = self.resolve_publish_targets(id, pattern)?;

        let mut report = PublishReport::default();
        for topic in topics {
            if retain {
                self.topics.retain(&topic, body)?;
                info!(topic = %topic, "retained message updated");
            }
            report.deliveries += self.broadcast(&Message::new(topic.as_str(), body));
            report.topics.push(topic);
        }
        debug!(
            session = id,
            pattern,
            topics = report.topics.len(),
            deliveries = report.deliveries,
            retain,
            "published"
        );
        Ok(report)
    }

    /// A session may only publish into topics it holds itself.
    fn resolve_publish_targets(&self, id: &str, pattern: &str) -> Result<Vec<String>, BrokerError> {
        let session = self.sessions.get(id).ok_or_else(|| unknown_session(id))?;

        match TopicFilter::parse(pattern) {
            TopicFilter::Exact(name) => {
                if !self.topics.exists(name) {
                    Err(BrokerError::UnknownTopic(name.to_string()))
                } else if !session.is_subscribed(name) {
                    Err(BrokerError::NotSubscribed(name.to_string()))
                } else {
                    Ok(vec![name.to_string()])
                }
            }
            filter => {
                let held: Vec<String> = filter
                    .expand(self.topics.names())
                    .into_iter()
                    .filter(|topic| session.is_subscribed(topic))
                    .collect();
                if held.is_empty() {
                    Err(BrokerError::NoWildcardMatch(pattern.to_string()))
                } else {
                    Ok(held)
                }
            }
        }
    }

    fn session_mut(&mut self, id: &str) -> Result<&mut Session, BrokerError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| unknown_session(id))
    }
}

fn unknown_session(id: &str) -> BrokerError {
    BrokerError::UnknownSession(SessionId::from(id))
}
