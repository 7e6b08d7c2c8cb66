//! Inbound command parsing
//!
//! Every inbound text message is classified once into a [`Command`]. Prefixes
//! are checked most-specific first: `/PUBR` before `/PUB`, and `/DISC`
//! anywhere in the text wins over everything else.

use crate::utils::BrokerError;

pub const SUBSCRIBE_USAGE: &str = "/SUB <TOPIC>";
pub const UNSUBSCRIBE_USAGE: &str = "/UNSUB <TOPIC>";
pub const PUBLISH_USAGE: &str = "/PUB <TOPIC> <MESSAGE>";
pub const PUBLISH_RETAIN_USAGE: &str = "/PUBR <TOPIC> <MESSAGE>";
pub const LIST_USAGE: &str = "/LIST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Disconnect,
    Subscribe { pattern: String },
    Unsubscribe { pattern: String },
    Publish { pattern: String, body: String },
    PublishRetain { pattern: String, body: String },
    List,
    Unknown,
}

impl Command {
    /// Classify `text`. Malformed arguments for a recognised command yield `InvalidSyntax`.
    pub fn parse(text: &str) -> Result<Self, BrokerError> {
        if text.contains("/DISC") {
            Ok(Command::Disconnect)
        } else if text.starts_with("/SUB") {
            single_argument(text, SUBSCRIBE_USAGE).map(|pattern| Command::Subscribe { pattern })
        } else if text.starts_with("/UNSUB") {
            single_argument(text, UNSUBSCRIBE_USAGE)
                .map(|pattern| Command::Unsubscribe { pattern })
        } else if text.starts_with("/PUBR") {
            topic_and_body(text, PUBLISH_RETAIN_USAGE)
                .map(|(pattern, body)| Command::PublishRetain { pattern, body })
        } else if text.starts_with("/PUB") {
            topic_and_body(text, PUBLISH_USAGE)
                .map(|(pattern, body)| Command::Publish { pattern, body })
        } else if text.starts_with("/LIST") {
            if text.split_whitespace().count() == 1 {
                Ok(Command::List)
            } else {
                Err(BrokerError::InvalidSyntax(LIST_USAGE))
            }
        } else {
            Ok(Command::Unknown)
        }
    }
}

fn single_argument(text: &str, usage: &'static str) -> Result<String, BrokerError> {
    let mut tokens = text.split_whitespace().skip(1);
    match (tokens.next(), tokens.next()) {
        (Some(argument), None) => Ok(argument.to_string()),
        _ => Err(BrokerError::InvalidSyntax(usage)),
    }
}

/// Split `<cmd> <topic> <body...>`. The body is everything after the
/// whitespace run that follows the topic, kept verbatim.
fn topic_and_body(text: &str, usage: &'static str) -> Result<(String, String), BrokerError> {
    let invalid = || BrokerError::InvalidSyntax(usage);
    let (_, rest) = next_token(text).ok_or_else(invalid)?;
    let (topic, body) = next_token(rest).ok_or_else(invalid)?;
    Ok((topic.to_string(), body.to_string()))
}

/// Split off the leading token. `None` unless whitespace follows it.
fn next_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace)?;
    let (token, rest) = text.split_at(end);
    Some((token, rest.trim_start()))
}
