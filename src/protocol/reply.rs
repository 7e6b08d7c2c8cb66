//! Rendering of broker outcomes into the text sent back to a client.

use crate::broker::message::{Grant, SubscribeOutcome, UnsubscribeOutcome};

pub const CONN_ACK: &str = "CONN_ACK";
pub const DISC_ACK: &str = "DISC_ACK";
pub const INVALID_COMMAND: &str = "Invalid command";

fn grant_line(grant: &Grant) -> String {
    format!(
        "[{}] {}",
        grant.topic,
        grant.retained.as_deref().unwrap_or_default()
    )
}

pub fn subscribed(outcome: &SubscribeOutcome) -> String {
    match outcome {
        SubscribeOutcome::Subscribed(grant) => format!("Subscribed to {}", grant_line(grant)),
        SubscribeOutcome::Expanded(grants) => {
            let mut text = String::from("Subscribed to: ");
            for grant in grants {
                text.push('\n');
                text.push_str(&grant_line(grant));
            }
            text
        }
        SubscribeOutcome::AlreadySubscribed(_) => {
            "You are already subscribed to this topic!".to_string()
        }
    }
}

pub fn unsubscribed(outcome: &UnsubscribeOutcome) -> String {
    match outcome {
        UnsubscribeOutcome::Unsubscribed(topic) => {
            format!("Successfully unsubscribed from {topic}!")
        }
        UnsubscribeOutcome::Expanded(topics) => {
            format!("Unsubscribed from: {}", topics.join(", "))
        }
    }
}

pub fn listed(topics: &[String]) -> String {
    format!("Subscribed to {} topics. {}", topics.len(), topics.join(", "))
}
