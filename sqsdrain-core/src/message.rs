//! Queue messages and log events

use chrono::{DateTime, Utc};

/// Prefix written in front of every mirrored message body
pub const EVENT_PREFIX: &str = "Received messages";

/// A message delivered by the queue backend
///
/// The body is opaque; nothing in sqsdrain inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    /// Single-use token for this delivery, required to delete it
    pub receipt_handle: Option<String>,
    pub body: String,
}

impl Message {
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: Some(receipt_handle.into()),
            body: body.into(),
        }
    }
}

/// A single entry appended to a log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl LogEvent {
    /// Build the event mirroring `message`, stamped at `at`
    pub fn for_message(message: &Message, at: DateTime<Utc>) -> Self {
        Self {
            message: format!("{}: {}", EVENT_PREFIX, message.body),
            timestamp: at.timestamp_millis(),
        }
    }
}
