//! Hourly log stream writer

use chrono::{DateTime, Utc};
use sqsdrain_core::{LogBackend, LogError, LogEvent, Message, StreamName};
use tracing::{debug, info};

/// Mirrors batches of received messages into a log group
///
/// Every batch lands in the stream named after the current hour. The stream
/// is looked up before each write and created if it is missing.
pub struct LogStreamWriter<L> {
    backend: L,
    group: String,
    clock: fn() -> DateTime<Utc>,
}

impl<L: LogBackend> LogStreamWriter<L> {
    pub fn new(backend: L, group: impl Into<String>) -> Self {
        Self {
            backend,
            group: group.into(),
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for stream names and event timestamps
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn backend(&self) -> &L {
        &self.backend
    }

    /// Append one event per message and return how many were written
    ///
    /// An empty batch makes no backend calls at all.
    pub async fn write_batch(&self, messages: &[Message]) -> Result<usize, LogError> {
        if messages.is_empty() {
            return Ok(0);
        }

        let events: Vec<LogEvent> = messages
            .iter()
            .map(|m| LogEvent::for_message(m, (self.clock)()))
            .collect();

        let stream = StreamName::for_time((self.clock)());
        let created = self.ensure_stream(&stream).await?;

        let count = events.len();
        self.backend
            .put_events(&self.group, stream.as_str(), events)
            .await?;

        debug!(
            group = %self.group,
            stream = %stream,
            count,
            created,
            "Wrote log events"
        );
        Ok(count)
    }

    /// Create `stream` unless it already exists; returns whether it was created
    async fn ensure_stream(&self, stream: &StreamName) -> Result<bool, LogError> {
        if self.stream_exists(stream).await? {
            return Ok(false);
        }

        self.backend
            .create_stream(&self.group, stream.as_str())
            .await?;
        info!(group = %self.group, stream = %stream, "Created log stream");
        Ok(true)
    }

    /// Prefix lookup followed by an exact-name match
    async fn stream_exists(&self, stream: &StreamName) -> Result<bool, LogError> {
        let names = self
            .backend
            .describe_streams(&self.group, stream.as_str())
            .await?;

        Ok(names.iter().any(|name| name == stream.as_str()))
    }
}
