//! Backend traits
//!
//! The poller and log writer talk to AWS only through these traits, so the
//! same loop runs against the SDK clients in production and against the
//! in-memory backends in tests.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{LogError, QueueError};
use crate::message::{LogEvent, Message};

/// A message queue that supports long-poll receive and delete
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Long-poll `queue_url` for up to `max_messages`, waiting at most
    /// `wait_time_seconds` server-side for something to arrive
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError>;

    /// Delete the delivery identified by `receipt_handle`
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError>;
}

/// A log sink organised as groups of append-only streams
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// Names of the streams in `group` that start with `prefix`
    async fn describe_streams(&self, group: &str, prefix: &str) -> Result<Vec<String>, LogError>;

    async fn create_stream(&self, group: &str, stream: &str) -> Result<(), LogError>;

    /// Append `events` to `stream`, in order
    async fn put_events(
        &self,
        group: &str,
        stream: &str,
        events: Vec<LogEvent>,
    ) -> Result<(), LogError>;
}

#[async_trait]
impl<T: QueueBackend + ?Sized> QueueBackend for Arc<T> {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        (**self)
            .receive(queue_url, max_messages, wait_time_seconds)
            .await
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        (**self).delete(queue_url, receipt_handle).await
    }
}

#[async_trait]
impl<T: LogBackend + ?Sized> LogBackend for Arc<T> {
    async fn describe_streams(&self, group: &str, prefix: &str) -> Result<Vec<String>, LogError> {
        (**self).describe_streams(group, prefix).await
    }

    async fn create_stream(&self, group: &str, stream: &str) -> Result<(), LogError> {
        (**self).create_stream(group, stream).await
    }

    async fn put_events(
        &self,
        group: &str,
        stream: &str,
        events: Vec<LogEvent>,
    ) -> Result<(), LogError> {
        (**self).put_events(group, stream, events).await
    }
}
