//! In-memory CloudWatch Logs stand-in

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sqsdrain_core::{LogBackend, LogError, LogEvent};
use std::collections::HashSet;
use tracing::debug;

/// Log operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOp {
    Describe,
    Create,
    Put,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCall {
    Describe { group: String, prefix: String },
    Create { group: String, stream: String },
    Put { group: String, stream: String, count: usize },
}

impl LogCall {
    pub fn op(&self) -> LogOp {
        match self {
            Self::Describe { .. } => LogOp::Describe,
            Self::Create { .. } => LogOp::Create,
            Self::Put { .. } => LogOp::Put,
        }
    }
}

/// A log group containing multiple streams
#[derive(Debug, Default)]
struct LogGroup {
    streams: DashMap<String, Vec<LogEvent>>,
}

/// CloudWatch Logs held in memory
///
/// Groups must exist before use, mirroring the real service: describing or
/// writing into a missing group fails with `ResourceNotFoundException`.
#[derive(Debug, Default)]
pub struct MemoryLogs {
    log_groups: DashMap<String, LogGroup>,
    calls: Mutex<Vec<LogCall>>,
    failing: Mutex<HashSet<LogOp>>,
}

impl MemoryLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs with one empty group already created
    pub fn with_group(group: &str) -> Self {
        let logs = Self::new();
        logs.create_group(group);
        logs
    }

    pub fn create_group(&self, group: &str) {
        self.log_groups.entry(group.to_string()).or_default();
    }

    /// Seed a stream without recording a call
    pub fn add_stream(&self, group: &str, stream: &str) {
        self.log_groups
            .entry(group.to_string())
            .or_default()
            .streams
            .entry(stream.to_string())
            .or_default();
    }

    pub fn fail_on(&self, op: LogOp) {
        self.failing.lock().insert(op);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<LogCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: LogOp) -> usize {
        self.calls.lock().iter().filter(|c| c.op() == op).count()
    }

    /// Names of the streams in `group`, sorted
    pub fn streams(&self, group: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .log_groups
            .get(group)
            .map(|g| g.streams.iter().map(|s| s.key().clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Events stored in `stream`, oldest first
    pub fn events(&self, group: &str, stream: &str) -> Vec<LogEvent> {
        self.log_groups
            .get(group)
            .and_then(|g| g.streams.get(stream).map(|s| s.value().clone()))
            .unwrap_or_default()
    }

    fn record(&self, call: LogCall) -> bool {
        let op = call.op();
        self.calls.lock().push(call);
        self.failing.lock().contains(&op)
    }
}

fn group_not_found(group: &str) -> String {
    format!(
        "ResourceNotFoundException: The specified log group does not exist: {}",
        group
    )
}

#[async_trait]
impl LogBackend for MemoryLogs {
    async fn describe_streams(&self, group: &str, prefix: &str) -> Result<Vec<String>, LogError> {
        let fail = self.record(LogCall::Describe {
            group: group.to_string(),
            prefix: prefix.to_string(),
        });
        if fail {
            return Err(LogError::Describe("ServiceUnavailableException".to_string()));
        }

        let log_group = self
            .log_groups
            .get(group)
            .ok_or_else(|| LogError::Describe(group_not_found(group)))?;

        let mut names: Vec<String> = log_group
            .streams
            .iter()
            .filter(|s| s.key().starts_with(prefix))
            .map(|s| s.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_stream(&self, group: &str, stream: &str) -> Result<(), LogError> {
        let create_error = |reason: String| LogError::Create {
            stream: stream.to_string(),
            reason,
        };

        let fail = self.record(LogCall::Create {
            group: group.to_string(),
            stream: stream.to_string(),
        });
        if fail {
            return Err(create_error("ServiceUnavailableException".to_string()));
        }

        let log_group = self
            .log_groups
            .get(group)
            .ok_or_else(|| create_error(group_not_found(group)))?;

        if log_group.streams.contains_key(stream) {
            return Err(create_error(format!(
                "ResourceAlreadyExistsException: The specified log stream already exists: {}",
                stream
            )));
        }

        log_group.streams.insert(stream.to_string(), Vec::new());
        debug!(group = %group, stream = %stream, "Created log stream");
        Ok(())
    }

    async fn put_events(
        &self,
        group: &str,
        stream: &str,
        events: Vec<LogEvent>,
    ) -> Result<(), LogError> {
        let put_error = |reason: String| LogError::Put {
            stream: stream.to_string(),
            reason,
        };

        let fail = self.record(LogCall::Put {
            group: group.to_string(),
            stream: stream.to_string(),
            count: events.len(),
        });
        if fail {
            return Err(put_error("ServiceUnavailableException".to_string()));
        }

        let log_group = self
            .log_groups
            .get(group)
            .ok_or_else(|| put_error(group_not_found(group)))?;

        let mut stored = log_group.streams.get_mut(stream).ok_or_else(|| {
            put_error(format!(
                "ResourceNotFoundException: The specified log stream does not exist: {}",
                stream
            ))
        })?;

        stored.extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_describe_filters_by_prefix() {
        let logs = MemoryLogs::with_group("app");
        logs.add_stream("app", "1699999200");
        logs.add_stream("app", "1700002800");

        let names = logs.describe_streams("app", "16999").await.unwrap();
        assert_eq!(names, vec!["1699999200".to_string()]);
    }

    #[tokio::test]
    async fn test_create_existing_stream_fails() {
        let logs = MemoryLogs::with_group("app");
        logs.create_stream("app", "s").await.unwrap();

        let result = logs.create_stream("app", "s").await;
        assert!(matches!(result, Err(LogError::Create { .. })));
    }

    #[tokio::test]
    async fn test_put_requires_stream() {
        let logs = MemoryLogs::with_group("app");
        let event = LogEvent {
            message: "m".to_string(),
            timestamp: 1,
        };

        let result = logs.put_events("app", "missing", vec![event]).await;
        assert!(matches!(result, Err(LogError::Put { .. })));
    }

    #[tokio::test]
    async fn test_calls_are_journaled_even_when_failing() {
        let logs = MemoryLogs::with_group("app");
        logs.fail_on(LogOp::Create);

        assert!(logs.create_stream("app", "s").await.is_err());
        assert_eq!(logs.count(LogOp::Create), 1);
        assert!(logs.streams("app").is_empty());
    }
}
