//! Backend error types

use thiserror::Error;

/// Errors raised by a queue backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("error receiving messages: {0}")]
    Receive(String),

    #[error("error deleting message: {0}")]
    Delete(String),
}

impl QueueError {
    /// Name of the queue operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Receive(_) => "ReceiveMessage",
            Self::Delete(_) => "DeleteMessage",
        }
    }
}

/// Errors raised while mirroring a batch to the log sink
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("failed to check if log stream exists: {0}")]
    Describe(String),

    #[error("failed to create log stream {stream}: {reason}")]
    Create { stream: String, reason: String },

    #[error("failed to write log events to {stream}: {reason}")]
    Put { stream: String, reason: String },
}

impl LogError {
    /// Name of the log operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Describe(_) => "DescribeLogStreams",
            Self::Create { .. } => "CreateLogStream",
            Self::Put { .. } => "PutLogEvents",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_display() {
        let error = QueueError::Delete("ReceiptHandleIsInvalid".to_string());

        assert_eq!(
            error.to_string(),
            "error deleting message: ReceiptHandleIsInvalid"
        );
        assert_eq!(error.operation(), "DeleteMessage");
    }

    #[test]
    fn test_log_error_operation() {
        let error = LogError::Create {
            stream: "1699999200".to_string(),
            reason: "AccessDenied".to_string(),
        };

        assert!(error.to_string().contains("1699999200"));
        assert_eq!(error.operation(), "CreateLogStream");
        assert_eq!(
            LogError::Describe("boom".to_string()).operation(),
            "DescribeLogStreams"
        );
    }
}
