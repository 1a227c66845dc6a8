//! CloudWatch Logs mirroring for sqsdrain
//!
//! - [`CloudWatchLogs`]: [`LogBackend`] over `aws_sdk_cloudwatchlogs`
//! - [`LogStreamWriter`]: appends one event per received message to the
//!   stream for the current hour, creating that stream on first use
//!
//! [`LogBackend`]: sqsdrain_core::LogBackend

mod cloudwatch;
mod writer;

pub use cloudwatch::CloudWatchLogs;
pub use writer::LogStreamWriter;
