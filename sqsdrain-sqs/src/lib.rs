//! AWS SQS backend for sqsdrain
//!
//! Wraps an `aws_sdk_sqs::Client` behind the [`QueueBackend`] trait:
//! - ReceiveMessage (long poll)
//! - DeleteMessage
//!
//! [`QueueBackend`]: sqsdrain_core::QueueBackend

mod queue;

pub use queue::SqsQueue;
