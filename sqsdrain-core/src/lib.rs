//! Core types and traits for sqsdrain
//!
//! This crate provides the data model and backend seams shared by the
//! poller, the log writer and their test doubles.

pub mod backend;
pub mod error;
pub mod message;
pub mod stream;

pub use backend::{LogBackend, QueueBackend};
pub use error::{LogError, QueueError};
pub use message::{LogEvent, Message};
pub use stream::StreamName;

/// Largest batch a single SQS receive may return
pub const MAX_RECEIVE_BATCH: i32 = 10;

/// Longest server-side wait SQS allows for a long poll, in seconds
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;
