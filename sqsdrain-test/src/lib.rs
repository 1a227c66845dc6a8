//! Test utilities for sqsdrain
//!
//! In-memory stand-ins for SQS and CloudWatch Logs that record every call:
//! - [`MemoryQueue`]: long-poll receive, delete by receipt handle,
//!   visibility-timeout redelivery, failure injection
//! - [`MemoryLogs`]: log groups of append-only streams with an ordered call
//!   journal and failure injection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqsdrain_core::QueueBackend;
//! use sqsdrain_test::MemoryQueue;
//!
//! #[tokio::test]
//! async fn test_receive() {
//!     let queue = MemoryQueue::new();
//!     let url = queue.create_queue("orders");
//!     queue.send_message(&url, "hello");
//!
//!     let batch = queue.receive(&url, 10, 0).await.unwrap();
//!     assert_eq!(batch.len(), 1);
//! }
//! ```

pub mod logs;
pub mod queue;

pub use logs::{LogCall, LogOp, MemoryLogs};
pub use queue::{MemoryQueue, QueueOp};
