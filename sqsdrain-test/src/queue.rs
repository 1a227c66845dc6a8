//! In-memory SQS stand-in

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sqsdrain_core::{Message, QueueBackend, QueueError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;
use uuid::Uuid;

/// Queue operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueOp {
    Receive,
    Delete,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
    /// Delivered without a receipt handle, as a malformed response would be
    withhold_receipt: bool,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    /// receipt handle -> delivered message awaiting delete
    in_flight: HashMap<String, StoredMessage>,
}

/// SQS queues held in memory
///
/// Received messages move to an in-flight set keyed by a fresh receipt
/// handle and stay there until deleted or until [`requeue_in_flight`] makes
/// them visible again.
///
/// [`requeue_in_flight`]: MemoryQueue::requeue_in_flight
#[derive(Debug, Default)]
pub struct MemoryQueue {
    queues: DashMap<String, QueueState>,
    arrived: Notify,
    receive_calls: AtomicUsize,
    delete_calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<QueueOp>>,
    failing_ids: Mutex<HashSet<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue and return its URL
    pub fn create_queue(&self, name: &str) -> String {
        let url = format!("http://localhost:4566/000000000000/{}", name);
        info!(name = %name, url = %url, "Creating queue");
        self.queues.entry(url.clone()).or_default();
        url
    }

    /// Enqueue `body` and return the new message id
    ///
    /// # Panics
    ///
    /// Panics if the queue does not exist.
    pub fn send_message(&self, queue_url: &str, body: impl Into<String>) -> String {
        self.enqueue(queue_url, body.into(), false)
    }

    /// Enqueue a message that will be delivered without a receipt handle
    pub fn send_without_receipt(&self, queue_url: &str, body: impl Into<String>) -> String {
        self.enqueue(queue_url, body.into(), true)
    }

    fn enqueue(&self, queue_url: &str, body: String, withhold_receipt: bool) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.queues
            .get_mut(queue_url)
            .unwrap_or_else(|| panic!("queue does not exist: {}", queue_url))
            .visible
            .push_back(StoredMessage {
                message_id: message_id.clone(),
                body,
                receive_count: 0,
                withhold_receipt,
            });

        info!(queue = %queue_url, message_id = %message_id, "Sent message");
        self.arrived.notify_one();
        message_id
    }

    /// Make every subsequent call of `op` fail
    pub fn fail_on(&self, op: QueueOp) {
        self.failing.lock().insert(op);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
        self.failing_ids.lock().clear();
    }

    /// Make deletes of one particular message fail
    pub fn fail_delete_of(&self, message_id: impl Into<String>) {
        self.failing_ids.lock().insert(message_id.into());
    }

    /// Number of receive calls made so far, including failed ones
    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Receipt handles passed to delete, in call order, including failed ones
    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().clone()
    }

    pub fn visible_count(&self, queue_url: &str) -> usize {
        self.queues.get(queue_url).map_or(0, |q| q.visible.len())
    }

    pub fn in_flight_count(&self, queue_url: &str) -> usize {
        self.queues.get(queue_url).map_or(0, |q| q.in_flight.len())
    }

    /// Times `message_id` has been delivered, if it is still in the queue
    pub fn receive_count(&self, queue_url: &str, message_id: &str) -> Option<u32> {
        let queue = self.queues.get(queue_url)?;
        queue
            .visible
            .iter()
            .chain(queue.in_flight.values())
            .find(|m| m.message_id == message_id)
            .map(|m| m.receive_count)
    }

    /// Expire every visibility timeout, making undeleted messages receivable
    pub fn requeue_in_flight(&self, queue_url: &str) {
        if let Some(mut queue) = self.queues.get_mut(queue_url) {
            let expired: Vec<StoredMessage> =
                queue.in_flight.drain().map(|(_, m)| m).collect();
            queue.visible.extend(expired);
        }
        self.arrived.notify_one();
    }

    fn take_visible(&self, queue_url: &str, max: usize) -> Result<Vec<Message>, QueueError> {
        let mut queue = self.queues.get_mut(queue_url).ok_or_else(|| {
            QueueError::Receive(format!("QueueDoesNotExist: {}", queue_url))
        })?;

        let mut result = Vec::new();
        for _ in 0..max {
            let Some(mut msg) = queue.visible.pop_front() else {
                break;
            };
            msg.receive_count += 1;

            // Every delivery gets a fresh receipt handle
            let receipt_handle = Uuid::new_v4().to_string();
            result.push(Message {
                message_id: msg.message_id.clone(),
                receipt_handle: (!msg.withhold_receipt).then(|| receipt_handle.clone()),
                body: msg.body.clone(),
            });
            queue.in_flight.insert(receipt_handle, msg);
        }

        Ok(result)
    }
}

#[async_trait]
impl QueueBackend for MemoryQueue {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().contains(&QueueOp::Receive) {
            return Err(QueueError::Receive("ServiceUnavailable".to_string()));
        }

        let max = usize::try_from(max_messages.clamp(1, 10)).unwrap_or(1);
        let mut result = self.take_visible(queue_url, max)?;

        // Long poll: hold the call open until something arrives or the wait runs out
        if result.is_empty() && wait_time_seconds > 0 {
            let wait = Duration::from_secs(u64::try_from(wait_time_seconds).unwrap_or(0));
            let _ = tokio::time::timeout(wait, self.arrived.notified()).await;
            result = self.take_visible(queue_url, max)?;
        }

        info!(queue = %queue_url, count = result.len(), "Received messages");
        Ok(result)
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        self.delete_calls.lock().push(receipt_handle.to_string());

        if self.failing.lock().contains(&QueueOp::Delete) {
            return Err(QueueError::Delete("ServiceUnavailable".to_string()));
        }

        let mut queue = self
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| QueueError::Delete(format!("QueueDoesNotExist: {}", queue_url)))?;

        let message_id = match queue.in_flight.get(receipt_handle) {
            Some(msg) => msg.message_id.clone(),
            None => {
                return Err(QueueError::Delete(format!(
                    "ReceiptHandleIsInvalid: {}",
                    receipt_handle
                )))
            }
        };

        if self.failing_ids.lock().contains(&message_id) {
            return Err(QueueError::Delete("InternalError".to_string()));
        }

        queue.in_flight.remove(receipt_handle);
        info!(queue = %queue_url, receipt = %receipt_handle, "Deleted message");
        Ok(())
    }
}
