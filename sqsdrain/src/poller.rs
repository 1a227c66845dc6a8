//! Queue poll loop

use sqsdrain_core::{LogBackend, QueueBackend};
use sqsdrain_logs::LogStreamWriter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PollerSettings;

/// What one iteration of the loop did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub received: usize,
    pub deleted: usize,
    pub delete_failed: usize,
    /// Delivered without a receipt handle, so they could not be deleted
    pub skipped: usize,
    /// Events appended to the log stream
    pub logged: usize,
    pub receive_failed: bool,
}

/// Long-polls one queue, deletes what arrives and mirrors it to the log sink
pub struct Poller<Q, L> {
    queue: Q,
    queue_url: String,
    writer: Option<LogStreamWriter<L>>,
    settings: PollerSettings,
}

impl<Q: QueueBackend, L: LogBackend> Poller<Q, L> {
    pub fn new(queue: Q, queue_url: impl Into<String>, settings: PollerSettings) -> Self {
        Self {
            queue,
            queue_url: queue_url.into(),
            writer: None,
            settings,
        }
    }

    pub fn with_writer(mut self, writer: LogStreamWriter<L>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Poll until `shutdown` fires
    ///
    /// Errors never end the loop. The long poll and the delay between
    /// iterations both return as soon as `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            queue = %self.queue_url,
            logging = self.writer.is_some(),
            "Starting poller"
        );

        while !shutdown.is_cancelled() {
            let Some(outcome) = self.poll_once(&shutdown).await else {
                break;
            };
            debug!(
                received = outcome.received,
                deleted = outcome.deleted,
                delete_failed = outcome.delete_failed,
                skipped = outcome.skipped,
                logged = outcome.logged,
                receive_failed = outcome.receive_failed,
                "Poll iteration finished"
            );

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.settings.poll_delay()) => {}
            }
        }

        info!(queue = %self.queue_url, "Poller stopped");
    }

    /// One receive/delete/log pass; `None` if cancelled during the receive
    pub async fn poll_once(&self, shutdown: &CancellationToken) -> Option<PollOutcome> {
        let received = tokio::select! {
            () = shutdown.cancelled() => return None,
            result = self.queue.receive(
                &self.queue_url,
                self.settings.max_messages,
                self.settings.wait_time_seconds,
            ) => result,
        };

        let mut outcome = PollOutcome::default();
        let messages = match received {
            Ok(messages) => messages,
            Err(e) => {
                error!(
                    queue = %self.queue_url,
                    operation = e.operation(),
                    "Error receiving messages: {}",
                    e
                );
                outcome.receive_failed = true;
                return Some(outcome);
            }
        };
        outcome.received = messages.len();

        for message in &messages {
            info!(message_id = %message.message_id, "Received message: {}", message.body);

            let Some(receipt_handle) = message.receipt_handle.as_deref() else {
                warn!(
                    message_id = %message.message_id,
                    "Message has no receipt handle, not deleting"
                );
                outcome.skipped += 1;
                continue;
            };

            match self.queue.delete(&self.queue_url, receipt_handle).await {
                Ok(()) => {
                    info!(message_id = %message.message_id, "Deleted message");
                    outcome.deleted += 1;
                }
                Err(e) => {
                    warn!(message_id = %message.message_id, "Error deleting message: {}", e);
                    outcome.delete_failed += 1;
                }
            }
        }

        if let Some(writer) = &self.writer {
            match writer.write_batch(&messages).await {
                Ok(count) => outcome.logged = count,
                Err(e) => error!(
                    group = %writer.group(),
                    operation = e.operation(),
                    "Error logging to CloudWatch: {}",
                    e
                ),
            }
        }

        Some(outcome)
    }
}
