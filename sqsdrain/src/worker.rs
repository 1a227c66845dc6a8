//! Background poll task with a shutdown handle

use sqsdrain_core::{LogBackend, QueueBackend};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::poller::Poller;

/// A poller running on its own task
pub struct Worker {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn<Q, L>(poller: Poller<Q, L>) -> Self
    where
        Q: QueueBackend + 'static,
        L: LogBackend + 'static,
    {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { poller.run(token).await });

        Self { shutdown, handle }
    }

    /// Cancel the poller and wait for its task to finish
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Stopping poll worker");
        self.shutdown.cancel();
        self.handle.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollerSettings;
    use sqsdrain_logs::LogStreamWriter;
    use sqsdrain_test::{MemoryLogs, MemoryQueue};
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> PollerSettings {
        PollerSettings {
            max_messages: 10,
            wait_time_seconds: 1,
            poll_delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_drains_queue_then_shuts_down() {
        let queue = Arc::new(MemoryQueue::new());
        let url = queue.create_queue("orders");
        for i in 0..25 {
            queue.send_message(&url, format!("m{i}"));
        }
        let logs = Arc::new(MemoryLogs::with_group("app"));
        let poller = Poller::new(queue.clone(), url.clone(), settings())
            .with_writer(LogStreamWriter::new(logs.clone(), "app"));

        let worker = Worker::spawn(poller);
        for _ in 0..100 {
            if queue.visible_count(&url) == 0 && queue.in_flight_count(&url) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::timeout(Duration::from_secs(2), worker.shutdown())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.delete_calls().len(), 25);
        let total: usize = logs
            .streams("app")
            .iter()
            .map(|s| logs.events("app", s).len())
            .sum();
        assert_eq!(total, 25);
    }

    #[tokio::test]
    async fn test_idle_worker_stops_promptly() {
        let queue = Arc::new(MemoryQueue::new());
        let url = queue.create_queue("orders");
        let settings = PollerSettings {
            max_messages: 10,
            wait_time_seconds: 20,
            poll_delay_secs: 5,
        };
        let poller = Poller::<_, Arc<MemoryLogs>>::new(queue.clone(), url, settings);
        let worker = Worker::spawn(poller);
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), worker.shutdown())
            .await
            .expect("worker did not stop")
            .unwrap();
        assert_eq!(queue.receive_calls(), 1);
    }
}
