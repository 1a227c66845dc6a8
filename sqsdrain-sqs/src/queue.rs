//! SQS client adapter

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message as SqsMessage;
use aws_sdk_sqs::Client;
use sqsdrain_core::{Message, QueueBackend, QueueError};
use tracing::debug;

/// [`QueueBackend`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl QueueBackend for SqsQueue {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        let messages: Vec<Message> = output.messages().iter().map(to_message).collect();
        debug!(queue = %queue_url, count = messages.len(), "ReceiveMessage returned");
        Ok(messages)
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

fn to_message(msg: &SqsMessage) -> Message {
    Message {
        message_id: msg.message_id().unwrap_or_default().to_string(),
        receipt_handle: msg.receipt_handle().map(str::to_string),
        body: msg.body().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_message_copies_fields() {
        let sqs = SqsMessage::builder()
            .message_id("5fea7756-0ea4-451a-a703-a558b933e274")
            .receipt_handle("MbZj6wDWli+JvwwJaBV+3dcjk2YW2vA3+STFFljTM8tJJg6HRG6PYSasuWXPJB+Cw")
            .body("hello")
            .build();

        let message = to_message(&sqs);

        assert_eq!(message.message_id, "5fea7756-0ea4-451a-a703-a558b933e274");
        assert_eq!(
            message.receipt_handle.as_deref(),
            Some("MbZj6wDWli+JvwwJaBV+3dcjk2YW2vA3+STFFljTM8tJJg6HRG6PYSasuWXPJB+Cw")
        );
        assert_eq!(message.body, "hello");
    }

    #[test]
    fn test_to_message_missing_fields() {
        let message = to_message(&SqsMessage::builder().build());

        assert!(message.message_id.is_empty());
        assert!(message.receipt_handle.is_none());
        assert!(message.body.is_empty());
    }
}
