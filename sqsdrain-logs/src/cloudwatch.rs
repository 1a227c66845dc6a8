//! CloudWatch Logs client adapter

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::Client;
use sqsdrain_core::{LogBackend, LogError, LogEvent};
use tracing::debug;

/// [`LogBackend`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl LogBackend for CloudWatchLogs {
    async fn describe_streams(&self, group: &str, prefix: &str) -> Result<Vec<String>, LogError> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(group)
            .log_stream_name_prefix(prefix)
            .send()
            .await
            .map_err(|e| LogError::Describe(DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .log_streams()
            .iter()
            .filter_map(|s| s.log_stream_name().map(str::to_string))
            .collect())
    }

    async fn create_stream(&self, group: &str, stream: &str) -> Result<(), LogError> {
        self.client
            .create_log_stream()
            .log_group_name(group)
            .log_stream_name(stream)
            .send()
            .await
            .map_err(|e| LogError::Create {
                stream: stream.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

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

        let events = events
            .into_iter()
            .map(|e| {
                InputLogEvent::builder()
                    .message(e.message)
                    .timestamp(e.timestamp)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| put_error(e.to_string()))?;

        self.client
            .put_log_events()
            .log_group_name(group)
            .log_stream_name(stream)
            .set_log_events(Some(events))
            .send()
            .await
            .map_err(|e| put_error(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
