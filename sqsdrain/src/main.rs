//! sqsdrain - SQS queue drain daemon
//!
//! Long-polls an SQS queue, deletes every message it receives and, when
//! enabled, mirrors each batch into an hourly CloudWatch Logs stream.

mod aws;
mod config;
mod poller;
mod worker;

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqsdrain_logs::{CloudWatchLogs, LogStreamWriter};
use sqsdrain_sqs::SqsQueue;

use crate::config::Settings;
use crate::poller::Poller;
use crate::worker::Worker;

#[derive(Parser, Debug)]
#[command(name = "sqsdrain")]
#[command(about = "Drain an SQS queue and mirror its messages to CloudWatch Logs", long_about = None)]
pub struct Args {
    /// AWS region
    #[arg(long, env = "SQSDRAIN_REGION")]
    region: String,

    /// SQS queue URL
    #[arg(long, env = "SQSDRAIN_QUEUE_URL")]
    queue_url: String,

    /// Mirror received messages to CloudWatch Logs
    #[arg(long, alias = "enable-cloudwatch", env = "SQSDRAIN_ENABLE_LOGGING")]
    enable_logging: bool,

    /// CloudWatch log group, required when logging is enabled
    #[arg(long, env = "SQSDRAIN_LOG_GROUP")]
    log_group: Option<String>,

    /// Override the AWS endpoint, e.g. to run against a local emulator
    #[arg(long, env = "SQSDRAIN_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Poller tuning file (toml, yaml or json)
    #[arg(long, env = "SQSDRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SQSDRAIN_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sqsdrain={}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::resolve(args)?;
    let sdk_config = aws::load_sdk_config(&settings).await?;

    info!("Starting sqsdrain...");
    info!("  Queue: {}", settings.queue_url);
    info!("  Region: {}", settings.region);
    info!(
        "  CloudWatch Logs: {}",
        settings.log_group.as_deref().unwrap_or("disabled")
    );

    let mut poller = Poller::new(
        SqsQueue::from_conf(&sdk_config),
        settings.queue_url.clone(),
        settings.poller.clone(),
    );
    if let Some(group) = &settings.log_group {
        poller = poller.with_writer(LogStreamWriter::new(
            CloudWatchLogs::from_conf(&sdk_config),
            group.clone(),
        ));
    }

    let worker = Worker::spawn(poller);

    let signal = shutdown_signal().await?;
    info!("Received signal: {}", signal);
    info!("Shutting down gracefully...");

    worker.shutdown().await?;
    Ok(())
}

/// Wait for SIGINT or SIGTERM and return which one arrived
async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "SIGINT")
    }
}
