//! Configuration management

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::Args;
use sqsdrain_core::{MAX_RECEIVE_BATCH, MAX_WAIT_TIME_SECONDS};

/// Startup errors; any of these ends the process
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("--{0} must not be empty")]
    Empty(&'static str),

    #[error("--log-group is required when --enable-logging is set")]
    MissingLogGroup,

    #[error("unable to load tuning file: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("unable to load SDK config: no credentials provider configured")]
    NoCredentials,

    #[error("unable to load SDK config: {0}")]
    Credentials(String),
}

/// Everything the daemon needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: String,
    pub queue_url: String,
    pub endpoint_url: Option<String>,
    /// Log group to mirror into; `None` when logging is disabled
    pub log_group: Option<String>,
    pub poller: PollerSettings,
}

/// Poll loop tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,

    #[serde(default = "default_wait_time_seconds")]
    pub wait_time_seconds: i32,

    #[serde(default = "default_poll_delay_secs")]
    pub poll_delay_secs: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            wait_time_seconds: default_wait_time_seconds(),
            poll_delay_secs: default_poll_delay_secs(),
        }
    }
}

impl PollerSettings {
    /// Pull values back into the range SQS accepts
    pub fn clamped(self) -> Self {
        let max_messages = self.max_messages.clamp(1, MAX_RECEIVE_BATCH);
        if max_messages != self.max_messages {
            warn!(
                "max_messages {} out of range, using {}",
                self.max_messages, max_messages
            );
        }

        let wait_time_seconds = self.wait_time_seconds.clamp(0, MAX_WAIT_TIME_SECONDS);
        if wait_time_seconds != self.wait_time_seconds {
            warn!(
                "wait_time_seconds {} out of range, using {}",
                self.wait_time_seconds, wait_time_seconds
            );
        }

        Self {
            max_messages,
            wait_time_seconds,
            poll_delay_secs: self.poll_delay_secs,
        }
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }
}

#[derive(Debug, Deserialize, Default)]
struct TuningFile {
    #[serde(default)]
    poller: PollerSettings,
}

fn default_max_messages() -> i32 {
    10
}

fn default_wait_time_seconds() -> i32 {
    20
}

fn default_poll_delay_secs() -> u64 {
    5
}

impl Settings {
    /// Validate command line arguments and merge in the tuning file
    pub fn resolve(args: Args) -> Result<Self, SettingsError> {
        if args.region.trim().is_empty() {
            return Err(SettingsError::Empty("region"));
        }
        if args.queue_url.trim().is_empty() {
            return Err(SettingsError::Empty("queue-url"));
        }

        let log_group = if args.enable_logging {
            match args.log_group {
                Some(group) if !group.trim().is_empty() => Some(group),
                _ => return Err(SettingsError::MissingLogGroup),
            }
        } else {
            None
        };

        let poller = load_tuning(args.config.as_deref())?.poller.clamped();

        Ok(Self {
            region: args.region,
            queue_url: args.queue_url,
            endpoint_url: args.endpoint_url.filter(|url| !url.trim().is_empty()),
            log_group,
            poller,
        })
    }
}

/// Load tuning from an optional file, overridden by `SQSDRAIN__` variables
fn load_tuning(path: Option<&Path>) -> Result<TuningFile, SettingsError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path).required(true));
    }

    let config = builder
        .add_source(
            ::config::Environment::with_prefix("SQSDRAIN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize::<TuningFile>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use parking_lot::{Mutex, MutexGuard};
    use std::io::Write;

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/orders";

    // The process environment is shared by every test thread
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    /// Hold the environment lock with every `SQSDRAIN` variable removed
    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock();
        for (key, _) in std::env::vars() {
            if key.starts_with("SQSDRAIN") {
                std::env::remove_var(key);
            }
        }
        guard
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "sqsdrain",
            "--region",
            "us-east-1",
            "--queue-url",
            QUEUE_URL,
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let _env = clean_env();
        let settings = Settings::resolve(args(&[])).unwrap();

        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.queue_url, QUEUE_URL);
        assert!(settings.log_group.is_none());
        assert!(settings.endpoint_url.is_none());
        assert_eq!(settings.poller, PollerSettings::default());
        assert_eq!(settings.poller.poll_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_required_flags() {
        let _env = clean_env();
        assert!(Args::try_parse_from(["sqsdrain", "--region", "us-east-1"]).is_err());
        assert!(Args::try_parse_from(["sqsdrain", "--queue-url", QUEUE_URL]).is_err());
    }

    #[test]
    fn test_empty_region_rejected() {
        let _env = clean_env();
        let parsed =
            Args::try_parse_from(["sqsdrain", "--region", "", "--queue-url", QUEUE_URL]).unwrap();

        assert!(matches!(
            Settings::resolve(parsed),
            Err(SettingsError::Empty("region"))
        ));
    }

    #[test]
    fn test_logging_requires_group() {
        let _env = clean_env();
        let result = Settings::resolve(args(&["--enable-logging"]));
        assert!(matches!(result, Err(SettingsError::MissingLogGroup)));
    }

    #[test]
    fn test_logging_with_group() {
        let _env = clean_env();
        let settings =
            Settings::resolve(args(&["--enable-logging", "--log-group", "/sqsdrain/orders"]))
                .unwrap();
        assert_eq!(settings.log_group.as_deref(), Some("/sqsdrain/orders"));
    }

    #[test]
    fn test_enable_cloudwatch_alias() {
        let _env = clean_env();
        let settings =
            Settings::resolve(args(&["--enable-cloudwatch", "--log-group", "app"])).unwrap();
        assert_eq!(settings.log_group.as_deref(), Some("app"));
    }

    #[test]
    fn test_group_ignored_without_logging() {
        let _env = clean_env();
        let settings = Settings::resolve(args(&["--log-group", "app"])).unwrap();
        assert!(settings.log_group.is_none());
    }

    #[test]
    fn test_tuning_file() {
        let _env = clean_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[poller]\nmax_messages = 4\nwait_time_seconds = 5\npoll_delay_secs = 1"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings = Settings::resolve(args(&["--config", path.as_str()])).unwrap();

        assert_eq!(
            settings.poller,
            PollerSettings {
                max_messages: 4,
                wait_time_seconds: 5,
                poll_delay_secs: 1,
            }
        );
    }

    #[test]
    fn test_missing_tuning_file_is_fatal() {
        let _env = clean_env();
        let result = Settings::resolve(args(&["--config", "/nonexistent/sqsdrain.toml"]));
        assert!(matches!(result, Err(SettingsError::Load(_))));
    }

    #[test]
    fn test_environment_overrides_tuning() {
        let _env = clean_env();
        std::env::set_var("SQSDRAIN__POLLER__POLL_DELAY_SECS", "2");
        std::env::set_var("SQSDRAIN__POLLER__MAX_MESSAGES", "3");

        let result = Settings::resolve(args(&[]));
        std::env::remove_var("SQSDRAIN__POLLER__POLL_DELAY_SECS");
        std::env::remove_var("SQSDRAIN__POLLER__MAX_MESSAGES");

        let settings = result.unwrap();
        assert_eq!(settings.poller.poll_delay(), Duration::from_secs(2));
        assert_eq!(settings.poller.max_messages, 3);
        assert_eq!(settings.poller.wait_time_seconds, 20);
    }

    #[test]
    fn test_region_read_from_environment() {
        let _env = clean_env();
        std::env::set_var("SQSDRAIN_REGION", "eu-west-1");

        let parsed = Args::try_parse_from(["sqsdrain", "--queue-url", QUEUE_URL]);
        std::env::remove_var("SQSDRAIN_REGION");

        assert_eq!(Settings::resolve(parsed.unwrap()).unwrap().region, "eu-west-1");
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let settings = PollerSettings {
            max_messages: 50,
            wait_time_seconds: -3,
            poll_delay_secs: 0,
        }
        .clamped();

        assert_eq!(settings.max_messages, 10);
        assert_eq!(settings.wait_time_seconds, 0);
        assert_eq!(settings.poll_delay_secs, 0);
    }
}
