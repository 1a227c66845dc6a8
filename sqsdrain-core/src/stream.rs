//! Hour-bucketed log stream names

use chrono::{DateTime, Utc};
use std::fmt;

const SECONDS_PER_HOUR: i64 = 3600;

/// Name of the log stream that collects one hour of activity
///
/// The name is the Unix timestamp, in seconds, of the start of the hour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamName(String);

impl StreamName {
    /// Stream for the hour containing `at`
    pub fn for_time(at: DateTime<Utc>) -> Self {
        let secs = at.timestamp();
        let bucket = secs - secs.rem_euclid(SECONDS_PER_HOUR);
        Self(bucket.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
