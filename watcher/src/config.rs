//! Configuration for a single watched server

use crate::detector::NotifyFlags;
use shared::{
    DEFAULT_ABSENT_CYCLE_LIMIT, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_RETENTION_SECS, DEFAULT_RETRY_BACKOFF_MS,
};
use std::time::Duration;

/// Everything the watcher needs to know about one target server.
///
/// One config describes one target; watching several servers means running
/// several independent watchers.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Display label used in notifications and the time series.
    pub label: String,
    pub host: String,
    pub port: u16,
    /// Notify when the server goes up or down.
    pub notify_server: bool,
    /// Notify when the online player count changes.
    pub notify_count: bool,
    /// Notify when a tracked player joins or leaves.
    pub notify_presence: bool,
    /// Fixed delay between poll cycles.
    pub poll_interval: Duration,
    /// Maximum age of snapshots kept in the history.
    pub retention: Duration,
    /// Hard bound on a single probe attempt.
    pub probe_timeout: Duration,
    /// Delay between retries of a failed probe attempt.
    pub retry_backoff: Duration,
    /// Presence entries offline for this many roster-bearing cycles are purged.
    pub absent_cycle_limit: u32,
}

impl WatchConfig {
    pub fn new(label: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            label: label.into(),
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn notify_flags(&self) -> NotifyFlags {
        NotifyFlags {
            server: self.notify_server,
            count: self.notify_count,
            presence: self.notify_presence,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            host: "127.0.0.1".to_string(),
            port: 25565,
            notify_server: true,
            notify_count: true,
            notify_presence: true,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            retention: Duration::from_secs(DEFAULT_RETENTION_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            absent_cycle_limit: DEFAULT_ABSENT_CYCLE_LIMIT,
        }
    }
}
