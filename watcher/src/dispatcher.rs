//! Multi-strategy probe dispatch with bounded retries and per-attempt timeouts
//!
//! Incompatible server generations answer different status protocols, so the
//! dispatcher walks an ordered list of probe strategies and returns the first
//! successful snapshot. Earlier (higher priority) strategies get more tries
//! than later ones, and every attempt runs under a hard timeout so one hanging
//! protocol cannot starve the poll cycle.

use async_trait::async_trait;
use log::{debug, warn};
use shared::{ProbeError, Snapshot, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// A protocol-specific way of querying server status.
///
/// Implementations do the actual wire I/O and either return a successful
/// snapshot or the failure cause. The dispatcher owns timing: attempts are
/// cancelled (the future is dropped) when they exceed the attempt timeout.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    /// Short name used in logs, e.g. "modern", "legacy", "beta".
    fn name(&self) -> &str;

    async fn probe(&self, host: &str, port: u16) -> Result<Snapshot, ProbeError>;
}

/// Tries an ordered set of probe strategies against one target.
pub struct ProbeDispatcher {
    strategies: Vec<Box<dyn ProbeStrategy>>,
    attempt_timeout: Duration,
    retry_backoff: Duration,
}

impl ProbeDispatcher {
    /// Creates a dispatcher over `strategies` in priority order with the
    /// default 5 s attempt timeout and 500 ms retry backoff.
    pub fn new(strategies: Vec<Box<dyn ProbeStrategy>>) -> Self {
        Self {
            strategies,
            attempt_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }

    /// Overrides attempt timeout and retry backoff, mainly so tests and
    /// short poll intervals stay responsive.
    pub fn with_timing(mut self, attempt_timeout: Duration, retry_backoff: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Probes `host:port`, trying strategy `i` up to `len - i` times with a
    /// fixed backoff between tries. Returns the first successful snapshot,
    /// otherwise the last observed failure; `None` only when the dispatcher
    /// has no strategies at all.
    pub async fn dispatch(&self, host: &str, port: u16) -> Option<Snapshot> {
        let total = self.strategies.len();
        let mut last_failure = None;

        for (index, strategy) in self.strategies.iter().enumerate() {
            let tries = total - index;

            for attempt in 1..=tries {
                let result = self.attempt(strategy.as_ref(), host, port).await;

                if result.online {
                    debug!(
                        "{} probe of {}:{} succeeded (attempt {}/{})",
                        strategy.name(),
                        host,
                        port,
                        attempt,
                        tries
                    );
                    return Some(result);
                }

                warn!(
                    "{} probe of {}:{} failed (attempt {}/{}): {}",
                    strategy.name(),
                    host,
                    port,
                    attempt,
                    tries,
                    describe(&result)
                );
                last_failure = Some(result);
                sleep(self.retry_backoff).await;
            }
        }

        last_failure
    }

    /// Runs a single bounded attempt. A timed-out attempt counts as a failed
    /// try; dropping the probe future here cancels the underlying call
    /// instead of leaving it running detached.
    async fn attempt(&self, strategy: &dyn ProbeStrategy, host: &str, port: u16) -> Snapshot {
        match timeout(self.attempt_timeout, strategy.probe(host, port)).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(error)) => Snapshot::failure(error),
            Err(_) => Snapshot::failure(ProbeError::Timeout {
                after_secs: self.attempt_timeout.as_secs(),
            }),
        }
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }
}

fn describe(snapshot: &Snapshot) -> String {
    snapshot
        .error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown failure".to_string())
}
