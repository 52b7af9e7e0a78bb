//! Bounded, time-ordered snapshot history
//!
//! Keeps every snapshot from the last retention window (default ten minutes)
//! in insertion order. Eviction runs once per poll cycle, before the new
//! snapshot is appended, so the store never holds stale entries for longer
//! than one cycle.

use serde::Serialize;
use shared::Snapshot;
use std::time::{Duration, SystemTime};

/// Plottable online-count history for one watched server.
///
/// `points` holds one `(minutes, count)` pair per retained snapshot in
/// insertion order; `minutes` is relative to the query instant, so past
/// samples are negative.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerCountSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// In-memory snapshot history with time-based eviction.
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
    retention: Duration,
}

impl SnapshotStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            snapshots: Vec::new(),
            retention,
        }
    }

    pub fn append(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    /// Drops every snapshot older than the retention window relative to `now`.
    pub fn evict_expired(&mut self, now: SystemTime) {
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return;
        };
        self.snapshots.retain(|s| s.taken_at >= cutoff);
    }

    /// The snapshot with the greatest timestamp, optionally restricted to
    /// successful ones.
    pub fn latest(&self, require_success: bool) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .filter(|s| !require_success || s.online)
            .max_by_key(|s| s.taken_at)
    }

    /// Maps every retained snapshot to a series point in insertion order.
    pub fn player_series(&self, label: &str, now: SystemTime) -> PlayerCountSeries {
        let points = self
            .snapshots
            .iter()
            .map(|s| {
                let minutes = match now.duration_since(s.taken_at) {
                    Ok(age) => -(age.as_secs_f64() / 60.0),
                    Err(ahead) => ahead.duration().as_secs_f64() / 60.0,
                };
                (minutes, s.player_count as f64)
            })
            .collect();

        PlayerCountSeries {
            label: label.to_string(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
