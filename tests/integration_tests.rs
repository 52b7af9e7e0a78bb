//! Integration tests for the watch pipeline
//!
//! These tests drive a full watcher (dispatcher, store, detector, tracker,
//! poll loop) against scripted probe strategies and assert on the published
//! event batches.

use async_trait::async_trait;
use shared::{PlayerInfo, ProbeError, Snapshot, WatchEvent, WatchUpdate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use watcher::{ProbeStrategy, ServerWatcher, WatchConfig};

/// Replays a fixed script of probe results, repeating the final entry, and
/// counts how many probes ran.
struct ScriptedProbe {
    script: Vec<Result<Snapshot, ProbeError>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProbe {
    fn new(script: Vec<Result<Snapshot, ProbeError>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl ProbeStrategy for ScriptedProbe {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn probe(&self, _host: &str, _port: u16) -> Result<Snapshot, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.script[call.min(self.script.len() - 1)].clone()
    }
}

/// Every probe reports the current value of a shared counter as the player
/// count, incrementing it afterwards. Useful for observing poll cadence.
struct CountingProbe {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ProbeStrategy for CountingProbe {
    fn name(&self) -> &str {
        "counting"
    }

    async fn probe(&self, _host: &str, _port: u16) -> Result<Snapshot, ProbeError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        Ok(Snapshot::success(count, 64, "1.20.4", "counting", None))
    }
}

fn fast_config(label: &str) -> WatchConfig {
    WatchConfig {
        poll_interval: Duration::from_millis(10),
        probe_timeout: Duration::from_millis(200),
        retry_backoff: Duration::from_millis(1),
        ..WatchConfig::new(label, "127.0.0.1", 25565)
    }
}

fn roster(ids: &[&str]) -> Vec<PlayerInfo> {
    ids.iter().map(|id| PlayerInfo::new(*id, *id)).collect()
}

fn online_snapshot(players: &[&str]) -> Snapshot {
    Snapshot::success(
        players.len() as u32,
        20,
        "1.20.4",
        "Welcome!",
        Some(roster(players)),
    )
}

async fn next_batch(updates: &mut tokio::sync::broadcast::Receiver<WatchUpdate>) -> WatchUpdate {
    timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("no batch within deadline")
        .expect("update channel closed")
}

fn presence_changes(events: &[WatchEvent]) -> Vec<(String, bool)> {
    let mut changes: Vec<(String, bool)> = events
        .iter()
        .filter_map(|e| match e {
            WatchEvent::PlayerPresenceChanged { id, online, .. } => Some((id.clone(), *online)),
            _ => None,
        })
        .collect();
    changes.sort();
    changes
}

/// FULL PIPELINE SCENARIOS
mod pipeline_tests {
    use super::*;

    /// The first cycle seeds everything: online event, full count as delta,
    /// and a join per roster entry.
    #[tokio::test]
    async fn first_cycle_seeds_state() {
        let (probe, _) = ScriptedProbe::new(vec![Ok(online_snapshot(&["a", "b"]))]);
        let mut watcher = ServerWatcher::new(fast_config("seed"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let batch = next_batch(&mut updates).await;
        watcher.stop().await;

        assert!(batch.events.contains(&WatchEvent::OnlineStatusChanged {
            online: true,
            detail: "Welcome!".to_string(),
        }));
        assert!(batch
            .events
            .contains(&WatchEvent::PlayerCountChanged { delta: 2 }));
        assert_eq!(
            presence_changes(&batch.events),
            vec![("a".to_string(), true), ("b".to_string(), true)]
        );

        let status = watcher.status().await;
        assert!(status.online);
        assert_eq!(status.player_count, 2);
        assert_eq!(status.players.len(), 2);
    }

    /// Roster {a,b} -> {b,c}: leave(a) and join(c), b untouched, no count
    /// event since the total is unchanged.
    #[tokio::test]
    async fn roster_churn_emits_join_and_leave() {
        let (probe, _) = ScriptedProbe::new(vec![
            Ok(online_snapshot(&["a", "b"])),
            Ok(online_snapshot(&["b", "c"])),
        ]);
        let mut watcher = ServerWatcher::new(fast_config("churn"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let _seed = next_batch(&mut updates).await;
        let batch = next_batch(&mut updates).await;
        watcher.stop().await;

        assert_eq!(
            presence_changes(&batch.events),
            vec![("a".to_string(), false), ("c".to_string(), true)]
        );
        assert!(!batch
            .events
            .iter()
            .any(|e| matches!(e, WatchEvent::PlayerCountChanged { .. })));
        assert!(!batch
            .events
            .iter()
            .any(|e| matches!(e, WatchEvent::OnlineStatusChanged { .. })));
    }

    /// Identical consecutive cycles publish nothing after the seed batch.
    #[tokio::test]
    async fn unchanged_cycles_stay_quiet() {
        let (probe, calls) = ScriptedProbe::new(vec![Ok(online_snapshot(&["a"]))]);
        let mut watcher = ServerWatcher::new(fast_config("quiet"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let _seed = next_batch(&mut updates).await;

        // wait for several more cycles to run, none of which may publish
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) < 4 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        watcher.stop().await;

        assert!(calls.load(Ordering::SeqCst) >= 4);
        assert!(updates.try_recv().is_err());
    }

    /// An outage fires offline with the trimmed error text, appends a failed
    /// snapshot, and leaves presence state untouched; recovery fires online
    /// without re-joining the still-present player.
    #[tokio::test]
    async fn outage_and_recovery() {
        let (probe, _) = ScriptedProbe::new(vec![
            Ok(online_snapshot(&["a"])),
            Err(ProbeError::Network(
                "connection reset at Tcp.Connect(host)".to_string(),
            )),
            Ok(online_snapshot(&["a"])),
        ]);
        let mut watcher = ServerWatcher::new(fast_config("outage"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let _seed = next_batch(&mut updates).await;

        let down = next_batch(&mut updates).await;
        assert!(down.events.contains(&WatchEvent::OnlineStatusChanged {
            online: false,
            detail: "network failure: connection reset".to_string(),
        }));
        assert!(down
            .events
            .contains(&WatchEvent::PlayerCountChanged { delta: -1 }));
        assert!(presence_changes(&down.events).is_empty());

        let up = next_batch(&mut updates).await;
        watcher.stop().await;

        assert!(up.events.iter().any(|e| matches!(
            e,
            WatchEvent::OnlineStatusChanged { online: true, .. }
        )));
        // "a" never left from the tracker's point of view
        assert!(presence_changes(&up.events).is_empty());
    }

    /// Failed snapshots still land in the history, so the series includes
    /// zero-count points for outage cycles.
    #[tokio::test]
    async fn series_includes_failed_cycles() {
        let (probe, _) = ScriptedProbe::new(vec![
            Ok(online_snapshot(&["a", "b"])),
            Err(ProbeError::Network("down".to_string())),
        ]);
        let mut watcher = ServerWatcher::new(fast_config("series"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let _seed = next_batch(&mut updates).await;
        let _down = next_batch(&mut updates).await;
        watcher.stop().await;

        let series = watcher.player_series().await;
        assert_eq!(series.label, "series");
        assert!(series.points.len() >= 2);
        assert_eq!(series.points[0].1, 2.0);
        assert_eq!(series.points[1].1, 0.0);
    }
}

/// LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// Calling start twice leaves exactly one loop: after stop, no probe
    /// runs anymore, which an orphaned second loop would violate.
    #[tokio::test]
    async fn double_start_leaves_single_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            calls: Arc::clone(&calls),
        };
        let mut watcher = ServerWatcher::new(fast_config("double"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        watcher.start().await;
        assert!(watcher.is_running());

        let _batch = next_batch(&mut updates).await;
        timeout(Duration::from_secs(2), watcher.stop())
            .await
            .expect("stop did not complete");
        assert!(!watcher.is_running());

        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    /// Stop then start resumes polling with history intact.
    #[tokio::test]
    async fn stop_then_start_resumes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            calls: Arc::clone(&calls),
        };
        let mut watcher = ServerWatcher::new(fast_config("resume"), vec![Box::new(probe)]);
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let first = next_batch(&mut updates).await;
        watcher.stop().await;
        let stored = watcher.player_series().await.points.len();
        assert!(stored >= 1);

        watcher.start().await;
        let resumed = next_batch(&mut updates).await;
        watcher.stop().await;

        // counts keep rising across the restart, so the delta keeps firing
        assert!(resumed.snapshot.player_count > first.snapshot.player_count);
        assert!(watcher.player_series().await.points.len() > stored);
    }

    /// Stopping a watcher that never started is a no-op.
    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let (probe, calls) = ScriptedProbe::new(vec![Ok(online_snapshot(&[]))]);
        let mut watcher = ServerWatcher::new(fast_config("idle"), vec![Box::new(probe)]);

        watcher.stop().await;
        assert!(!watcher.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

/// DISPATCH FALLBACK TESTS
mod dispatch_tests {
    use super::*;

    /// A failing primary strategy falls through to the secondary within one
    /// poll cycle, and the published snapshot comes from the secondary.
    #[tokio::test]
    async fn fallback_to_secondary_strategy() {
        let (primary, primary_calls) = ScriptedProbe::new(vec![Err(ProbeError::ProtocolMismatch(
            "unexpected handshake".to_string(),
        ))]);
        let (secondary, secondary_calls) = ScriptedProbe::new(vec![Ok(online_snapshot(&["a"]))]);

        let mut watcher = ServerWatcher::new(
            fast_config("fallback"),
            vec![Box::new(primary), Box::new(secondary)],
        );
        let mut updates = watcher.subscribe();

        watcher.start().await;
        let batch = next_batch(&mut updates).await;
        watcher.stop().await;

        assert!(batch.snapshot.online);
        // primary gets two tries per cycle with two strategies installed
        assert!(primary_calls.load(Ordering::SeqCst) >= 2);
        assert!(secondary_calls.load(Ordering::SeqCst) >= 1);
    }
}
