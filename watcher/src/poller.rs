//! Poll loop driving probe dispatch, history, and change notification
//!
//! One spawned task per watcher owns all state mutation: the snapshot store,
//! the presence tracker, and the status view are only ever written from the
//! poll loop, so a single watcher has exactly one writer by construction.
//! Start and stop are the only cross-task interactions; both synchronize on
//! the loop actually exiting before returning.

use crate::config::WatchConfig;
use crate::detector;
use crate::dispatcher::{ProbeDispatcher, ProbeStrategy};
use crate::status::StatusView;
use crate::store::{PlayerCountSeries, SnapshotStore};
use crate::tracker::PresenceTracker;
use log::{debug, error, info};
use shared::WatchUpdate;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// State shared between the watcher handle and its poll loop task.
/// Writes happen exclusively on the loop task.
struct WatchState {
    config: WatchConfig,
    dispatcher: ProbeDispatcher,
    store: RwLock<SnapshotStore>,
    tracker: RwLock<PresenceTracker>,
    status: RwLock<StatusView>,
    updates_tx: broadcast::Sender<WatchUpdate>,
}

/// Watches one game server: polls it on a fixed interval, keeps a bounded
/// snapshot history, and publishes a batch of change events per cycle in
/// which anything changed.
pub struct ServerWatcher {
    state: Arc<WatchState>,
    runner: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl ServerWatcher {
    /// Creates a stopped watcher over `strategies` in priority order.
    pub fn new(config: WatchConfig, strategies: Vec<Box<dyn ProbeStrategy>>) -> Self {
        let dispatcher = ProbeDispatcher::new(strategies)
            .with_timing(config.probe_timeout, config.retry_backoff);
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let state = Arc::new(WatchState {
            store: RwLock::new(SnapshotStore::new(config.retention)),
            tracker: RwLock::new(PresenceTracker::new(config.absent_cycle_limit)),
            status: RwLock::new(StatusView::new(&config)),
            dispatcher,
            config,
            updates_tx,
        });

        Self {
            state,
            runner: None,
        }
    }

    /// Starts polling. Safe to call while running: any existing loop is fully
    /// stopped first, so at most one loop is ever active.
    pub async fn start(&mut self) {
        self.stop().await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::clone(&self.state);
        info!(
            "starting watch loop for {} ({}:{})",
            state.config.label, state.config.host, state.config.port
        );
        let handle = tokio::spawn(run_loop(state, shutdown_rx));
        self.runner = Some((shutdown_tx, handle));
    }

    /// Signals shutdown and waits until the loop has exited. A stop can take
    /// up to one in-flight probe attempt before it is observed.
    pub async fn stop(&mut self) {
        let Some((shutdown_tx, handle)) = self.runner.take() else {
            return;
        };

        let _ = shutdown_tx.send(true);
        if let Err(e) = handle.await {
            error!("watch loop for {} failed: {}", self.state.config.label, e);
        }
        info!("watch loop for {} stopped", self.state.config.label);
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_some()
    }

    /// Subscribes to per-cycle event batches. Only non-empty batches are
    /// sent; a slow receiver lags and misses batches rather than stalling
    /// the poll loop.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchUpdate> {
        self.state.updates_tx.subscribe()
    }

    /// Snapshot of the current status view.
    pub async fn status(&self) -> StatusView {
        self.state.status.read().await.clone()
    }

    /// Online-count history over the retained snapshots, x in minutes
    /// relative to now.
    pub async fn player_series(&self) -> PlayerCountSeries {
        self.state
            .store
            .read()
            .await
            .player_series(&self.state.config.label, SystemTime::now())
    }

    pub fn config(&self) -> &WatchConfig {
        &self.state.config
    }
}

async fn run_loop(state: Arc<WatchState>, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let produced = poll_once(&state).await;
        if !produced {
            // nothing ran this cycle; re-enter immediately, yielding so the
            // shutdown signal and other tasks still get scheduled
            tokio::task::yield_now().await;
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(state.config.poll_interval) => {}
            _ = shutdown.changed() => break,
        }
    }
}

/// One poll cycle. Returns false when no probe strategy produced a result at
/// all, in which case the loop skips appending, diffing and sleeping.
async fn poll_once(state: &WatchState) -> bool {
    let now = SystemTime::now();
    state.store.write().await.evict_expired(now);

    let current = state
        .dispatcher
        .dispatch(&state.config.host, state.config.port)
        .await;

    // predecessor must be captured before the new snapshot is appended
    let previous = state.store.read().await.latest(false).cloned();

    state.status.write().await.apply(current.as_ref());

    let Some(current) = current else {
        debug!(
            "no probe strategy produced a result for {}",
            state.config.label
        );
        return false;
    };

    state.store.write().await.append(current.clone());

    let flags = state.config.notify_flags();
    let mut events = detector::detect(previous.as_ref(), &current, flags);
    events.extend(
        state
            .tracker
            .write()
            .await
            .update(current.players.as_deref(), flags.presence),
    );

    if !events.is_empty() {
        debug!(
            "{}: {} change event(s) this cycle",
            state.config.label,
            events.len()
        );
        // send only fails when nobody is subscribed right now
        let _ = state.updates_tx.send(WatchUpdate {
            snapshot: current,
            events,
        });
    }

    true
}
