//! # Game-Server Status Watcher
//!
//! Continuously monitors one network game server through periodic status
//! probes and turns the raw poll results into discrete change events:
//! server up/down, player count deltas, and per-player join/leave.
//! Consumers that need "what changed since the last poll" subscribe to event
//! batches; consumers that need "what is the current value" read the status
//! view or the retained time series.
//!
//! ## Module Organization
//!
//! - [`dispatcher`] — tries protocol probe strategies in priority order with
//!   bounded retries and a hard per-attempt timeout.
//! - [`store`] — bounded snapshot history with time-based eviction and
//!   time-series extraction for plotting.
//! - [`detector`] — diffs the newest snapshot against its predecessor and
//!   emits online-status and player-count events.
//! - [`tracker`] — per-player presence state that survives snapshot eviction,
//!   so joins and leaves are detected across the whole watch lifetime.
//! - [`poller`] — the cancelable driver loop tying the above together on a
//!   fixed interval.
//! - [`config`] / [`status`] — target configuration and the read-only
//!   current-status view.
//!
//! ## Concurrency Model
//!
//! Each watcher runs one spawned tokio task that performs every state
//! mutation; handles only read. Probe failures never terminate the loop:
//! they are normalized into failed snapshots and recorded like any other
//! result, so monitoring degrades to stale data instead of stopping.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use watcher::{ServerWatcher, WatchConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = WatchConfig::new("lobby", "mc.example.org", 25565);
//!     // probe strategies are pluggable; wire-protocol clients live outside
//!     // this crate
//!     let mut watcher = ServerWatcher::new(config, vec![]);
//!     let mut updates = watcher.subscribe();
//!
//!     watcher.start().await;
//!     while let Ok(update) = updates.recv().await {
//!         for event in &update.events {
//!             println!("{:?}", event);
//!         }
//!     }
//!     watcher.stop().await;
//! }
//! ```

pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod poller;
pub mod status;
pub mod store;
pub mod tracker;

pub use config::WatchConfig;
pub use dispatcher::{ProbeDispatcher, ProbeStrategy};
pub use poller::ServerWatcher;
pub use status::StatusView;
pub use store::PlayerCountSeries;
