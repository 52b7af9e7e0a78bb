//! Demo harness: watches a simulated game server and prints change batches.
//!
//! Real wire-protocol probes are plugged in by the embedding application;
//! this binary stands in a randomized server simulation so the full poll,
//! diff, and publish pipeline can be exercised end to end from a terminal.

use async_trait::async_trait;
use clap::Parser;
use log::{error, info};
use rand::Rng;
use shared::{PlayerInfo, ProbeError, Snapshot};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use watcher::{ProbeStrategy, ServerWatcher, WatchConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Display label for the watched server
    #[clap(short, long, default_value = "demo")]
    label: String,
    /// Server hostname
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[clap(short, long, default_value = "25565")]
    port: u16,
    /// Poll interval in seconds
    #[clap(short, long, default_value = "5")]
    interval: u64,
    /// Disable server up/down notifications
    #[clap(long)]
    no_server_notify: bool,
    /// Disable player count notifications
    #[clap(long)]
    no_count_notify: bool,
    /// Disable join/leave notifications
    #[clap(long)]
    no_presence_notify: bool,
}

struct SimState {
    roster: Vec<PlayerInfo>,
    next_id: u32,
}

/// Fake "modern protocol" probe with random population churn and the
/// occasional outage.
struct SimulatedProbe {
    state: Mutex<SimState>,
}

impl SimulatedProbe {
    fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                roster: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

#[async_trait]
impl ProbeStrategy for SimulatedProbe {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn probe(&self, _host: &str, _port: u16) -> Result<Snapshot, ProbeError> {
        let mut state = self.state.lock().await;
        let mut rng = rand::thread_rng();

        if rng.gen_bool(0.05) {
            return Err(ProbeError::Network("connection refused".to_string()));
        }

        if state.roster.len() < 12 && rng.gen_bool(0.4) {
            let id = state.next_id;
            state.next_id += 1;
            state
                .roster
                .push(PlayerInfo::new(format!("uuid-{id}"), format!("Player{id}")));
        }
        if !state.roster.is_empty() && rng.gen_bool(0.3) {
            let index = rng.gen_range(0..state.roster.len());
            state.roster.remove(index);
        }

        Ok(Snapshot::success(
            state.roster.len() as u32,
            20,
            "1.20.4",
            "Simulated server",
            Some(state.roster.clone()),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = WatchConfig {
        poll_interval: Duration::from_secs(args.interval),
        notify_server: !args.no_server_notify,
        notify_count: !args.no_count_notify,
        notify_presence: !args.no_presence_notify,
        ..WatchConfig::new(args.label, args.host, args.port)
    };

    let mut watcher = ServerWatcher::new(config, vec![Box::new(SimulatedProbe::new())]);
    let mut updates = watcher.subscribe();
    watcher.start().await;
    info!("watching; press Ctrl+C to stop");

    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => match serde_json::to_string(&update) {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("failed to encode update: {}", e),
                },
                Err(RecvError::Lagged(missed)) => {
                    error!("printer lagged, {} batches dropped", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    watcher.stop().await;
    printer.abort();

    Ok(())
}
