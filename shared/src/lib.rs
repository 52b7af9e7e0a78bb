use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_RETENTION_SECS: u64 = 600;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_ABSENT_CYCLE_LIMIT: u32 = 240;

/// Why a probe attempt failed to produce a successful snapshot.
///
/// Every failure is normalized into one of these kinds and carried inside a
/// failed [`Snapshot`]; the poll loop never sees a raw transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ProbeError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),
    #[error("timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
}

impl ProbeError {
    /// Human-readable description with any trailing " at ..." trace suffix
    /// dropped, keeping only the leading kind and message.
    pub fn summary(&self) -> String {
        trim_location_suffix(&self.to_string()).to_string()
    }
}

/// Cuts a message at the first " at " delimiter so stack-trace style
/// location suffixes never reach user-facing notifications.
pub fn trim_location_suffix(text: &str) -> &str {
    match text.find(" at ") {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// One player currently on the server, as reported by a probe.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
}

impl PlayerInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Immutable record of one probe result.
///
/// Created once per poll cycle and never mutated afterwards. Failed probes
/// still produce a snapshot so the latest attempt is always on record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub taken_at: SystemTime,
    /// Whether the probe reached the server and got a valid answer.
    pub online: bool,
    pub player_count: u32,
    pub max_players: u32,
    pub version: String,
    pub motd: String,
    pub error: Option<ProbeError>,
    /// Roster of currently online players, when the protocol reports one.
    pub players: Option<Vec<PlayerInfo>>,
}

impl Snapshot {
    /// Builds a successful snapshot timestamped now.
    pub fn success(
        player_count: u32,
        max_players: u32,
        version: impl Into<String>,
        motd: impl Into<String>,
        players: Option<Vec<PlayerInfo>>,
    ) -> Self {
        Self {
            taken_at: SystemTime::now(),
            online: true,
            player_count,
            max_players,
            version: version.into(),
            motd: motd.into(),
            error: None,
            players,
        }
    }

    /// Builds a failed snapshot timestamped now, carrying the failure cause.
    pub fn failure(error: ProbeError) -> Self {
        Self {
            taken_at: SystemTime::now(),
            online: false,
            player_count: 0,
            max_players: 0,
            version: String::new(),
            motd: String::new(),
            error: Some(error),
            players: None,
        }
    }

    /// Age relative to `now`; zero when the snapshot is not older than `now`.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.taken_at).unwrap_or(Duration::ZERO)
    }
}

/// A discrete change detected between two consecutive poll cycles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The server went up or down. `detail` carries the motd when it came
    /// up, or the trimmed error summary when it went down.
    OnlineStatusChanged { online: bool, detail: String },
    /// The online player count moved by `delta` since the previous cycle.
    PlayerCountChanged { delta: i32 },
    /// A tracked player joined (`online = true`) or left the server.
    PlayerPresenceChanged {
        id: String,
        name: String,
        online: bool,
    },
}

/// Everything one poll cycle produced: the snapshot plus the change events
/// detected against the previous cycle. Published only when `events` is
/// non-empty.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchUpdate {
    pub snapshot: Snapshot,
    pub events: Vec<WatchEvent>,
}
