//! Per-player presence tracking across poll cycles
//!
//! Presence state lives independently of snapshot retention: a player who
//! joined twenty minutes ago is still tracked as online even though the
//! snapshot that recorded the join has long been evicted. Large servers often
//! return a truncated roster, so join/leave detection is best-effort by
//! nature.

use log::debug;
use shared::{PlayerInfo, WatchEvent};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct PresenceEntry {
    name: String,
    online: bool,
    /// Consecutive roster-bearing cycles this player has been absent for.
    absent_cycles: u32,
}

/// Tracks which player ids are currently online and their last known names.
///
/// Entries offline for `absent_cycle_limit` consecutive roster-bearing cycles
/// are purged, so the map stays bounded by recent population instead of every
/// identity ever seen. A purged player who returns is a fresh join again.
pub struct PresenceTracker {
    entries: HashMap<String, PresenceEntry>,
    absent_cycle_limit: u32,
}

impl PresenceTracker {
    pub fn new(absent_cycle_limit: u32) -> Self {
        Self {
            entries: HashMap::new(),
            absent_cycle_limit,
        }
    }

    /// Applies one cycle's roster and returns the join/leave events.
    ///
    /// `roster` is `None` when the poll failed outright; nothing changes in
    /// that case, since missing data must never be read as "everyone left".
    /// State is updated regardless of `notify`; the flag only gates event
    /// emission.
    pub fn update(&mut self, roster: Option<&[PlayerInfo]>, notify: bool) -> Vec<WatchEvent> {
        let Some(roster) = roster else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let mut seen = HashSet::new();

        for player in roster {
            // rosters can repeat an id; only the first occurrence counts
            if !seen.insert(player.id.clone()) {
                continue;
            }

            let entry = self
                .entries
                .entry(player.id.clone())
                .or_insert_with(|| PresenceEntry {
                    name: player.name.clone(),
                    online: false,
                    absent_cycles: 0,
                });
            entry.name = player.name.clone();
            entry.absent_cycles = 0;

            if !entry.online {
                entry.online = true;
                if notify {
                    events.push(WatchEvent::PlayerPresenceChanged {
                        id: player.id.clone(),
                        name: player.name.clone(),
                        online: true,
                    });
                }
            }
        }

        for (id, entry) in self.entries.iter_mut() {
            if seen.contains(id) {
                continue;
            }
            if entry.online {
                entry.online = false;
                if notify {
                    events.push(WatchEvent::PlayerPresenceChanged {
                        id: id.clone(),
                        name: entry.name.clone(),
                        online: false,
                    });
                }
            } else {
                entry.absent_cycles += 1;
            }
        }

        let before = self.entries.len();
        let limit = self.absent_cycle_limit;
        self.entries
            .retain(|_, entry| entry.online || entry.absent_cycles < limit);
        if self.entries.len() < before {
            debug!(
                "purged {} presence entries absent for {} cycles",
                before - self.entries.len(),
                limit
            );
        }

        events
    }

    /// Last known online state for `id`, if the player is still tracked.
    pub fn is_online(&self, id: &str) -> Option<bool> {
        self.entries.get(id).map(|e| e.online)
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}
