//! Read-only view of the latest poll result

use crate::config::WatchConfig;
use serde::Serialize;
use shared::{PlayerInfo, Snapshot};
use std::time::SystemTime;

/// Current status of the watched server, rebuilt from every poll result.
///
/// Failed polls overwrite the view too, so it always reflects the latest
/// attempt rather than the latest success.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub label: String,
    pub host: String,
    pub port: u16,
    /// When the view was last refreshed; `None` before the first poll.
    pub last_update: Option<SystemTime>,
    pub online: bool,
    pub player_count: u32,
    pub max_players: u32,
    pub version: String,
    pub motd: String,
    pub last_error: Option<String>,
    pub players: Vec<PlayerInfo>,
}

impl StatusView {
    pub fn new(config: &WatchConfig) -> Self {
        let mut view = Self {
            label: config.label.clone(),
            host: config.host.clone(),
            port: config.port,
            last_update: None,
            online: false,
            player_count: 0,
            max_players: 0,
            version: String::new(),
            motd: String::new(),
            last_error: None,
            players: Vec::new(),
        };
        view.apply(None);
        view
    }

    /// Overwrites the view from one poll result; `None` resets to defaults.
    pub fn apply(&mut self, snapshot: Option<&Snapshot>) {
        match snapshot {
            None => {
                self.last_update = None;
                self.online = false;
                self.player_count = 0;
                self.max_players = 0;
                self.version = "0.0.0".to_string();
                self.motd = "-".to_string();
                self.last_error = None;
                self.players.clear();
            }
            Some(s) => {
                self.last_update = Some(s.taken_at);
                self.online = s.online;
                self.player_count = s.player_count;
                self.max_players = s.max_players;
                self.version = s.version.clone();
                self.motd = if s.online {
                    s.motd.clone()
                } else {
                    "-".to_string()
                };
                self.last_error = s.error.as_ref().map(|e| e.to_string());
                self.players = s.players.clone().unwrap_or_default();
            }
        }
    }
}
