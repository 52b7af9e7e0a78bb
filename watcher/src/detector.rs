//! Snapshot-to-snapshot change detection
//!
//! Compares the new poll result against the immediately preceding snapshot,
//! successful or not. Two consecutive failures therefore never re-fire a
//! "went offline" event, while every success/failure boundary fires exactly
//! once.

use shared::{Snapshot, WatchEvent};

/// Which event kinds the consumer wants to hear about.
#[derive(Debug, Clone, Copy)]
pub struct NotifyFlags {
    pub server: bool,
    pub count: bool,
    pub presence: bool,
}

impl NotifyFlags {
    pub fn all() -> Self {
        Self {
            server: true,
            count: true,
            presence: true,
        }
    }
}

/// Detects online-status and player-count transitions.
///
/// `previous` is the latest snapshot before this cycle, `None` on the very
/// first cycle. A missing predecessor counts as a transition boundary, so the
/// first cycle fires an online-status event and seeds the player counter by
/// reporting the full current count as the delta.
pub fn detect(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    flags: NotifyFlags,
) -> Vec<WatchEvent> {
    let mut events = Vec::new();
    let is_first = previous.is_none();

    if flags.server && (is_first || previous.is_some_and(|p| p.online != current.online)) {
        let detail = if current.online {
            current.motd.clone()
        } else {
            current
                .error
                .as_ref()
                .map(|e| e.summary())
                .unwrap_or_default()
        };
        events.push(WatchEvent::OnlineStatusChanged {
            online: current.online,
            detail,
        });
    }

    if flags.count {
        let baseline = previous.map(|p| p.player_count as i32).unwrap_or(0);
        let delta = current.player_count as i32 - baseline;
        if delta != 0 {
            events.push(WatchEvent::PlayerCountChanged { delta });
        }
    }

    events
}
