//! Tracked entities: the data the tracker keeps about players and levels.
//!
//! A [`Player`] records:
//! - WHO the player is (`PlayerId` and display name)
//! - WHETHER they are in the lobby right now (`online`)
//! - WHAT they achieved this session (points, best time per level)
//!
//! Players are never removed. A player who leaves is only marked offline,
//! so someone who comes back keeps their history.

use std::collections::HashMap;

use roomservice_protocol::{LevelId, LevelInfo, PlayerId, RosterEntry};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player seen at least once during the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,

    /// Latest display name reported by the host.
    pub name: String,

    pub online: bool,

    /// Points handed out by scoring actions.
    pub points: i64,

    /// Fastest finished time (seconds) per level.
    pub best_times: HashMap<LevelId, f64>,
}

impl Player {
    /// A fresh, online player with no points and no times.
    pub fn new(entry: &RosterEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            online: true,
            points: 0,
            best_times: HashMap::new(),
        }
    }

    pub fn best_time(&self, level: &LevelId) -> Option<f64> {
        self.best_times.get(level).copied()
    }

    /// Marks the player online and picks up a renamed display name.
    pub(crate) fn refresh(&mut self, entry: &RosterEntry) {
        self.online = true;
        if self.name != entry.name {
            self.name = entry.name.clone();
        }
    }

    /// Keeps `time` if it beats the stored best. Returns `true` on improvement.
    ///
    /// NaN and infinite times are never stored.
    pub(crate) fn offer_time(&mut self, level: &LevelId, time: f64) -> bool {
        if !time.is_finite() {
            return false;
        }
        match self.best_times.get(level) {
            Some(best) if *best <= time => false,
            _ => {
                self.best_times.insert(level.clone(), time);
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A level seen at least once during the session.
///
/// Immutable once registered; the tracker swaps in a new value if the same
/// ID shows up with different metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub author: String,
}

impl From<&LevelInfo> for Level {
    fn from(info: &LevelInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            author: info.author.clone(),
        }
    }
}
