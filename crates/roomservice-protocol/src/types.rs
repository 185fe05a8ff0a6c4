//! Core value types shared by the tracker, the rule engine and the host.
//!
//! Everything here is plain data. None of these types know about the
//! tracker's tables or the active configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a player (the host's 64-bit account ID).
///
/// `#[serde(transparent)]` keeps it a bare number in JSON, so
/// `PlayerId(76561198000000000)` is written as `76561198000000000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a level (the track's UID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Snapshot types: what the host pushes
// ---------------------------------------------------------------------------

/// One line of the host's player list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
}

impl RosterEntry {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Level metadata as reported by the host's level provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub id: LevelId,
    pub name: String,
    #[serde(default)]
    pub author: String,
}

impl LevelInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: LevelId::new(id),
            name: name.into(),
            author: author.into(),
        }
    }
}

/// A point-in-time push of the full roster and the current level.
///
/// Not an entity: the tracker reconciles its tables against it and then
/// the snapshot is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub current_level: Option<LevelInfo>,
}

/// One player's outcome on one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub player_id: PlayerId,
    pub level_id: LevelId,
    /// Finish time in seconds.
    pub time: f64,
    /// 1-based leaderboard position.
    pub rank: u32,
    /// `false` for a DNF.
    #[serde(default = "default_finished")]
    pub finished: bool,
}

fn default_finished() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Lobby: the host's "current lobby" query surface
// ---------------------------------------------------------------------------

/// The lobby the local client is sitting in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    /// Ordered level rotation. `None` when the lobby has no playlist.
    #[serde(default)]
    pub playlist: Option<Vec<LevelInfo>>,
    /// Zero-based index into `playlist`.
    #[serde(default)]
    pub current_index: usize,
}

impl Lobby {
    /// The playlist position as shown to players: 1-based index plus length.
    pub fn playlist_position(&self) -> Option<PlaylistPosition> {
        self.playlist.as_ref().map(|levels| PlaylistPosition {
            index: self.current_index.saturating_add(1),
            length: levels.len(),
        })
    }
}

/// 1-based current index and total length of the level rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistPosition {
    pub index: usize,
    pub length: usize,
}

// ---------------------------------------------------------------------------
// LifecycleEvent: the names a configuration can bind to
// ---------------------------------------------------------------------------

/// The closed set of events a configuration can bind actions to.
///
/// Configurations refer to them by their PascalCase names, so parsing goes
/// through [`FromStr`] and unknown names surface as
/// [`ProtocolError::UnknownEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Right after a configuration's bindings are installed.
    OnLoad,
    /// Right before a configuration's bindings are torn down.
    OnUnload,
    OnPlayerJoined,
    OnPlayerLeft,
    /// A level finished loading and the round begins.
    OnRoundStart,
    /// The round ended (podium).
    OnRoundEnd,
}

impl LifecycleEvent {
    /// Every event, in declaration order.
    pub const ALL: [LifecycleEvent; 6] = [
        Self::OnLoad,
        Self::OnUnload,
        Self::OnPlayerJoined,
        Self::OnPlayerLeft,
        Self::OnRoundStart,
        Self::OnRoundEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnLoad => "OnLoad",
            Self::OnUnload => "OnUnload",
            Self::OnPlayerJoined => "OnPlayerJoined",
            Self::OnPlayerLeft => "OnPlayerLeft",
            Self::OnRoundStart => "OnRoundStart",
            Self::OnRoundEnd => "OnRoundEnd",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownEvent(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// HostEvent: every host callback as a value
// ---------------------------------------------------------------------------

/// A callback raised by the host game.
///
/// The host adapter reads whatever the event needs (the player list, the
/// current level) at the moment it fires and packs it in here. The core
/// never calls back into the host for roster data.
///
/// `#[serde(tag = "type")]` gives the event log a flat shape:
/// `{ "type": "PlayerLeft", "player_id": 42 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    /// The leaderboard changed; carries the fresh roster.
    RosterUpdated { snapshot: RoomSnapshot },
    PlayerJoined { entry: RosterEntry },
    PlayerLeft { player_id: PlayerId },
    /// A level finished loading. Fires `OnRoundStart` after reconciling.
    LevelLoaded { snapshot: RoomSnapshot },
    /// Fires `OnRoundEnd`.
    RoundEnded,
    /// A result arrived from the round-result feed.
    RoundResult { result: RoundResult },
    /// The local client entered a lobby.
    LobbyJoined { snapshot: RoomSnapshot },
    /// The local client lost its connection to the game.
    Disconnected,
}

impl HostEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RosterUpdated { .. } => "RosterUpdated",
            Self::PlayerJoined { .. } => "PlayerJoined",
            Self::PlayerLeft { .. } => "PlayerLeft",
            Self::LevelLoaded { .. } => "LevelLoaded",
            Self::RoundEnded => "RoundEnded",
            Self::RoundResult { .. } => "RoundResult",
            Self::LobbyJoined { .. } => "LobbyJoined",
            Self::Disconnected => "Disconnected",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_level_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&LevelId::new("abc-123")).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }

    #[test]
    fn test_lifecycle_event_from_str_accepts_every_name() {
        for event in LifecycleEvent::ALL {
            assert_eq!(event.as_str().parse::<LifecycleEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_lifecycle_event_from_str_unknown_returns_error() {
        let result = "BadEvent".parse::<LifecycleEvent>();

        assert!(
            matches!(result, Err(ProtocolError::UnknownEvent(ref name)) if name == "BadEvent")
        );
    }

    #[test]
    fn test_lifecycle_event_from_str_is_case_sensitive() {
        assert!("onload".parse::<LifecycleEvent>().is_err());
    }

    #[test]
    fn test_lobby_playlist_position_is_one_based() {
        let lobby = Lobby {
            playlist: Some(vec![
                LevelInfo::new("a", "A", ""),
                LevelInfo::new("b", "B", ""),
                LevelInfo::new("c", "C", ""),
            ]),
            current_index: 1,
        };

        assert_eq!(
            lobby.playlist_position(),
            Some(PlaylistPosition { index: 2, length: 3 })
        );
    }

    #[test]
    fn test_lobby_playlist_position_max_index_saturates() {
        let lobby = Lobby {
            playlist: Some(vec![]),
            current_index: usize::MAX,
        };

        assert_eq!(
            lobby.playlist_position(),
            Some(PlaylistPosition { index: usize::MAX, length: 0 })
        );
    }

    #[test]
    fn test_lobby_without_playlist_has_no_position() {
        let lobby = Lobby::default();
        assert_eq!(lobby.playlist_position(), None);
    }

    #[test]
    fn test_host_event_uses_internal_tag() {
        let event = HostEvent::PlayerLeft {
            player_id: PlayerId(9),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "PlayerLeft");
        assert_eq!(json["player_id"], 9);
    }

    #[test]
    fn test_round_result_finished_defaults_to_true() {
        let result: RoundResult = serde_json::from_str(
            r#"{ "player_id": 1, "level_id": "L", "time": 31.5, "rank": 1 }"#,
        )
        .unwrap();

        assert!(result.finished);
    }

    #[test]
    fn test_snapshot_missing_fields_default_to_empty() {
        let snapshot: RoomSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.roster.is_empty());
        assert!(snapshot.current_level.is_none());
    }
}
