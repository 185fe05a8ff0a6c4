//! The room tracker: the session's table of players and levels.
//!
//! Responsibilities:
//! - Reconciling host roster snapshots into the player table
//! - Explicit joins, leaves and full disconnects
//! - Registering levels and remembering the current one
//! - Folding round results into best times
//!
//! # Concurrency note
//!
//! `RoomTracker` is NOT thread-safe by itself. It is owned by the service
//! object, which is driven from the host's event loop or from the service
//! actor's task. Serialization of mutations happens at that level.

use std::collections::HashMap;

use roomservice_protocol::{
    LevelId, LevelInfo, PlayerId, RoomSnapshot, RosterEntry, RoundResult,
};

use crate::{Level, Player, TrackerError};

/// Tracks every player and level seen during the session.
///
/// ## Player lifecycle
///
/// ```text
/// snapshot / add_player ──→ [online] ──mark_offline / disconnect──→ [offline]
///                              ↑                                        │
///                              └────────── snapshot / add_player ───────┘
/// ```
///
/// There is no removal: identity persists for the whole session.
#[derive(Debug, Default)]
pub struct RoomTracker {
    /// Keyed by identity, so reconciliation can never duplicate a player.
    players: HashMap<PlayerId, Player>,

    levels: HashMap<LevelId, Level>,

    /// The level most recently registered as current.
    current_level: Option<LevelId>,
}

impl RoomTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the tracker against a host snapshot.
    ///
    /// Every roster entry is created (online, no history) or refreshed
    /// (online, latest name). Players missing from the roster are left
    /// exactly as they were; going offline only happens through
    /// [`mark_offline`](Self::mark_offline) or
    /// [`set_all_players_network_state`](Self::set_all_players_network_state).
    pub fn process_room_state(&mut self, snapshot: &RoomSnapshot) {
        let mut created = 0usize;
        for entry in &snapshot.roster {
            if self.upsert(entry) {
                created += 1;
            }
        }

        if let Some(level) = &snapshot.current_level {
            self.set_current_level(level);
        }

        tracing::debug!(
            roster = snapshot.roster.len(),
            created,
            tracked = self.players.len(),
            current_level = ?self.current_level,
            "room state processed"
        );
    }

    /// Explicit join: creates the player or brings them back online.
    pub fn add_player(&mut self, entry: &RosterEntry) -> &Player {
        if self.upsert(entry) {
            tracing::info!(player_id = %entry.id, name = %entry.name, "player tracked");
        } else {
            tracing::info!(player_id = %entry.id, name = %entry.name, "player rejoined");
        }
        &self.players[&entry.id]
    }

    /// Looks up a player by identity.
    ///
    /// Returns `None` for identities never seen this session.
    pub fn get_player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    /// Looks up a level by identity.
    pub fn get_level(&self, level_id: &LevelId) -> Option<&Level> {
        self.levels.get(level_id)
    }

    /// The level most recently registered as current, if any.
    pub fn get_current_level(&self) -> Option<&Level> {
        self.current_level
            .as_ref()
            .and_then(|id| self.levels.get(id))
    }

    /// Marks one player offline. Returns the updated player, or `None` if
    /// the identity is unknown.
    pub fn mark_offline(&mut self, player_id: PlayerId) -> Option<&Player> {
        let player = self.players.get_mut(&player_id)?;
        player.online = false;
        tracing::info!(%player_id, "player marked offline");
        Some(&*player)
    }

    /// Sets every tracked player's online flag. Used on full disconnect.
    pub fn set_all_players_network_state(&mut self, online: bool) {
        for player in self.players.values_mut() {
            player.online = online;
        }
        tracing::info!(online, players = self.players.len(), "network state set for all players");
    }

    /// Registers (or re-registers) a level without making it current.
    ///
    /// Returns `true` if the stored metadata changed.
    pub fn register_level(&mut self, info: &LevelInfo) -> bool {
        let level = Level::from(info);
        match self.levels.get(&info.id) {
            Some(existing) if *existing == level => false,
            _ => {
                tracing::debug!(level_id = %info.id, name = %info.name, "level registered");
                self.levels.insert(info.id.clone(), level);
                true
            }
        }
    }

    /// Folds a round result into the player's best times.
    ///
    /// DNFs and non-finite times are ignored. Returns `true` if the result
    /// set a new best.
    ///
    /// # Errors
    /// Returns [`TrackerError::UnknownPlayer`] if the result names a player
    /// the tracker has never seen.
    pub fn record_result(
        &mut self,
        result: &RoundResult,
    ) -> Result<bool, TrackerError> {
        let player = self
            .players
            .get_mut(&result.player_id)
            .ok_or(TrackerError::UnknownPlayer(result.player_id))?;

        if !result.finished {
            return Ok(false);
        }
        if !result.time.is_finite() {
            tracing::warn!(
                player_id = %result.player_id,
                level_id = %result.level_id,
                time = result.time,
                "non-finite result time ignored"
            );
            return Ok(false);
        }

        let improved = player.offer_time(&result.level_id, result.time);
        if improved {
            tracing::info!(
                player_id = %result.player_id,
                level_id = %result.level_id,
                time = result.time,
                "new personal best"
            );
        }
        Ok(improved)
    }

    /// Adds `delta` points to a player and returns the new total.
    ///
    /// # Errors
    /// - [`TrackerError::UnknownPlayer`]: unknown identity
    /// - [`TrackerError::PointsOverflow`]: the total would leave `i64`'s
    ///   range; the stored total is unchanged
    pub fn add_points(
        &mut self,
        player_id: PlayerId,
        delta: i64,
    ) -> Result<i64, TrackerError> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(TrackerError::UnknownPlayer(player_id))?;
        player.points = player.points.checked_add(delta).ok_or(
            TrackerError::PointsOverflow {
                player_id,
                total: player.points,
                delta,
            },
        )?;
        Ok(player.points)
    }

    /// Iterates over every tracked player (online or not), in no
    /// particular order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn online_count(&self) -> usize {
        self.players.values().filter(|p| p.online).count()
    }

    /// Number of tracked players (any state).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    // -- internals --------------------------------------------------------

    /// Creates or refreshes a player. Returns `true` if it was created.
    fn upsert(&mut self, entry: &RosterEntry) -> bool {
        match self.players.get_mut(&entry.id) {
            Some(player) => {
                player.refresh(entry);
                false
            }
            None => {
                self.players.insert(entry.id, Player::new(entry));
                true
            }
        }
    }

    fn set_current_level(&mut self, info: &LevelInfo) {
        self.register_level(info);
        if self.current_level.as_ref() != Some(&info.id) {
            tracing::info!(level_id = %info.id, name = %info.name, "current level changed");
            self.current_level = Some(info.id.clone());
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `RoomTracker`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn entry(id: u64, name: &str) -> RosterEntry {
        RosterEntry::new(pid(id), name)
    }

    fn level(id: &str, name: &str) -> LevelInfo {
        LevelInfo::new(id, name, "someone")
    }

    fn snapshot(roster: &[(u64, &str)], current: Option<LevelInfo>) -> RoomSnapshot {
        RoomSnapshot {
            roster: roster.iter().map(|(id, name)| entry(*id, name)).collect(),
            current_level: current,
        }
    }

    fn result(player: u64, level: &str, time: f64, finished: bool) -> RoundResult {
        RoundResult {
            player_id: pid(player),
            level_id: LevelId::new(level),
            time,
            rank: 1,
            finished,
        }
    }

    // =====================================================================
    // process_room_state()
    // =====================================================================

    #[test]
    fn test_process_room_state_creates_new_players_online() {
        let mut tracker = RoomTracker::new();

        tracker.process_room_state(&snapshot(&[(1, "Ada"), (2, "Bo")], None));

        assert_eq!(tracker.len(), 2);
        let ada = tracker.get_player(pid(1)).expect("tracked");
        assert!(ada.online);
        assert_eq!(ada.points, 0);
        assert!(ada.best_times.is_empty());
    }

    #[test]
    fn test_process_room_state_repeated_does_not_duplicate() {
        let mut tracker = RoomTracker::new();
        let snap = snapshot(&[(1, "Ada"), (2, "Bo")], None);

        tracker.process_room_state(&snap);
        tracker.process_room_state(&snap);
        tracker.process_room_state(&snapshot(&[(2, "Bo"), (1, "Ada")], None));

        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_process_room_state_refreshes_name_and_online() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[(1, "Ada")], None));
        tracker.mark_offline(pid(1));

        tracker.process_room_state(&snapshot(&[(1, "Ada (AFK)")], None));

        let ada = tracker.get_player(pid(1)).unwrap();
        assert!(ada.online);
        assert_eq!(ada.name, "Ada (AFK)");
    }

    #[test]
    fn test_process_room_state_leaves_absent_players_untouched() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[(1, "Ada"), (2, "Bo")], None));

        // Bo vanished from the roster without an explicit leave.
        tracker.process_room_state(&snapshot(&[(1, "Ada")], None));

        let bo = tracker.get_player(pid(2)).expect("never removed");
        assert!(bo.online, "absence from a snapshot is not an offline transition");
    }

    #[test]
    fn test_process_room_state_keeps_points_of_existing_players() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[(1, "Ada")], None));
        tracker.add_points(pid(1), 10).unwrap();

        tracker.process_room_state(&snapshot(&[(1, "Ada")], None));

        assert_eq!(tracker.get_player(pid(1)).unwrap().points, 10);
    }

    #[test]
    fn test_process_room_state_registers_current_level() {
        let mut tracker = RoomTracker::new();

        tracker.process_room_state(&snapshot(&[], Some(level("L1", "Loop"))));

        let current = tracker.get_current_level().expect("current level");
        assert_eq!(current.id, LevelId::new("L1"));
        assert_eq!(current.name, "Loop");
        assert!(tracker.get_level(&LevelId::new("L1")).is_some());
    }

    #[test]
    fn test_process_room_state_without_level_keeps_previous_current() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[], Some(level("L1", "Loop"))));

        tracker.process_room_state(&snapshot(&[(1, "Ada")], None));

        assert_eq!(
            tracker.get_current_level().map(|l| l.id.clone()),
            Some(LevelId::new("L1"))
        );
    }

    #[test]
    fn test_process_room_state_reregisters_changed_metadata() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[], Some(level("L1", "Loop"))));

        tracker.process_room_state(&snapshot(&[], Some(level("L1", "Loop v2"))));

        assert_eq!(tracker.get_level(&LevelId::new("L1")).unwrap().name, "Loop v2");
    }

    // =====================================================================
    // add_player() / get_player()
    // =====================================================================

    #[test]
    fn test_add_player_then_get_player_is_online() {
        let mut tracker = RoomTracker::new();

        tracker.add_player(&entry(7, "Cy"));

        assert!(tracker.get_player(pid(7)).unwrap().online);
    }

    #[test]
    fn test_add_player_reactivates_offline_player() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(7, "Cy"));
        tracker.add_points(pid(7), 3).unwrap();
        tracker.mark_offline(pid(7));

        let player = tracker.add_player(&entry(7, "Cy"));

        assert!(player.online);
        assert_eq!(player.points, 3, "returning players keep their history");
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_get_player_unknown_returns_none() {
        let tracker = RoomTracker::new();
        assert!(tracker.get_player(pid(99)).is_none());
    }

    #[test]
    fn test_get_level_unknown_returns_none() {
        let tracker = RoomTracker::new();
        assert!(tracker.get_level(&LevelId::new("nope")).is_none());
        assert!(tracker.get_current_level().is_none());
    }

    // =====================================================================
    // mark_offline() / set_all_players_network_state()
    // =====================================================================

    #[test]
    fn test_mark_offline_unknown_returns_none() {
        let mut tracker = RoomTracker::new();
        assert!(tracker.mark_offline(pid(5)).is_none());
    }

    #[test]
    fn test_set_all_players_network_state_false_marks_everyone_offline() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[(1, "Ada"), (2, "Bo"), (3, "Cy")], None));

        tracker.set_all_players_network_state(false);

        for id in 1..=3 {
            assert!(!tracker.get_player(pid(id)).unwrap().online);
        }
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn test_set_all_players_network_state_true_restores_everyone() {
        let mut tracker = RoomTracker::new();
        tracker.process_room_state(&snapshot(&[(1, "Ada"), (2, "Bo")], None));
        tracker.set_all_players_network_state(false);

        tracker.set_all_players_network_state(true);

        assert_eq!(tracker.online_count(), 2);
    }

    // =====================================================================
    // record_result() / add_points()
    // =====================================================================

    #[test]
    fn test_record_result_sets_best_time() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(1, "Ada"));

        assert!(tracker.record_result(&result(1, "L1", 42.0, true)).unwrap());
        assert!(!tracker.record_result(&result(1, "L1", 50.0, true)).unwrap());

        let ada = tracker.get_player(pid(1)).unwrap();
        assert_eq!(ada.best_time(&LevelId::new("L1")), Some(42.0));
    }

    #[test]
    fn test_record_result_dnf_is_ignored() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(1, "Ada"));

        let improved = tracker.record_result(&result(1, "L1", 10.0, false)).unwrap();

        assert!(!improved);
        assert!(tracker.get_player(pid(1)).unwrap().best_times.is_empty());
    }

    #[test]
    fn test_record_result_unknown_player_returns_error() {
        let mut tracker = RoomTracker::new();

        let outcome = tracker.record_result(&result(4, "L1", 10.0, true));

        assert!(matches!(outcome, Err(TrackerError::UnknownPlayer(p)) if p == pid(4)));
    }

    #[test]
    fn test_add_points_accumulates() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(1, "Ada"));

        tracker.add_points(pid(1), 5).unwrap();
        let total = tracker.add_points(pid(1), -2).unwrap();

        assert_eq!(total, 3);
    }

    #[test]
    fn test_record_result_nan_time_is_ignored() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(1, "Ada"));

        assert!(!tracker.record_result(&result(1, "L1", f64::NAN, true)).unwrap());
        assert!(tracker.record_result(&result(1, "L1", 42.0, true)).unwrap());
        assert!(!tracker.record_result(&result(1, "L1", 50.0, true)).unwrap());

        let ada = tracker.get_player(pid(1)).unwrap();
        assert_eq!(ada.best_time(&LevelId::new("L1")), Some(42.0));
    }

    #[test]
    fn test_add_points_overflow_returns_error_and_keeps_total() {
        let mut tracker = RoomTracker::new();
        tracker.add_player(&entry(1, "Ada"));
        tracker.add_points(pid(1), i64::MAX).unwrap();

        let outcome = tracker.add_points(pid(1), 1);

        assert!(matches!(
            outcome,
            Err(TrackerError::PointsOverflow { player_id, total: i64::MAX, delta: 1 }) if player_id == pid(1)
        ));
        assert_eq!(tracker.get_player(pid(1)).unwrap().points, i64::MAX);
    }

    #[test]
    fn test_add_points_unknown_player_returns_error() {
        let mut tracker = RoomTracker::new();
        assert!(tracker.add_points(pid(1), 1).is_err());
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut tracker = RoomTracker::new();
        assert!(tracker.is_empty());

        tracker.add_player(&entry(1, "Ada"));

        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_empty());
        assert_eq!(tracker.players().count(), 1);
    }
}
