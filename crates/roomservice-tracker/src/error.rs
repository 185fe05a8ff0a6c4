//! Error types for the tracker.

use roomservice_protocol::PlayerId;

/// Errors from tracker operations that need an existing player.
///
/// Plain lookups never produce these; they return `Option` because the
/// event stream can legitimately mention players the tracker has not seen.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// No player with this identity has been seen this session.
    #[error("player {0} is not tracked")]
    UnknownPlayer(PlayerId),

    /// Applying a points delta would overflow the player's total.
    #[error("points for player {player_id} would overflow ({total} + {delta})")]
    PointsOverflow {
        player_id: PlayerId,
        total: i64,
        delta: i64,
    },
}
