//! Unified error type for RoomService.

use roomservice_protocol::ProtocolError;
use roomservice_rules::RulesError;
use roomservice_tracker::TrackerError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum RoomServiceError {
    /// Decoding a config or event log failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A tracker operation named an unknown player.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// A binding, dispatch or config-file error.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// The service actor has shut down or its channel is closed.
    #[error("room service is unavailable")]
    Unavailable,
}
