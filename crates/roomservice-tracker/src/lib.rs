//! Player and level tracking for RoomService.
//!
//! The tracker is the rule engine's memory of the session:
//!
//! 1. **Roster reconciliation**: folding host snapshots into a table of
//!    [`Player`]s keyed by identity ([`RoomTracker::process_room_state`])
//! 2. **Level registry**: every [`Level`] seen so far plus which one is
//!    current
//! 3. **Results**: best times and points accumulated per player
//!
//! # How it fits in the stack
//!
//! ```text
//! Rules Layer (above)  ← reads players/levels when building contexts
//!     ↕
//! Tracker (this crate)  ← owns player identity and online state
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId, RoomSnapshot, RoundResult
//! ```

mod error;
mod player;
mod tracker;

pub use error::TrackerError;
pub use player::{Level, Player};
pub use tracker::RoomTracker;
