//! Shared vocabulary for RoomService.
//!
//! This crate defines the values that flow between the host game and the
//! rule engine:
//!
//! - **Identity and snapshot types** ([`PlayerId`], [`LevelId`],
//!   [`RoomSnapshot`], [`RoundResult`], [`Lobby`]): what the host pushes.
//! - **Event names** ([`LifecycleEvent`]): the closed set of events a
//!   configuration can bind actions to.
//! - **Host events** ([`HostEvent`]): every host callback as a value, so
//!   events can be queued, sent to an actor, or replayed from a file.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how configuration and
//!   event logs are converted to/from bytes.
//!
//! # Architecture
//!
//! ```text
//! Host game (callbacks) → Protocol (HostEvent) → Tracker + Rules
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    HostEvent, LevelId, LevelInfo, LifecycleEvent, Lobby, PlayerId,
    PlaylistPosition, RoomSnapshot, RosterEntry, RoundResult,
};
