//! # RoomService
//!
//! Event-driven rule engine for multiplayer racing game mods.
//!
//! The host game reports what happens (players joining, levels loading,
//! rounds ending). A loaded configuration decides which named actions run
//! in response, with which parameters. Every action receives a [`Context`]
//! describing the current player, level, playlist position and result.
//!
//! ## Quick start
//!
//! ```rust
//! use roomservice::prelude::*;
//!
//! let mut actions = ActionRegistry::new();
//! actions.register("LogMessage", |params: &[String], _ctx: &Context| -> Result<(), ActionError> {
//!     println!("{}", params.join(" "));
//!     Ok(())
//! });
//!
//! let mut service = RoomService::new(actions);
//! let report = service.load_config(
//!     ServiceConfig::new("demo").bind("OnRoundEnd", "LogMessage", ["gg"]),
//! );
//! assert!(report.is_clean());
//!
//! service.on_round_ended();
//! service.dispose();
//! ```
//!
//! Hosts that deliver events from several threads should move the service
//! into an actor with [`spawn_service`] and talk to it through the
//! returned [`ServiceHandle`].

mod actor;
mod error;
mod service;

pub use actor::{ServiceHandle, ServiceInfo, spawn_service};
pub use error::RoomServiceError;
pub use service::RoomService;

pub use roomservice_protocol::{
    HostEvent, LevelId, LevelInfo, LifecycleEvent, Lobby, PlayerId,
    PlaylistPosition, RoomSnapshot, RosterEntry, RoundResult,
};
pub use roomservice_rules::{
    Action, ActionError, ActionRegistry, ConfigState, Context, ContextSeed,
    FireReport, LoadReport, LobbySource, NoLobby, RulesError, ServiceConfig,
    load_config_file,
};
pub use roomservice_tracker::{Level, Player, RoomTracker};

/// Everything a host adapter or action crate usually needs.
pub mod prelude {
    pub use crate::{
        Action, ActionError, ActionRegistry, Context, ContextSeed,
        HostEvent, LevelInfo, LifecycleEvent, Lobby, LobbySource, PlayerId,
        RoomService, RoomServiceError, RoomSnapshot, RosterEntry,
        RoundResult, ServiceConfig, ServiceHandle, spawn_service,
    };
}
