//! The RoomService rule engine.
//!
//! A configuration binds lifecycle events to named actions. When an event
//! fires, every bound action runs in declaration order with its bound
//! parameters and a freshly built [`Context`].
//!
//! # Key types
//!
//! - [`Action`]: the trait extension code implements (closures work too)
//! - [`ActionRegistry`]: name → action table, filled before configs load
//! - [`SubscriptionRegistry`]: ordered bound handlers per event
//! - [`ContextBuilder`] / [`Context`]: per-dispatch state snapshot
//! - [`ServiceConfig`] / [`ConfigState`]: configuration data and lifecycle

mod action;
mod config;
mod context;
mod error;
mod registry;

pub use action::{Action, ActionRegistry};
pub use config::{
    ActionBinding, ActiveConfig, ConfigState, Parameters, ServiceConfig,
    load_config_file,
};
pub use context::{Context, ContextBuilder, ContextSeed, LobbySource, NoLobby};
pub use error::{ActionError, RulesError};
pub use registry::{FireReport, LoadReport, SubscriptionRegistry};
