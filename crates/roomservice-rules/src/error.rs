//! Error types for the rule engine.

use std::path::PathBuf;

use roomservice_protocol::{LifecycleEvent, ProtocolError};

/// Errors that can occur while binding or dispatching actions.
///
/// None of these are fatal to the host. Configuration errors skip one
/// binding, action failures skip one handler.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// The configuration names an event outside the lifecycle set.
    #[error("{0} is not a valid event name")]
    UnknownEvent(String),

    /// A binding names an action nobody registered.
    #[error("unknown function name in {event} event: {action}")]
    UnknownAction {
        event: LifecycleEvent,
        action: String,
    },

    /// A direct invocation named an action nobody registered.
    #[error("no action registered as {0}")]
    UnresolvedAction(String),

    /// The action ran and returned an error.
    #[error("action {action} failed: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: ActionError,
    },

    /// The action panicked. The panic was contained to its handler.
    #[error("action {action} panicked: {message}")]
    ActionPanicked { action: String, message: String },

    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Errors an action reports back to the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The bound parameter list has the wrong length.
    #[error("expected {expected} parameter(s), got {got}")]
    ParameterCount { expected: usize, got: usize },

    /// The context lacks something the action needs (e.g. a player).
    #[error("context has no {0}")]
    MissingContext(&'static str),

    #[error("{0}")]
    Failed(String),
}
