//! Configuration data and the configuration lifecycle.

use std::collections::BTreeMap;
use std::path::Path;

use roomservice_protocol::{Codec, JsonCodec};
use serde::{Deserialize, Serialize};

use crate::RulesError;

/// Flat key → value table every action can read through its context.
pub type Parameters = BTreeMap<String, String>;

static NO_PARAMETERS: Parameters = BTreeMap::new();

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// One action bound to an event, with the parameters it will receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    pub action: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// A loadable configuration: event bindings plus a parameter table.
///
/// Event names are kept as strings so that a typo in a config file is a
/// reportable binding error, not a decode failure for the whole file.
///
/// ```json
/// {
///   "name": "points-race",
///   "parameters": { "greeting": "welcome" },
///   "events": {
///     "OnRoundStart": [ { "action": "LogMessage", "parameters": ["start"] } ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub parameters: Parameters,

    /// Event name → bindings, in declaration order per event.
    #[serde(default)]
    pub events: BTreeMap<String, Vec<ActionBinding>>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a parameter (builder pattern).
    #[must_use]
    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Appends a binding to `event` (builder pattern).
    #[must_use]
    pub fn bind<I, S>(
        mut self,
        event: impl Into<String>,
        action: impl Into<String>,
        parameters: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.entry(event.into()).or_default().push(ActionBinding {
            action: action.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Every `(event name, binding)` pair, grouped by event.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &ActionBinding)> {
        self.events.iter().flat_map(|(event, bindings)| {
            bindings.iter().map(move |binding| (event.as_str(), binding))
        })
    }

    /// Decodes a JSON configuration.
    ///
    /// # Errors
    /// Returns [`RulesError::Protocol`] if the bytes aren't a valid config.
    pub fn from_json(data: &[u8]) -> Result<Self, RulesError> {
        Ok(JsonCodec.decode(data)?)
    }
}

/// Reads and decodes a JSON configuration file.
///
/// # Errors
/// - [`RulesError::ConfigRead`]: the file can't be read
/// - [`RulesError::Protocol`]: the contents aren't a valid config
pub fn load_config_file(path: impl AsRef<Path>) -> Result<ServiceConfig, RulesError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| RulesError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ServiceConfig::from_json(&data)?;
    tracing::info!(path = %path.display(), name = %config.name, "config file read");
    Ok(config)
}

// ---------------------------------------------------------------------------
// ActiveConfig
// ---------------------------------------------------------------------------

/// The configuration slot: either nothing is active, or exactly one config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveConfig {
    #[default]
    None,
    Loaded(ServiceConfig),
}

impl ActiveConfig {
    /// The active parameter table, or an empty table when nothing is loaded.
    pub fn parameters(&self) -> &Parameters {
        match self {
            Self::None => &NO_PARAMETERS,
            Self::Loaded(config) => &config.parameters,
        }
    }

    pub fn config(&self) -> Option<&ServiceConfig> {
        match self {
            Self::None => None,
            Self::Loaded(config) => Some(config),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Empties the slot, returning whatever was loaded.
    pub fn take(&mut self) -> Option<ServiceConfig> {
        match std::mem::take(self) {
            Self::None => None,
            Self::Loaded(config) => Some(config),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigState
// ---------------------------------------------------------------------------

/// Where the service is in the configuration lifecycle.
///
/// Transitions are strictly ordered and cyclic:
///
/// ```text
/// Unloaded → Loading → Loaded → Unloading → Unloaded
/// ```
///
/// - **Loading**: old bindings cleared, new ones being installed, then
///   `OnLoad` fires.
/// - **Loaded**: bindings live; host events dispatch actions.
/// - **Unloading**: `OnUnload` fires, then bindings are cleared and the
///   config is dropped.
///
/// Loading while `Loaded` goes round the cycle through `Unloading`; there
/// is no shortcut from `Loaded` to `Loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Unloading,
}

impl ConfigState {
    /// The only state reachable from this one.
    pub fn next(self) -> Self {
        match self {
            Self::Unloaded => Self::Loading,
            Self::Loading => Self::Loaded,
            Self::Loaded => Self::Unloading,
            Self::Unloading => Self::Unloaded,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl std::fmt::Display for ConfigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unloaded => write!(f, "Unloaded"),
            Self::Loading => write!(f, "Loading"),
            Self::Loaded => write!(f, "Loaded"),
            Self::Unloading => write!(f, "Unloading"),
        }
    }
}
