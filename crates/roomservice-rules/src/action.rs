//! The `Action` trait and the name → action table.
//!
//! Actions are the extension point: scoring rules, chat commands and the
//! like live outside this crate and are registered by name at startup.
//! Configurations then refer to them by that name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{ActionError, Context, RulesError};

/// A named, side-effecting reaction to a lifecycle event.
///
/// Receives the parameter list bound in the configuration and the context
/// built for this dispatch. Returning `Err` marks the invocation as failed;
/// the registry logs it and moves on to the next handler.
///
/// Any `Fn(&[String], &Context) -> Result<(), ActionError>` closure is an
/// action:
///
/// ```rust
/// use roomservice_rules::{ActionError, ActionRegistry, Context};
///
/// let mut actions = ActionRegistry::new();
/// actions.register("Shout", |params: &[String], _ctx: &Context| -> Result<(), ActionError> {
///     let text = params.first().ok_or(ActionError::ParameterCount {
///         expected: 1,
///         got: 0,
///     })?;
///     println!("{}", text.to_uppercase());
///     Ok(())
/// });
/// assert!(actions.resolve("Shout").is_some());
/// ```
pub trait Action: Send + Sync + 'static {
    fn invoke(
        &self,
        parameters: &[String],
        context: &Context,
    ) -> Result<(), ActionError>;
}

impl<F> Action for F
where
    F: Fn(&[String], &Context) -> Result<(), ActionError>
        + Send
        + Sync
        + 'static,
{
    fn invoke(
        &self,
        parameters: &[String],
        context: &Context,
    ) -> Result<(), ActionError> {
        self(parameters, context)
    }
}

/// Registration table of actions, keyed by the name configurations use.
///
/// Cheap to clone: entries are `Arc`s, so a clone shares the same actions.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` under `name`. A second registration under the
    /// same name replaces the first and returns `true`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        action: impl Action,
    ) -> bool {
        let name = name.into();
        let replaced = self.actions.insert(name.clone(), Arc::new(action)).is_some();
        if replaced {
            tracing::warn!(action = %name, "action re-registered, previous handler replaced");
        } else {
            tracing::debug!(action = %name, "action registered");
        }
        replaced
    }

    /// Looks up an action by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Resolves and runs an action.
    ///
    /// The dispatcher does not contain failures: an unknown name or a
    /// failing action comes back as an error for the caller to report.
    ///
    /// # Errors
    /// - [`RulesError::UnresolvedAction`]: no action under `name`
    /// - [`RulesError::ActionFailed`]: the action returned an error
    pub fn invoke(
        &self,
        name: &str,
        parameters: &[String],
        context: &Context,
    ) -> Result<(), RulesError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| RulesError::UnresolvedAction(name.to_string()))?;
        action
            .invoke(parameters, context)
            .map_err(|source| RulesError::ActionFailed {
                action: name.to_string(),
                source,
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
