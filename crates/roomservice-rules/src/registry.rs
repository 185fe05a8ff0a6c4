//! Event subscriptions: which actions run when a lifecycle event fires.
//!
//! Each event owns an ordered list of bound handlers. Handlers are
//! appended in configuration order and fire in that order. There is no
//! way to remove a single handler; configurations are swapped whole via
//! [`SubscriptionRegistry::unsubscribe_all`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use roomservice_protocol::LifecycleEvent;

use crate::{
    Action, ActionRegistry, ContextBuilder, ContextSeed, RulesError,
    ServiceConfig,
};

/// An action resolved at bind time, plus the parameters it was bound with.
struct BoundHandler {
    action_name: String,
    action: Arc<dyn Action>,
    parameters: Vec<String>,
}

/// Outcome of installing a configuration's bindings.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Bindings that were installed.
    pub installed: usize,
    /// Bindings that were skipped, with the reason.
    pub skipped: Vec<RulesError>,
    /// Outcome of the `OnLoad` actions, once the config is active.
    pub on_load: Option<FireReport>,
}

impl LoadReport {
    /// No skipped bindings and no failed `OnLoad` action.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.on_load.as_ref().is_none_or(FireReport::is_clean)
    }
}

/// Outcome of firing one event.
#[derive(Debug)]
pub struct FireReport {
    pub event: LifecycleEvent,
    /// Handlers that ran to completion.
    pub succeeded: usize,
    /// Handlers that failed or panicked. Their siblings still ran.
    pub failures: Vec<RulesError>,
}

impl FireReport {
    fn new(event: LifecycleEvent) -> Self {
        Self {
            event,
            succeeded: 0,
            failures: Vec::new(),
        }
    }

    /// Total handlers that were invoked.
    pub fn invoked(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered bound handlers per lifecycle event.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: HashMap<LifecycleEvent, Vec<BoundHandler>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `action_name` to `event_name`.
    ///
    /// The action is resolved now, not when the event fires, so a bad
    /// name is caught while the configuration loads.
    ///
    /// # Errors
    /// - [`RulesError::UnknownEvent`]: `event_name` isn't a lifecycle event
    /// - [`RulesError::UnknownAction`]: nothing is registered as `action_name`
    ///
    /// On error the registry is unchanged.
    pub fn subscribe(
        &mut self,
        event_name: &str,
        action_name: &str,
        parameters: Vec<String>,
        actions: &ActionRegistry,
    ) -> Result<(), RulesError> {
        let event: LifecycleEvent = event_name
            .parse()
            .map_err(|_| RulesError::UnknownEvent(event_name.to_string()))?;

        let action = actions.resolve(action_name).ok_or_else(|| {
            RulesError::UnknownAction {
                event,
                action: action_name.to_string(),
            }
        })?;

        self.handlers.entry(event).or_default().push(BoundHandler {
            action_name: action_name.to_string(),
            action,
            parameters,
        });

        tracing::debug!(%event, action = action_name, "action subscribed");
        Ok(())
    }

    /// Replaces every binding with the bindings from `config`.
    ///
    /// Bad bindings are logged and skipped; the rest still install.
    pub fn install(
        &mut self,
        config: &ServiceConfig,
        actions: &ActionRegistry,
    ) -> LoadReport {
        self.unsubscribe_all();

        let mut report = LoadReport::default();
        for (event_name, binding) in config.bindings() {
            match self.subscribe(
                event_name,
                &binding.action,
                binding.parameters.clone(),
                actions,
            ) {
                Ok(()) => report.installed += 1,
                Err(e) => {
                    tracing::error!(
                        config = %config.name,
                        error = %e,
                        "skipping binding"
                    );
                    report.skipped.push(e);
                }
            }
        }
        report
    }

    /// Removes every handler from every event.
    pub fn unsubscribe_all(&mut self) {
        let removed = self.len();
        self.handlers.clear();
        if removed > 0 {
            tracing::debug!(removed, "all subscriptions cleared");
        }
    }

    /// Runs every handler bound to `event`, in subscription order.
    ///
    /// Each handler gets its own freshly built context. A handler that
    /// returns an error or panics (while its context is built, or while it
    /// runs) is logged and recorded in the report; the remaining handlers
    /// still run.
    pub fn fire(
        &self,
        event: LifecycleEvent,
        seed: &ContextSeed,
        contexts: &ContextBuilder<'_>,
    ) -> FireReport {
        let mut report = FireReport::new(event);
        let Some(handlers) = self.handlers.get(&event) else {
            return report;
        };

        for handler in handlers {
            // Context assembly calls into the host's lobby, so it shares the
            // handler's unwind boundary.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let context = contexts.create_context(seed);
                handler.action.invoke(&handler.parameters, &context)
            }));

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(source)) => Some(RulesError::ActionFailed {
                    action: handler.action_name.clone(),
                    source,
                }),
                Err(payload) => Some(RulesError::ActionPanicked {
                    action: handler.action_name.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };

            match failure {
                None => {
                    tracing::debug!(%event, action = %handler.action_name, "action invoked");
                    report.succeeded += 1;
                }
                Some(e) => {
                    tracing::error!(%event, error = %e, "action failed, continuing with next handler");
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Number of handlers bound to `event`.
    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Names of the actions bound to `event`, in firing order.
    pub fn bound_actions(&self, event: LifecycleEvent) -> Vec<&str> {
        self.handlers
            .get(&event)
            .map(|handlers| {
                handlers.iter().map(|h| h.action_name.as_str()).collect()
            })
            .unwrap_or_default()
    }

    /// Total handlers across all events.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event in LifecycleEvent::ALL {
            let bound = self.bound_actions(event);
            if !bound.is_empty() {
                map.entry(&event, &bound);
            }
        }
        map.finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
