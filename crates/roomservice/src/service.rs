//! The service object: tracker, action table and active configuration in
//! one explicitly owned value.
//!
//! There is no global state. The host adapter creates a `RoomService`,
//! keeps it next to its event loop, and forwards host callbacks to the
//! `on_*` methods. Tests create as many isolated instances as they like.

use std::path::Path;

use roomservice_protocol::{
    HostEvent, LifecycleEvent, PlayerId, RoomSnapshot, RosterEntry,
    RoundResult,
};
use roomservice_rules::{
    ActionRegistry, ActiveConfig, ConfigState, Context, ContextBuilder,
    ContextSeed, FireReport, LoadReport, LobbySource, NoLobby, RulesError,
    ServiceConfig, SubscriptionRegistry, load_config_file,
};
use roomservice_tracker::RoomTracker;

use crate::RoomServiceError;

/// The rule engine plus the state it reads.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ load_config() ──→ on_*() events ──→ unload_config() ──→ dispose()
///                ↑                                   │
///                └───────────── load_config() ───────┘
/// ```
///
/// Every method runs to completion before returning. Tracker updates
/// carried by an event are applied before any handler for that event runs.
pub struct RoomService {
    tracker: RoomTracker,
    actions: ActionRegistry,
    subscriptions: SubscriptionRegistry,
    config: ActiveConfig,
    state: ConfigState,
    lobby: Box<dyn LobbySource>,
}

impl RoomService {
    /// Creates a service with no configuration loaded and no lobby.
    ///
    /// `actions` should already hold every action configurations will
    /// name; bindings are resolved when a config loads.
    pub fn new(actions: ActionRegistry) -> Self {
        tracing::info!(actions = actions.len(), "room service created");
        Self {
            tracker: RoomTracker::new(),
            actions,
            subscriptions: SubscriptionRegistry::new(),
            config: ActiveConfig::None,
            state: ConfigState::Unloaded,
            lobby: Box::new(NoLobby),
        }
    }

    /// Sets where playlist positions come from (builder pattern).
    #[must_use]
    pub fn with_lobby(mut self, lobby: impl LobbySource) -> Self {
        self.lobby = Box::new(lobby);
        self
    }

    // -- Configuration lifecycle ------------------------------------------

    /// Activates `config`, replacing whatever was active.
    ///
    /// An active config is fully unloaded first (its `OnUnload` actions
    /// run, its bindings are dropped). Then the new bindings are installed
    /// and the `OnLoad` actions run. Bindings naming unknown events or
    /// actions are skipped and listed in the report, and so are failed
    /// `OnLoad` actions.
    pub fn load_config(&mut self, config: ServiceConfig) -> LoadReport {
        if self.state == ConfigState::Loaded {
            tracing::info!("config already loaded, unloading before replace");
            self.unload_config();
        }

        self.transition(ConfigState::Loading);
        let mut report = self.subscriptions.install(&config, &self.actions);
        tracing::info!(
            name = %config.name,
            installed = report.installed,
            skipped = report.skipped.len(),
            "config loaded"
        );
        self.config = ActiveConfig::Loaded(config);
        self.transition(ConfigState::Loaded);

        report.on_load = Some(self.fire(LifecycleEvent::OnLoad, &ContextSeed::empty()));
        report
    }

    /// Reads a JSON config file and activates it.
    ///
    /// # Errors
    /// Returns [`RoomServiceError::Rules`] if the file can't be read or
    /// decoded. The active config is untouched in that case.
    pub fn load_config_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<LoadReport, RoomServiceError> {
        let config = load_config_file(path)?;
        Ok(self.load_config(config))
    }

    /// Deactivates the current config and returns it.
    ///
    /// `OnUnload` actions run while the config's parameters are still
    /// visible; afterwards every binding is gone. With nothing loaded this
    /// only makes sure no bindings remain.
    pub fn unload_config(&mut self) -> Option<ServiceConfig> {
        if self.state != ConfigState::Loaded {
            self.subscriptions.unsubscribe_all();
            return None;
        }

        self.transition(ConfigState::Unloading);
        self.fire(LifecycleEvent::OnUnload, &ContextSeed::empty());
        self.subscriptions.unsubscribe_all();
        let config = self.config.take();
        self.transition(ConfigState::Unloaded);

        if let Some(config) = &config {
            tracing::info!(name = %config.name, "config unloaded");
        }
        config
    }

    /// Unloads any active config and drops the service.
    pub fn dispose(mut self) {
        self.unload_config();
        tracing::info!(
            players = self.tracker.len(),
            "room service disposed"
        );
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn active_config(&self) -> Option<&ServiceConfig> {
        self.config.config()
    }

    // -- Host events ------------------------------------------------------

    /// Leaderboard update: reconcile the roster, nothing fires.
    pub fn on_roster_updated(&mut self, snapshot: &RoomSnapshot) {
        self.tracker.process_room_state(snapshot);
    }

    /// A player joined: track them, then fire `OnPlayerJoined`.
    pub fn on_player_joined(&mut self, entry: &RosterEntry) -> FireReport {
        let player = self.tracker.add_player(entry).clone();
        self.fire(
            LifecycleEvent::OnPlayerJoined,
            &ContextSeed::empty().with_player(player),
        )
    }

    /// A player left: mark them offline, then fire `OnPlayerLeft`.
    ///
    /// Returns `None` (and fires nothing) for players never tracked, which
    /// happens when a leave arrives for someone the roster never showed.
    pub fn on_player_left(&mut self, player_id: PlayerId) -> Option<FireReport> {
        let Some(player) = self.tracker.mark_offline(player_id).cloned() else {
            tracing::warn!(%player_id, "leave for untracked player ignored");
            return None;
        };
        Some(self.fire(
            LifecycleEvent::OnPlayerLeft,
            &ContextSeed::empty().with_player(player),
        ))
    }

    /// A level finished loading: reconcile, then fire `OnRoundStart`.
    pub fn on_level_loaded(&mut self, snapshot: &RoomSnapshot) -> FireReport {
        self.tracker.process_room_state(snapshot);
        self.fire(LifecycleEvent::OnRoundStart, &ContextSeed::empty())
    }

    /// The round ended: fire `OnRoundEnd`.
    pub fn on_round_ended(&mut self) -> FireReport {
        self.fire(LifecycleEvent::OnRoundEnd, &ContextSeed::empty())
    }

    /// A result arrived from the result feed: fold it into the tracker.
    ///
    /// Returns `true` if it set a new personal best. Results for untracked
    /// players are logged and dropped.
    pub fn on_round_result(&mut self, result: &RoundResult) -> bool {
        match self.tracker.record_result(result) {
            Ok(improved) => improved,
            Err(e) => {
                tracing::warn!(error = %e, level_id = %result.level_id, "result dropped");
                false
            }
        }
    }

    /// Entered a lobby: reconcile, nothing fires.
    pub fn on_lobby_joined(&mut self, snapshot: &RoomSnapshot) {
        self.tracker.process_room_state(snapshot);
    }

    /// Lost the connection: every player goes offline.
    pub fn on_disconnected(&mut self) {
        self.tracker.set_all_players_network_state(false);
    }

    /// Routes a [`HostEvent`] to the matching `on_*` method.
    ///
    /// Returns the fire report for events that dispatch actions.
    pub fn handle_event(&mut self, event: HostEvent) -> Option<FireReport> {
        tracing::debug!(event = event.kind(), "host event");
        match event {
            HostEvent::RosterUpdated { snapshot } => {
                self.on_roster_updated(&snapshot);
                None
            }
            HostEvent::PlayerJoined { entry } => Some(self.on_player_joined(&entry)),
            HostEvent::PlayerLeft { player_id } => self.on_player_left(player_id),
            HostEvent::LevelLoaded { snapshot } => Some(self.on_level_loaded(&snapshot)),
            HostEvent::RoundEnded => Some(self.on_round_ended()),
            HostEvent::RoundResult { result } => {
                self.on_round_result(&result);
                None
            }
            HostEvent::LobbyJoined { snapshot } => {
                self.on_lobby_joined(&snapshot);
                None
            }
            HostEvent::Disconnected => {
                self.on_disconnected();
                None
            }
        }
    }

    // -- Queries and ad-hoc dispatch --------------------------------------

    pub fn tracker(&self) -> &RoomTracker {
        &self.tracker
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Builds a context the same way event dispatch does.
    pub fn create_context(&self, seed: &ContextSeed) -> Context {
        self.contexts().create_context(seed)
    }

    /// Runs one action outside of any event, with an empty seed.
    ///
    /// # Errors
    /// Unknown names and action failures come back unlogged; the caller
    /// decides how to report them.
    pub fn invoke_action(
        &self,
        name: &str,
        parameters: &[String],
    ) -> Result<(), RulesError> {
        let context = self.create_context(&ContextSeed::empty());
        self.actions.invoke(name, parameters, &context)
    }

    /// Adds points to a tracked player and returns the new total.
    ///
    /// # Errors
    /// Returns [`RoomServiceError::Tracker`] for unknown players.
    pub fn award_points(
        &mut self,
        player_id: PlayerId,
        delta: i64,
    ) -> Result<i64, RoomServiceError> {
        Ok(self.tracker.add_points(player_id, delta)?)
    }

    // -- internals --------------------------------------------------------

    fn contexts(&self) -> ContextBuilder<'_> {
        ContextBuilder::new(&self.tracker, &self.config, self.lobby.as_ref())
    }

    fn fire(&self, event: LifecycleEvent, seed: &ContextSeed) -> FireReport {
        let report = self.subscriptions.fire(event, seed, &self.contexts());
        if report.invoked() > 0 {
            tracing::debug!(
                %event,
                succeeded = report.succeeded,
                failed = report.failures.len(),
                "event dispatched"
            );
        }
        report
    }

    fn transition(&mut self, to: ConfigState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "invalid config transition {} -> {}",
            self.state,
            to
        );
        tracing::debug!(from = %self.state, %to, "config state transition");
        self.state = to;
    }
}

impl std::fmt::Debug for RoomService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomService")
            .field("state", &self.state)
            .field("config", &self.config.config().map(|c| c.name.as_str()))
            .field("players", &self.tracker.len())
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
