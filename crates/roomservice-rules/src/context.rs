//! Per-dispatch contexts and the builder that assembles them.
//!
//! A [`Context`] is what an action sees of the world: the active config's
//! parameters, where the lobby is in its playlist, and optionally a player,
//! a level and a round result. It owns clones of everything, so it stays
//! valid and unchanged no matter what the tracker does afterwards.

use std::cell::OnceCell;

use roomservice_protocol::{Lobby, PlaylistPosition, RoundResult};
use roomservice_tracker::{Level, Player, RoomTracker};
use serde::Serialize;

use crate::{ActiveConfig, Parameters};

// ---------------------------------------------------------------------------
// LobbySource: the host's "current lobby" query
// ---------------------------------------------------------------------------

/// Query surface for the lobby the local client is in.
///
/// Implemented by the host adapter. The core asks for the lobby at most once
/// per dispatch pass, so the playlist position is current for that event.
pub trait LobbySource: Send + 'static {
    fn current_lobby(&self) -> Option<Lobby>;
}

/// A lobby source for hosts without lobbies (and for tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLobby;

impl LobbySource for NoLobby {
    fn current_lobby(&self) -> Option<Lobby> {
        None
    }
}

/// A fixed lobby.
impl LobbySource for Lobby {
    fn current_lobby(&self) -> Option<Lobby> {
        Some(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Immutable snapshot handed to an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    parameters: Parameters,
    playlist: Option<PlaylistPosition>,
    player: Option<Player>,
    level: Option<Level>,
    result: Option<RoundResult>,
    player_from_result: bool,
    level_from_result: bool,
}

impl Context {
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Looks up one config parameter.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn playlist(&self) -> Option<PlaylistPosition> {
        self.playlist
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    /// `true` if the player came from the result's own linkage.
    pub fn player_from_result(&self) -> bool {
        self.player_from_result
    }

    /// `true` if the level came from the result's own linkage.
    pub fn level_from_result(&self) -> bool {
        self.level_from_result
    }
}

// ---------------------------------------------------------------------------
// ContextSeed
// ---------------------------------------------------------------------------

/// The event-specific inputs to a context: what the event itself knows.
///
/// Join/leave events seed a player; result events seed a result; most
/// events seed nothing and the builder fills in the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSeed {
    pub player: Option<Player>,
    pub level: Option<Level>,
    pub result: Option<RoundResult>,
}

impl ContextSeed {
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player(mut self, player: Player) -> Self {
        self.player = Some(player);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_result(mut self, result: RoundResult) -> Self {
        self.result = Some(result);
        self
    }
}

// ---------------------------------------------------------------------------
// ContextBuilder
// ---------------------------------------------------------------------------

/// Assembles contexts from the tracker, the active config and the lobby.
///
/// Borrowed views only; a builder is created per dispatch pass and thrown
/// away. The lobby is queried on the first context built and the playlist
/// position reused for the rest of the pass.
pub struct ContextBuilder<'a> {
    tracker: &'a RoomTracker,
    config: &'a ActiveConfig,
    lobby: &'a dyn LobbySource,
    playlist: OnceCell<Option<PlaylistPosition>>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        tracker: &'a RoomTracker,
        config: &'a ActiveConfig,
        lobby: &'a dyn LobbySource,
    ) -> Self {
        Self {
            tracker,
            config,
            lobby,
            playlist: OnceCell::new(),
        }
    }

    fn playlist(&self) -> Option<PlaylistPosition> {
        *self.playlist.get_or_init(|| {
            self.lobby
                .current_lobby()
                .and_then(|lobby| lobby.playlist_position())
        })
    }

    /// Builds a fresh context.
    ///
    /// 1. Parameters come from the active config (empty when none).
    /// 2. The lobby's playlist position is attached if it has a playlist.
    /// 3. A seeded result is attached, and its player and level are looked
    ///    up in the tracker. Whatever resolves wins over the seed.
    /// 4. Otherwise the seeded player is used, and the seeded level or
    ///    else the tracker's current level.
    pub fn create_context(&self, seed: &ContextSeed) -> Context {
        let mut ctx = Context {
            parameters: self.config.parameters().clone(),
            playlist: self.playlist(),
            ..Context::default()
        };

        if let Some(result) = &seed.result {
            ctx.result = Some(result.clone());

            if let Some(player) = self.tracker.get_player(result.player_id) {
                ctx.player = Some(player.clone());
                ctx.player_from_result = true;
            }
            if let Some(level) = self.tracker.get_level(&result.level_id) {
                ctx.level = Some(level.clone());
                ctx.level_from_result = true;
            }
        }

        if !ctx.player_from_result {
            ctx.player = seed.player.clone();
        }

        if !ctx.level_from_result {
            ctx.level = seed
                .level
                .clone()
                .or_else(|| self.tracker.get_current_level().cloned());
        }

        ctx
    }
}
