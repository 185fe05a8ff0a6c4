//! Service actor: a Tokio task that owns a [`RoomService`].
//!
//! Host callbacks can arrive on any thread. Rather than lock the service,
//! the actor takes commands over an mpsc channel and applies them one at
//! a time, so no dispatch ever observes a half-applied update.

use roomservice_protocol::{HostEvent, PlayerId};
use roomservice_rules::{ConfigState, FireReport, LoadReport, ServiceConfig};
use roomservice_tracker::{Level, Player};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::{RoomService, RoomServiceError};

/// Commands sent to the service actor.
///
/// Variants with a `reply` wait for the actor's answer; the rest are
/// fire-and-forget.
enum ServiceCommand {
    LoadConfig {
        config: ServiceConfig,
        reply: oneshot::Sender<LoadReport>,
    },

    UnloadConfig {
        reply: oneshot::Sender<Option<ServiceConfig>>,
    },

    /// A host event, applied in arrival order.
    Event { event: HostEvent },

    /// A host event whose dispatch report the sender wants back.
    Dispatch {
        event: HostEvent,
        reply: oneshot::Sender<Option<FireReport>>,
    },

    Player {
        player_id: PlayerId,
        reply: oneshot::Sender<Option<Player>>,
    },

    Players {
        reply: oneshot::Sender<Vec<Player>>,
    },

    CurrentLevel {
        reply: oneshot::Sender<Option<Level>>,
    },

    Info {
        reply: oneshot::Sender<ServiceInfo>,
    },

    Shutdown,
}

/// A summary of the actor's service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub state: ConfigState,
    /// Name of the active config, if any.
    pub config_name: Option<String>,
    pub tracked_players: usize,
    pub online_players: usize,
    /// Total installed bindings across all events.
    pub bindings: usize,
}

/// Handle to a running service actor.
///
/// Cheap to clone; every clone talks to the same service.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    sender: mpsc::Sender<ServiceCommand>,
}

impl ServiceHandle {
    /// Activates a config and waits for its `OnLoad` actions to finish.
    pub async fn load_config(
        &self,
        config: ServiceConfig,
    ) -> Result<LoadReport, RoomServiceError> {
        self.request(|reply| ServiceCommand::LoadConfig { config, reply })
            .await
    }

    /// Deactivates the current config.
    pub async fn unload_config(
        &self,
    ) -> Result<Option<ServiceConfig>, RoomServiceError> {
        self.request(|reply| ServiceCommand::UnloadConfig { reply })
            .await
    }

    /// Queues a host event (fire-and-forget).
    ///
    /// Waits only if the channel is full.
    pub async fn send_event(&self, event: HostEvent) -> Result<(), RoomServiceError> {
        self.sender
            .send(ServiceCommand::Event { event })
            .await
            .map_err(|_| RoomServiceError::Unavailable)
    }

    /// Applies a host event and waits for its dispatch report.
    ///
    /// `None` for events that fire nothing.
    pub async fn dispatch(
        &self,
        event: HostEvent,
    ) -> Result<Option<FireReport>, RoomServiceError> {
        self.request(|reply| ServiceCommand::Dispatch { event, reply })
            .await
    }

    /// A snapshot of one tracked player.
    pub async fn player(
        &self,
        player_id: PlayerId,
    ) -> Result<Option<Player>, RoomServiceError> {
        self.request(|reply| ServiceCommand::Player { player_id, reply })
            .await
    }

    /// Snapshots of every tracked player, ordered by id.
    pub async fn players(&self) -> Result<Vec<Player>, RoomServiceError> {
        self.request(|reply| ServiceCommand::Players { reply }).await
    }

    pub async fn current_level(&self) -> Result<Option<Level>, RoomServiceError> {
        self.request(|reply| ServiceCommand::CurrentLevel { reply })
            .await
    }

    pub async fn info(&self) -> Result<ServiceInfo, RoomServiceError> {
        self.request(|reply| ServiceCommand::Info { reply }).await
    }

    /// Tells the actor to dispose the service and stop.
    ///
    /// Events queued before this call are still applied.
    pub async fn shutdown(&self) -> Result<(), RoomServiceError> {
        self.sender
            .send(ServiceCommand::Shutdown)
            .await
            .map_err(|_| RoomServiceError::Unavailable)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ServiceCommand,
    ) -> Result<T, RoomServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomServiceError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomServiceError::Unavailable)
    }
}

struct ServiceActor {
    service: RoomService,
    receiver: mpsc::Receiver<ServiceCommand>,
}

impl ServiceActor {
    async fn run(mut self) {
        tracing::info!("service actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ServiceCommand::LoadConfig { config, reply } => {
                    let _ = reply.send(self.service.load_config(config));
                }
                ServiceCommand::UnloadConfig { reply } => {
                    let _ = reply.send(self.service.unload_config());
                }
                ServiceCommand::Event { event } => {
                    self.service.handle_event(event);
                }
                ServiceCommand::Dispatch { event, reply } => {
                    let _ = reply.send(self.service.handle_event(event));
                }
                ServiceCommand::Player { player_id, reply } => {
                    let player = self.service.tracker().get_player(player_id).cloned();
                    let _ = reply.send(player);
                }
                ServiceCommand::Players { reply } => {
                    let mut players: Vec<Player> =
                        self.service.tracker().players().cloned().collect();
                    players.sort_by_key(|p| p.id);
                    let _ = reply.send(players);
                }
                ServiceCommand::CurrentLevel { reply } => {
                    let level = self.service.tracker().get_current_level().cloned();
                    let _ = reply.send(level);
                }
                ServiceCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                ServiceCommand::Shutdown => {
                    tracing::info!("service actor shutting down");
                    break;
                }
            }
        }

        self.service.dispose();
        tracing::info!("service actor stopped");
    }

    fn info(&self) -> ServiceInfo {
        let tracker = self.service.tracker();
        ServiceInfo {
            state: self.service.state(),
            config_name: self.service.active_config().map(|c| c.name.clone()),
            tracked_players: tracker.len(),
            online_players: tracker.online_count(),
            bindings: self.service.subscriptions().len(),
        }
    }
}

/// Moves `service` into a new actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it's full.
/// The actor stops on [`ServiceHandle::shutdown`] or once every handle is
/// dropped, disposing the service either way.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_service(service: RoomService, channel_size: usize) -> ServiceHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = ServiceActor {
        service,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    ServiceHandle { sender: tx }
}
