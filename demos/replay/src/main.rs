//! Replays a recorded host event log against a configuration.
//!
//! ```text
//! roomservice-replay --config demos/replay/data/config.json \
//!                    --events demos/replay/data/events.json
//! ```
//!
//! Every action the config binds should be `LogMessage`, which logs its
//! parameters together with the player and level it was dispatched for.
//! Set `RUST_LOG=debug` to see each dispatch.

use std::path::{Path, PathBuf};

use clap::Parser;
use roomservice::prelude::*;
use roomservice::{Player, load_config_file};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration to load.
    #[arg(short, long)]
    config: PathBuf,

    /// JSON array of host events.
    #[arg(short, long)]
    events: PathBuf,

    /// Pretend the lobby runs a playlist of this many levels.
    #[arg(long)]
    playlist_length: Option<usize>,

    /// Zero-based playlist index the lobby is at.
    #[arg(long, default_value_t = 0)]
    playlist_index: usize,
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed event log: {0}")]
    Events(#[source] serde_json::Error),

    #[error("failed to write standings: {0}")]
    Output(#[source] serde_json::Error),

    #[error(transparent)]
    Service(#[from] RoomServiceError),
}

/// What the tool prints once the log is exhausted.
#[derive(Serialize)]
struct Summary {
    dispatched: usize,
    failed: usize,
    standings: Vec<Player>,
}

fn log_message(params: &[String], ctx: &Context) -> Result<(), ActionError> {
    let player = ctx.player().map(|p| p.name.as_str()).unwrap_or("-");
    let level = ctx.level().map(|l| l.name.as_str()).unwrap_or("-");
    let playlist = ctx
        .playlist()
        .map(|p| format!("{}/{}", p.index, p.length))
        .unwrap_or_else(|| "-".into());
    info!(player, level, %playlist, "{}", params.join(" "));
    Ok(())
}

fn read_events(path: &Path) -> Result<Vec<HostEvent>, ReplayError> {
    let data = std::fs::read(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(ReplayError::Events)
}

/// A placeholder playlist so contexts carry a position.
fn lobby(length: usize, index: usize) -> Lobby {
    Lobby {
        playlist: Some(
            (1..=length)
                .map(|n| LevelInfo::new(format!("slot-{n}"), format!("Slot {n}"), ""))
                .collect(),
        ),
        current_index: index,
    }
}

#[tokio::main]
async fn main() -> Result<(), ReplayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config_file(&cli.config).map_err(RoomServiceError::from)?;
    let events = read_events(&cli.events)?;

    let mut actions = ActionRegistry::new();
    actions.register("LogMessage", log_message);

    let mut service = RoomService::new(actions);
    if let Some(length) = cli.playlist_length {
        service = service.with_lobby(lobby(length, cli.playlist_index));
    }

    let handle = spawn_service(service, 64);
    let report = handle.load_config(config).await?;
    for skipped in &report.skipped {
        tracing::warn!(error = %skipped, "binding skipped");
    }

    info!(events = events.len(), "replaying event log");
    let mut summary = Summary {
        dispatched: 0,
        failed: 0,
        standings: Vec::new(),
    };
    if let Some(on_load) = &report.on_load {
        summary.dispatched += on_load.invoked();
        summary.failed += on_load.failures.len();
    }
    for event in events {
        if let Some(report) = handle.dispatch(event).await? {
            summary.dispatched += report.invoked();
            summary.failed += report.failures.len();
        }
    }

    summary.standings = handle.players().await?;
    let info = handle.info().await?;
    info!(
        players = info.tracked_players,
        online = info.online_players,
        "replay finished"
    );

    handle.unload_config().await?;
    handle.shutdown().await?;

    let out = serde_json::to_string_pretty(&summary).map_err(ReplayError::Output)?;
    println!("{out}");
    Ok(())
}
