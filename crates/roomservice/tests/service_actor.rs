//! Integration tests for the service actor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use roomservice::prelude::*;
use roomservice::{ConfigState, LevelId, RoomServiceError};

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

type Log = Arc<Mutex<Vec<String>>>;

/// A service whose `Record` action appends its first parameter to `log`.
fn spawn_recording(log: &Log) -> ServiceHandle {
    let sink = Arc::clone(log);
    let mut actions = ActionRegistry::new();
    actions.register("Record", move |params: &[String], _: &Context| -> Result<(), ActionError> {
        sink.lock().unwrap().push(params.first().cloned().unwrap_or_default());
        Ok(())
    });
    spawn_service(RoomService::new(actions), 32)
}

fn joined(id: u64, name: &str) -> HostEvent {
    HostEvent::PlayerJoined {
        entry: RosterEntry::new(pid(id), name),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_load_config_reports_installed_bindings() {
    let log = Log::default();
    let handle = spawn_recording(&log);

    let report = handle
        .load_config(ServiceConfig::new("a").bind("OnLoad", "Record", ["load"]))
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.installed, 1);
    assert_eq!(*log.lock().unwrap(), vec!["load"]);

    let info = handle.info().await.unwrap();
    assert_eq!(info.state, ConfigState::Loaded);
    assert_eq!(info.config_name.as_deref(), Some("a"));
    assert_eq!(info.bindings, 1);
}

#[tokio::test]
async fn test_events_are_applied_in_send_order() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    handle
        .load_config(
            ServiceConfig::new("a")
                .bind("OnPlayerJoined", "Record", ["join"])
                .bind("OnRoundEnd", "Record", ["end"]),
        )
        .await
        .unwrap();

    handle.send_event(joined(1, "Ada")).await.unwrap();
    handle.send_event(HostEvent::RoundEnded).await.unwrap();
    handle.send_event(joined(2, "Bo")).await.unwrap();

    // A request/reply round-trip queues behind the events above.
    let info = handle.info().await.unwrap();
    assert_eq!(info.tracked_players, 2);
    assert_eq!(*log.lock().unwrap(), vec!["join", "end", "join"]);
}

#[tokio::test]
async fn test_dispatch_returns_fire_report() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    handle
        .load_config(ServiceConfig::new("a").bind("OnRoundEnd", "Record", ["end"]))
        .await
        .unwrap();

    let report = handle.dispatch(HostEvent::RoundEnded).await.unwrap().expect("fires");
    let quiet = handle.dispatch(HostEvent::Disconnected).await.unwrap();

    assert_eq!(report.event, LifecycleEvent::OnRoundEnd);
    assert_eq!(report.succeeded, 1);
    assert!(quiet.is_none());
}

#[tokio::test]
async fn test_player_query_returns_snapshot() {
    let log = Log::default();
    let handle = spawn_recording(&log);

    handle.send_event(joined(1, "Ada")).await.unwrap();
    handle
        .send_event(HostEvent::PlayerLeft { player_id: pid(1) })
        .await
        .unwrap();

    let ada = handle.player(pid(1)).await.unwrap().expect("tracked");
    assert_eq!(ada.name, "Ada");
    assert!(!ada.online);
    assert!(handle.player(pid(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_players_are_sorted_by_id() {
    let log = Log::default();
    let handle = spawn_recording(&log);

    handle.send_event(joined(3, "Cy")).await.unwrap();
    handle.send_event(joined(1, "Ada")).await.unwrap();
    handle.send_event(joined(2, "Bo")).await.unwrap();

    let ids: Vec<PlayerId> = handle
        .players()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![pid(1), pid(2), pid(3)]);
}

#[tokio::test]
async fn test_current_level_follows_level_loaded() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    assert!(handle.current_level().await.unwrap().is_none());

    handle
        .send_event(HostEvent::LevelLoaded {
            snapshot: RoomSnapshot {
                roster: vec![],
                current_level: Some(LevelInfo::new("L7", "Seven", "")),
            },
        })
        .await
        .unwrap();

    let level = handle.current_level().await.unwrap().expect("level loaded");
    assert_eq!(level.id, LevelId::new("L7"));
}

#[tokio::test]
async fn test_unload_config_returns_config() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    handle
        .load_config(ServiceConfig::new("a").bind("OnUnload", "Record", ["bye"]))
        .await
        .unwrap();

    let config = handle.unload_config().await.unwrap();

    assert_eq!(config.map(|c| c.name), Some("a".to_string()));
    assert_eq!(*log.lock().unwrap(), vec!["bye"]);
    assert_eq!(handle.info().await.unwrap().state, ConfigState::Unloaded);
}

#[tokio::test]
async fn test_shutdown_disposes_service_and_closes_handle() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    handle
        .load_config(ServiceConfig::new("a").bind("OnUnload", "Record", ["bye"]))
        .await
        .unwrap();

    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*log.lock().unwrap(), vec!["bye"]);
    let result = handle.info().await;
    assert!(matches!(result, Err(RoomServiceError::Unavailable)));
}

#[tokio::test]
async fn test_handle_clones_share_one_service() {
    let log = Log::default();
    let handle = spawn_recording(&log);
    let other = handle.clone();

    handle.send_event(joined(1, "Ada")).await.unwrap();
    other.send_event(joined(2, "Bo")).await.unwrap();

    assert_eq!(handle.info().await.unwrap().tracked_players, 2);
    assert_eq!(other.info().await.unwrap().online_players, 2);
}
