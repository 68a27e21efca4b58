//! tests/component/engine.rs
//!
//! In-memory component tests for the `EngineService`. The transport side is
//! replaced by channels, so every phase change and frame is scripted.

use crate::common::harness::EngineHarness;
use collector_console::domain::{Action, ConnectionPhase, Notice, TransportEvent};
use serde_json::json;
use std::time::Duration;
use test_log::test;

const SNAPSHOT: &str =
    r#"{"command":"get_state","result":true,"message":{"collectors":["polar"],"is_running":false}}"#;

async fn open(harness: &mut EngineHarness) {
    harness.feed(TransportEvent::Phase(ConnectionPhase::Connecting)).await;
    harness.feed(TransportEvent::Phase(ConnectionPhase::Open)).await;
    assert_eq!(harness.next_command().await, json!({"command": "get_state"}));
    assert_eq!(
        harness.next_command().await,
        json!({"command": "set_settings", "config": {"mac": "DF:EF:DB:F6:20:16"}})
    );
}

async fn synced_harness(timeout: Option<Duration>) -> EngineHarness {
    let mut harness = EngineHarness::spawn(timeout);
    open(&mut harness).await;
    harness.feed_text(SNAPSHOT).await;
    harness.wait_for_view(|v| v.synced).await;
    harness
}

#[test(tokio::test)]
async fn test_snapshot_synchronizes_the_view() {
    let mut harness = synced_harness(None).await;
    let view = harness.wait_for_view(|v| v.synced).await;
    assert!(!view.running);
    assert!(view.enabled_collectors.contains("polar"));
    assert!(!view.enabled_collectors.contains("buttons"));
    assert_eq!(view.phase, ConnectionPhase::Open);
    assert_eq!(view.phase_label, "Connected");
}

#[test(tokio::test)]
async fn test_enabling_a_collector_pushes_the_full_set() {
    let mut harness = synced_harness(None).await;
    harness
        .act(Action::SetEnabled { collector: "buttons".into(), enabled: true })
        .await;
    let command = harness.next_command().await;
    assert_eq!(command["command"], "set_collectors");
    let mut collectors: Vec<String> = serde_json::from_value(command["collectors"].clone()).unwrap();
    collectors.sort();
    assert_eq!(collectors, vec!["buttons".to_string(), "polar".to_string()]);
}

#[test(tokio::test)]
async fn test_start_round_trip() {
    let mut harness = synced_harness(None).await;
    harness.act(Action::Start { project: Some("proj-1".into()) }).await;
    assert_eq!(
        harness.next_command().await,
        json!({"command": "start", "project": "proj-1"})
    );
    harness.wait_for_view(|v| v.transitioning).await;

    harness.feed_text(r#"{"command":"start","result":true}"#).await;
    let view = harness.wait_for_view(|v| !v.transitioning).await;
    assert!(view.running);
}

#[test(tokio::test)]
async fn test_rejections_are_surfaced_as_notices() {
    let mut harness = synced_harness(None).await;
    harness
        .feed_text(r#"{"command":"set_collectors","result":false,"message":"Cannot set collectors while running an experiment!"}"#)
        .await;
    let notice = tokio::time::timeout(Duration::from_secs(1), harness.notice_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        notice,
        Notice::RemoteRejection {
            command: "set_collectors".into(),
            message: "Cannot set collectors while running an experiment!".into(),
        }
    );
    assert!(harness.view_rx.borrow().synced, "Rejections do not touch sync state");
}

#[test(tokio::test)]
async fn test_transition_times_out_without_answer() {
    tokio::time::pause();
    let mut harness = synced_harness(Some(Duration::from_secs(10))).await;
    harness.act(Action::Stop).await;
    assert_eq!(harness.next_command().await, json!({"command": "stop"}));
    harness.wait_for_view(|v| v.transitioning).await;

    tokio::time::advance(Duration::from_secs(11)).await;

    let notice = tokio::time::timeout(Duration::from_secs(1), harness.notice_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notice, Notice::TransitionTimedOut);
    let view = harness.wait_for_view(|v| !v.transitioning).await;
    assert!(!view.running, "A timed-out transition does not flip running");
}

#[test(tokio::test)]
async fn test_sends_while_closed_are_dropped() {
    let mut harness = synced_harness(None).await;
    harness.feed(TransportEvent::Phase(ConnectionPhase::Closing)).await;
    harness.feed(TransportEvent::Phase(ConnectionPhase::Closed)).await;
    let view = harness.wait_for_view(|v| v.phase == ConnectionPhase::Closed).await;
    assert_eq!(view.phase_label, "Not Connected");
    harness.act(Action::Apply).await;

    let notice = tokio::time::timeout(Duration::from_secs(1), harness.notice_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notice, Notice::TransportUnavailable { command: "set_settings".into() });
    assert!(harness.command_rx.try_recv().is_err());

    // Reconnecting resynchronizes everything.
    harness.feed(TransportEvent::Phase(ConnectionPhase::Connecting)).await;
    harness.feed(TransportEvent::Phase(ConnectionPhase::Open)).await;
    assert_eq!(harness.next_command().await["command"], "get_state");
    assert_eq!(harness.next_command().await["command"], "set_settings");
}

#[test(tokio::test)]
async fn test_telemetry_is_sticky_and_malformed_frames_are_dropped() {
    let mut harness = synced_harness(None).await;
    harness.feed_text(r#"{"component":"polar","data":{"ecg":"512 mV"}}"#).await;
    harness.feed_text("this is not json").await;
    harness.feed_text(r#"{"component":"polar","data":{"acc":"1 mG | 2 mG | 3 mG"}}"#).await;

    let view = harness
        .wait_for_view(|v| v.telemetry.get("polar").is_some_and(|p| p.contains_key("acc")))
        .await;
    assert_eq!(view.telemetry["polar"]["ecg"], "512 mV");
    assert_eq!(view.telemetry["polar"]["acc"], "1 mG | 2 mG | 3 mG");
}
