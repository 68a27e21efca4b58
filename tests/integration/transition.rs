//! tests/integration/transition.rs
//!
//! E2E tests for start/stop answers that never arrive.

use crate::common::{
    device::{DeviceState, FakeDevice},
    harness::{test_config, ConsoleHarness},
};
use collector_console::domain::{Action, ConnectionPhase, Notice};
use test_log::test;

fn silent_device() -> DeviceState {
    DeviceState {
        swallow_transitions: true,
        ..DeviceState::default()
    }
}

#[test(tokio::test)]
async fn test_unanswered_start_times_out_back_to_idle() {
    let device = FakeDevice::spawn_with(silent_device()).await.unwrap();
    let mut console = ConsoleHarness::spawn(&test_config(device.url())).unwrap();
    console.wait_for_view(|v| v.synced).await.unwrap();

    console.act(Action::Start { project: Some("ride-1".into()) }).await.unwrap();
    console.wait_for_view(|v| v.transitioning).await.unwrap();
    device.wait_for_commands("start", 1).await.unwrap();

    assert_eq!(console.next_notice().await.unwrap(), Notice::TransitionTimedOut);
    let view = console.wait_for_view(|v| !v.transitioning).await.unwrap();
    assert!(!view.running);

    // Once idle again, a new transition is accepted and answered.
    device.state.lock().unwrap().swallow_transitions = false;
    console.act(Action::Start { project: Some("ride-2".into()) }).await.unwrap();
    console.wait_for_view(|v| v.running && !v.transitioning).await.unwrap();
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_pending_transition_survives_reconnect_until_deadline() {
    let device = FakeDevice::spawn_with(silent_device()).await.unwrap();
    let mut config = test_config(device.url());
    config.transition_timeout_ms = Some(1_500);
    let mut console = ConsoleHarness::spawn(&config).unwrap();
    console.wait_for_view(|v| v.synced).await.unwrap();

    console.act(Action::Start { project: Some("ride-1".into()) }).await.unwrap();
    console.wait_for_view(|v| v.transitioning).await.unwrap();
    device.wait_for_commands("start", 1).await.unwrap();

    device.kick_clients();
    device.wait_for_commands("get_state", 2).await.unwrap();
    let view = console
        .wait_for_view(|v| v.phase == ConnectionPhase::Open && v.synced)
        .await
        .unwrap();
    assert!(view.transitioning);

    // A second request is still refused: nothing new reaches the device.
    console.act(Action::Stop).await.unwrap();

    assert_eq!(console.next_notice().await.unwrap(), Notice::TransitionTimedOut);
    console.wait_for_view(|v| !v.transitioning).await.unwrap();
    assert!(device.received_named("stop").is_empty());
    assert_eq!(device.received_named("start").len(), 1);
}
