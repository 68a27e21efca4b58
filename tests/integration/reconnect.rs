//! tests/integration/reconnect.rs
//!
//! E2E tests for link loss: every reconnect must resynchronize state and
//! re-apply the device configuration.

use crate::common::{
    device::FakeDevice,
    harness::{get_ephemeral_addr, test_config, ConsoleHarness},
};
use collector_console::{
    config::Config,
    domain::{Action, ConnectionPhase},
};
use serde_json::json;
use std::time::Duration;
use test_log::test;

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_reconnect_resynchronizes_and_reapplies_settings() {
    let device = FakeDevice::spawn().await.unwrap();
    let mut console = ConsoleHarness::spawn(&test_config(device.url())).unwrap();
    console.wait_for_view(|v| v.synced).await.unwrap();

    console
        .act(Action::SetConfigValue { value: "AA:BB:CC:DD:EE:FF".into() })
        .await
        .unwrap();
    console.wait_for_view(|v| v.config_dirty).await.unwrap();

    device.kick_clients();

    // The edit was never applied by hand, but the reconnect pushes it anyway.
    let settings = device.wait_for_commands("set_settings", 2).await.unwrap();
    assert_eq!(settings[1], json!({"command": "set_settings", "config": {"mac": "AA:BB:CC:DD:EE:FF"}}));
    assert_eq!(device.wait_for_commands("get_state", 2).await.unwrap().len(), 2);

    let view = console
        .wait_for_view(|v| v.phase == ConnectionPhase::Open && !v.config_dirty)
        .await
        .unwrap();
    assert!(view.synced);
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_state_changed_while_away_is_adopted() {
    let device = FakeDevice::spawn().await.unwrap();
    let mut console = ConsoleHarness::spawn(&test_config(device.url())).unwrap();
    console.wait_for_view(|v| v.synced && !v.running).await.unwrap();

    {
        let mut state = device.state.lock().unwrap();
        state.running = true;
        state.collectors.insert("buttons".to_string());
    }
    device.kick_clients();

    let view = console
        .wait_for_view(|v| v.running && v.enabled_collectors.contains("buttons"))
        .await
        .unwrap();
    assert!(view.synced);
}

#[test(tokio::test)]
async fn test_unreachable_device_gives_up_after_retry_limit() {
    let addr = get_ephemeral_addr().unwrap();
    let config = Config {
        reconnect_max_retries: Some(2),
        ..test_config(format!("ws://{addr}"))
    };
    let mut console = ConsoleHarness::spawn(&config).unwrap();

    let view = console
        .wait_for_view(|v| v.phase == ConnectionPhase::Closed)
        .await
        .unwrap();
    assert!(!view.synced);

    // Nothing can be sent while closed.
    console.act(Action::Stop).await.unwrap();
    let notice = console.next_notice().await.unwrap();
    assert!(matches!(
        notice,
        collector_console::domain::Notice::TransportUnavailable { .. }
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!console.view_rx.borrow().synced);
}
