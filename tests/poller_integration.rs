//! End-to-end poller tests: real HTTP client, mock backend, real clock.
//!
//! Intervals are short so a full suspend cycle fits in well under a second.

mod common;

use printwatch::client::HttpPrinterApi;
use printwatch::poller::{PollState, PollerEvent, TelemetryPoller};
use printwatch::registry::{NewPrinter, PrinterId};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERVAL_MS: u64 = 100;

fn poller_for(server: &MockServer) -> TelemetryPoller {
    let api = HttpPrinterApi::new(&common::backend_config(server)).unwrap();
    TelemetryPoller::new(Arc::new(api), common::fast_polling(INTERVAL_MS))
}

#[tokio::test]
async fn test_live_printer_is_polled_on_interval() {
    let server = MockServer::start().await;
    common::mount_printers(&server, vec![common::printer_json(1, "Voron")]).await;
    common::mount_state(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(common::snapshot_json(214.0)),
    )
    .await;
    common::mount_history(&server, 1, 3).await;

    let poller = poller_for(&server);
    poller.load_devices(Some(&PrinterId::from("1"))).await;

    let view = poller.view();
    assert_eq!(view.status.label(), "Connected");
    assert_eq!(view.history.len(), 3);
    assert_eq!(view.snapshot.unwrap().nozzle_temp, Some(214.0));

    tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 3 + 50)).await;
    assert!(common::request_count(&server, "/api/printers/1/state").await >= 3);
    assert_eq!(poller.state(), PollState::Polling);
    assert_eq!(poller.consecutive_failures(), 0);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_printer_suspends_after_three_polls() {
    let server = MockServer::start().await;
    common::mount_printers(&server, vec![common::printer_json(1, "Voron")]).await;
    common::mount_state(&server, 1, ResponseTemplate::new(503)).await;
    common::mount_history(&server, 1, 0).await;

    let poller = poller_for(&server);
    poller.load_devices(Some(&PrinterId::from("1"))).await;

    tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 6)).await;
    assert_eq!(poller.state(), PollState::Suspended);
    assert_eq!(poller.consecutive_failures(), 3);
    assert_eq!(
        common::request_count(&server, "/api/printers/1/state").await,
        3
    );

    // Never had data, so not stale
    let status = poller.device_status(&PrinterId::from("1"));
    assert!(!status.has_data);
    assert!(!status.is_stale);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_stale_then_retry_recovers() {
    let server = MockServer::start().await;
    common::mount_printers(&server, vec![common::printer_json(4, "Ender")]).await;
    common::mount_history(&server, 4, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/printers/4/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::snapshot_json(200.0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_state(&server, 4, ResponseTemplate::new(502)).await;

    let poller = poller_for(&server);
    let mut events = poller.subscribe();
    poller.load_devices(Some(&PrinterId::from("4"))).await;
    assert_eq!(poller.view().status.label(), "Connected");

    tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 6)).await;
    let view = poller.view();
    assert_eq!(view.state, PollState::Suspended);
    assert_eq!(view.status.label(), "Connection lost");
    assert!(view.status.stale_since.is_some());
    assert_eq!(view.snapshot.unwrap().nozzle_temp, Some(200.0));

    let mut stale_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PollerEvent::StaleDetected { .. }) {
            stale_events += 1;
        }
    }
    assert_eq!(stale_events, 1);

    server.reset().await;
    common::mount_history(&server, 4, 1).await;
    common::mount_state(
        &server,
        4,
        ResponseTemplate::new(200).set_body_json(common::snapshot_json(205.0)),
    )
    .await;

    poller.retry().await.unwrap();
    let view = poller.view();
    assert_eq!(view.state, PollState::Polling);
    assert_eq!(view.status.label(), "Connected");
    assert_eq!(view.snapshot.unwrap().nozzle_temp, Some(205.0));

    poller.shutdown().await;
}

#[tokio::test]
async fn test_command_resumes_suspended_polling() {
    let server = MockServer::start().await;
    common::mount_printers(&server, vec![common::printer_json(2, "Voron")]).await;
    common::mount_history(&server, 2, 0).await;
    common::mount_state(&server, 2, ResponseTemplate::new(200).set_body_string("null")).await;
    Mock::given(method("POST"))
        .and(path("/api/printers/2/command"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let poller = poller_for(&server);
    poller.load_devices(Some(&PrinterId::from("2"))).await;
    tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 6)).await;
    assert_eq!(poller.state(), PollState::Suspended);
    let before = common::request_count(&server, "/api/printers/2/state").await;

    poller.send_command("PAUSE").await.unwrap();
    assert_eq!(poller.consecutive_failures(), 0);
    assert_eq!(poller.state(), PollState::Polling);
    assert_eq!(
        common::request_count(&server, "/api/printers/2/state").await,
        before + 1
    );

    poller.shutdown().await;
}

#[tokio::test]
async fn test_create_device_selects_created_printer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/printers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::printer_json(12, "Bambu")))
        .mount(&server)
        .await;
    common::mount_printers(
        &server,
        vec![
            common::printer_json(1, "Voron"),
            common::printer_json(12, "Bambu"),
        ],
    )
    .await;
    common::mount_state(
        &server,
        12,
        ResponseTemplate::new(200).set_body_json(json!({ "state": "standby" })),
    )
    .await;
    common::mount_history(&server, 12, 0).await;

    let poller = poller_for(&server);
    let created = poller
        .create_device(NewPrinter {
            name: "Bambu".to_string(),
            ip_address: "192.168.1.50".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id, PrinterId::from("12"));
    assert_eq!(poller.registry().selected_id(), Some(PrinterId::from("12")));
    assert_eq!(poller.view().status.label(), "Connected");

    poller.shutdown().await;
}
