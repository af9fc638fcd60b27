//! Integration tests for the monitor scheduler loop
//!
//! These tests verify that:
//! - Due monitors are probed and their status written back
//! - The due boundary is inclusive
//! - Store failures abandon a tick without killing the actor
//! - Probe panics become DOWN verdicts

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Duration;
use monitor_schedule::actors::{DEFAULT_SCHEDULER_INTERVAL, SchedulerHandle};
use monitor_schedule::clock::ManualClock;
use monitor_schedule::model::{Monitor, Status};
use monitor_schedule::monitors::{DEFAULT_PROBE_TIMEOUT, HttpProber, ProbeOutcome, Prober};
use monitor_schedule::storage::{MemoryBackend, StorageBackend, StorageError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{
    FlakyStore, PanickingProber, StaticProber, create_http_monitor, start_time,
};

#[tokio::test]
async fn test_never_checked_monitor_is_probed_over_http() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    store
        .upsert_monitor(&create_http_monitor(
            "web",
            &format!("{}/health", mock_server.uri()),
        ))
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(start_time()));
    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap()),
        clock,
        DEFAULT_SCHEDULER_INTERVAL,
    );

    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.up, 1);
    assert_eq!(report.probe_failures, 0);

    let monitor = store.get_monitor("web").await.unwrap().unwrap();
    assert_eq!(monitor.status, Status::Up);
    assert_eq!(monitor.check_time, Some(start_time()));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_due_boundary_is_inclusive() {
    let store = Arc::new(MemoryBackend::new());
    let mut monitor = create_http_monitor("boundary", "http://unused");
    monitor.frequency = 5;
    monitor.check_time = Some(start_time());
    store.upsert_monitor(&monitor).await.unwrap();

    let clock = Arc::new(ManualClock::new(start_time()));
    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(StaticProber(Status::Up)),
        clock.clone(),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    clock.advance(Duration::minutes(5) - Duration::seconds(1));
    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 0);

    clock.advance(Duration::seconds(1));
    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 1);

    let stored = store.get_monitor("boundary").await.unwrap().unwrap();
    assert_eq!(stored.check_time, Some(start_time() + Duration::minutes(5)));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_read_abandons_tick_but_actor_survives() {
    let store = FlakyStore::new();
    store
        .upsert_monitor(&create_http_monitor("db", "http://unused"))
        .await
        .unwrap();

    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(StaticProber(Status::Up)),
        Arc::new(ManualClock::new(start_time())),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    store.fail_reads(true);
    let err = handle.tick_now().await.unwrap_err();
    assert_matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::QueryFailed(_))
    );

    store.fail_reads(false);
    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_write_back_is_isolated() {
    let store = FlakyStore::new();
    for name in ["a", "b", "c"] {
        store
            .upsert_monitor(&create_http_monitor(name, "http://unused"))
            .await
            .unwrap();
    }

    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(StaticProber(Status::Up)),
        Arc::new(ManualClock::new(start_time())),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    store.fail_writes(true);
    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.write_failures, 3);

    // Nothing was recorded, so everything is still due
    store.fail_writes(false);
    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.write_failures, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_panicking_prober_yields_down_and_advances_check_time() {
    let store = Arc::new(MemoryBackend::new());
    let mut monitor = create_http_monitor("volatile", "http://unused");
    monitor.status = Status::Up;
    monitor.check_time = Some(start_time() - Duration::hours(1));
    store.upsert_monitor(&monitor).await.unwrap();

    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(PanickingProber),
        Arc::new(ManualClock::new(start_time())),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.down, 1);
    assert_eq!(report.probe_failures, 1);

    let stored = store.get_monitor("volatile").await.unwrap().unwrap();
    assert_eq!(stored.status, Status::Down);
    assert_eq!(stored.check_time, Some(start_time()));

    // Still running after the panic
    assert!(handle.tick_now().await.is_ok());
    handle.shutdown().await;
}

/// Edits the monitor in the store while its probe is in flight
struct EditingProber {
    store: Arc<MemoryBackend>,
}

#[async_trait]
impl Prober for EditingProber {
    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        let mut edited = monitor.clone();
        edited.connection = "http://new-address".to_string();
        edited.description = "changed by a user".to_string();
        self.store.upsert_monitor(&edited).await.unwrap();
        ProbeOutcome::up(Some(200))
    }
}

/// Deletes the monitor while its probe is in flight
struct DeletingProber {
    store: Arc<MemoryBackend>,
}

#[async_trait]
impl Prober for DeletingProber {
    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        self.store.delete_monitor(&monitor.alert_name).await.unwrap();
        ProbeOutcome::up(Some(200))
    }
}

#[tokio::test]
async fn test_write_back_keeps_edits_made_during_probe() {
    let store = Arc::new(MemoryBackend::new());
    store
        .upsert_monitor(&create_http_monitor("edited", "http://unused"))
        .await
        .unwrap();

    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(EditingProber {
            store: store.clone(),
        }),
        Arc::new(ManualClock::new(start_time())),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    handle.tick_now().await.unwrap();

    let stored = store.get_monitor("edited").await.unwrap().unwrap();
    assert_eq!(stored.connection, "http://new-address");
    assert_eq!(stored.description, "changed by a user");
    assert_eq!(stored.status, Status::Up);
    assert_eq!(stored.check_time, Some(start_time()));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_monitor_deleted_during_probe_is_not_recreated() {
    let store = Arc::new(MemoryBackend::new());
    store
        .upsert_monitor(&create_http_monitor("gone", "http://unused"))
        .await
        .unwrap();

    let handle = SchedulerHandle::spawn(
        store.clone(),
        Arc::new(DeletingProber {
            store: store.clone(),
        }),
        Arc::new(ManualClock::new(start_time())),
        DEFAULT_SCHEDULER_INTERVAL,
    );

    let report = handle.tick_now().await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.write_failures, 0);
    assert!(store.get_monitor("gone").await.unwrap().is_none());

    handle.shutdown().await;
}
