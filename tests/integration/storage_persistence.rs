//! Integration tests for the SQLite backend
//!
//! These tests verify that:
//! - Records survive closing and reopening the database
//! - Add-only inserts are rejected on duplicate keys
//! - Schedule batches behave the same as in memory
//! - Sub-second schedule times are stored without loss

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};
use monitor_schedule::facade::RecordFacade;
use monitor_schedule::model::Status;
use monitor_schedule::monitors::qualifying_entries;
use monitor_schedule::storage::sqlite::SqliteBackend;
use monitor_schedule::storage::{Collection, ScheduleWriteMode, StorageBackend, StorageError};
use pretty_assertions::assert_eq;

use crate::helpers::{create_http_monitor, create_test_service, start_time};

#[tokio::test]
async fn test_records_survive_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("persist.db");

    let mut monitor = create_http_monitor("persisted", "http://persisted/health");
    monitor.status = Status::Up;
    monitor.check_time = Some(start_time());
    let service = create_test_service("persisted", Status::Up);

    {
        let backend = SqliteBackend::new(&db_path).await.unwrap();
        backend.insert_monitor(&monitor).await.unwrap();
        backend.insert_service(&service).await.unwrap();

        let entries = qualifying_entries(&[monitor.clone()], &[service.clone()], start_time());
        backend
            .write_schedule(entries, ScheduleWriteMode::Upsert)
            .await
            .unwrap();

        backend.close().await.unwrap();
    }

    let backend = SqliteBackend::new(&db_path).await.unwrap();
    assert_eq!(backend.get_monitor("persisted").await.unwrap(), Some(monitor));
    assert_eq!(backend.get_service("persisted").await.unwrap(), Some(service));

    let entry = backend.get_schedule_entry("persisted").await.unwrap().unwrap();
    assert_eq!(entry.last_check_time, start_time());
    assert_eq!(entry.host_name, "persisted-host");
}

#[tokio::test]
async fn test_duplicate_service_insert_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::new(temp_dir.path().join("dup.db")).await.unwrap();

    let original = create_test_service("db", Status::Up);
    backend.insert_service(&original).await.unwrap();

    let mut duplicate = original.clone();
    duplicate.host_name = "other".to_string();
    let err = backend.insert_service(&duplicate).await.unwrap_err();

    assert_matches!(
        err,
        StorageError::DuplicateKey { collection: Collection::Services, ref key } if key == "db"
    );
    assert_eq!(backend.get_service("db").await.unwrap(), Some(original));
}

#[tokio::test]
async fn test_record_check_on_sqlite() {
    let temp_dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::new(temp_dir.path().join("check.db")).await.unwrap();

    backend
        .insert_monitor(&create_http_monitor("web", "http://web"))
        .await
        .unwrap();

    let checked_at = start_time() + Duration::milliseconds(1_234);
    assert!(backend.record_check("web", Status::Up, checked_at).await.unwrap());

    let stored = backend.get_monitor("web").await.unwrap().unwrap();
    assert_eq!(stored.status, Status::Up);
    assert_eq!(stored.check_time, Some(checked_at));
}

#[tokio::test]
async fn test_schedule_upsert_keeps_unlisted_entries() {
    let temp_dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::new(temp_dir.path().join("schedule.db")).await.unwrap();

    let mut monitors = Vec::new();
    let mut services = Vec::new();
    for name in ["a", "b"] {
        let mut monitor = create_http_monitor(name, "http://unused");
        monitor.status = Status::Up;
        monitors.push(monitor);
        services.push(create_test_service(name, Status::Up));
    }

    let entries = qualifying_entries(&monitors, &services, start_time());
    backend
        .write_schedule(entries.clone(), ScheduleWriteMode::Upsert)
        .await
        .unwrap();

    let summary = backend
        .write_schedule(entries[..1].to_vec(), ScheduleWriteMode::Upsert)
        .await
        .unwrap();
    assert_eq!(summary.pruned, 0);
    assert_eq!(backend.list_schedule().await.unwrap().len(), 2);

    let stats = backend.get_stats().await.unwrap();
    assert_eq!(stats.schedule_entries, 2);
}

#[tokio::test]
async fn test_fractional_schedule_time_survives_import_and_export() {
    let temp_dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::new(temp_dir.path().join("fraction.db")).await.unwrap();
    let facade = RecordFacade::new(Arc::new(backend));

    let input = "\
AlertName,Connection,ServiceType,HealthCheck,Response,Description,Status,ScheduleTime,Frequency
precise,http://precise,HTTP,GET,200, keeps spaces ,UP,2024-01-01T06:00:00.250,5
";
    let report = facade.import_monitors_csv(input.as_bytes()).await.unwrap();
    assert_eq!(report.success_count, 1);

    let stored = facade.get_monitor("precise").await.unwrap().unwrap();
    assert_eq!(
        stored.schedule_time,
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(6, 0, 0, 250)
            .unwrap()
    );
    assert_eq!(stored.description, " keeps spaces ");

    let csv = facade.export_monitors_csv(None).await.unwrap();
    assert!(csv.contains("2024-01-01T06:00:00.250"));
}
