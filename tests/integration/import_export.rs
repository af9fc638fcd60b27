//! Integration tests for CSV import and export through the record facade

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use monitor_schedule::facade::{ImportError, RecordError, RecordFacade, STORAGE_ERROR_MESSAGE};
use monitor_schedule::model::{Monitor, ServiceType, Status};
use monitor_schedule::storage::MemoryBackend;
use pretty_assertions::assert_eq;

use crate::helpers::{FlakyStore, create_http_monitor, create_test_service};

fn facade() -> RecordFacade {
    RecordFacade::new(Arc::new(MemoryBackend::new()))
}

const THREE_ROWS_WITH_BAD_FREQUENCY: &str = "\
AlertName,Connection,ServiceType,HealthCheck,Response,Description,Status,ScheduleTime,Frequency
alpha,http://alpha/health,HTTP,GET,200,Alpha service,UP,2024-01-01T06:00:00,5
beta,http://beta/health,HTTP,GET,200,Beta service,DOWN,2024-01-01T06:00:00,abc
gamma,gamma.internal:5432,TCP,connect,ok,Gamma db,DOWN,2024-01-02 07:30,
";

#[tokio::test]
async fn test_import_skips_invalid_row_and_keeps_the_rest() {
    let facade = facade();

    let report = facade
        .import_monitors_csv(THREE_ROWS_WITH_BAD_FREQUENCY.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].alert_name.as_deref(), Some("beta"));
    assert!(report.errors[0].message.contains("abc"));

    let alpha = facade.get_monitor("alpha").await.unwrap().unwrap();
    assert_eq!(
        alpha,
        Monitor {
            alert_name: "alpha".to_string(),
            connection: "http://alpha/health".to_string(),
            service_type: ServiceType::Http,
            health_check: "GET".to_string(),
            response: "200".to_string(),
            description: "Alpha service".to_string(),
            status: Status::Up,
            check_time: None,
            schedule_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            frequency: 5,
        }
    );

    let gamma = facade.get_monitor("gamma").await.unwrap().unwrap();
    assert_eq!(gamma.service_type, ServiceType::Tcp);
    assert_eq!(gamma.frequency, 1);
    assert_eq!(
        gamma.schedule_time,
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    );

    assert!(facade.get_monitor("beta").await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_hides_store_failure_details() {
    let store = FlakyStore::new();
    let facade = RecordFacade::new(store.clone());
    store.fail_writes(true);

    let report = facade
        .import_monitors_csv(THREE_ROWS_WITH_BAD_FREQUENCY.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 3);
    assert_eq!(report.errors[0].message, STORAGE_ERROR_MESSAGE);
    assert_eq!(report.errors[0].alert_name.as_deref(), Some("alpha"));
    assert!(report.errors[1].message.contains("abc"));
    assert_eq!(report.errors[2].message, STORAGE_ERROR_MESSAGE);

    let body = serde_json::to_string(&report).unwrap();
    assert!(!body.contains("injected"));

    store.fail_writes(false);
    let report = facade
        .import_monitors_csv(THREE_ROWS_WITH_BAD_FREQUENCY.as_bytes())
        .await
        .unwrap();
    assert_eq!(report.success_count, 2);
}

#[tokio::test]
async fn test_import_rejects_bad_schedule_time_and_frequency() {
    let input = "\
AlertName,Connection,ServiceType,HealthCheck,Response,Description,Status,ScheduleTime,Frequency
no-time,http://x,HTTP,GET,200,,UP,,5
zero,http://x,HTTP,GET,200,,UP,2024-01-01,0
garbage,http://x,HTTP,GET,200,,UP,tomorrow-ish,5
";

    let report = facade().import_monitors_csv(input.as_bytes()).await.unwrap();

    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 3);
    let rows: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_import_missing_columns_fails_whole_file() {
    let input = "AlertName,Connection,ServiceType\nweb,http://web,HTTP\n";

    let err = facade()
        .import_monitors_csv(input.as_bytes())
        .await
        .unwrap_err();

    assert_matches!(err, ImportError::MissingColumns(ref columns) if columns.len() == 6);
}

#[tokio::test]
async fn test_export_then_import_preserves_monitors() {
    let source = facade();

    let mut checked = create_http_monitor("checked", "http://checked/health");
    checked.status = Status::Up;
    checked.check_time = Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 15, 0).unwrap());
    checked.description = "has, a comma and \"quotes\"".to_string();
    source.save_monitor(&checked).await.unwrap();
    source
        .save_monitor(&create_http_monitor("unchecked", "http://unchecked"))
        .await
        .unwrap();

    let csv = source.export_monitors_csv(None).await.unwrap();

    let target = facade();
    let report = target.import_monitors_csv(csv.as_bytes()).await.unwrap();
    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 0);

    assert_eq!(
        target.list_monitors().await.unwrap(),
        source.list_monitors().await.unwrap()
    );
}

#[tokio::test]
async fn test_filtered_export() {
    let facade = facade();
    for name in ["a", "b", "c"] {
        facade
            .save_service(&create_test_service(name, Status::Up))
            .await
            .unwrap();
    }

    let names = vec!["a".to_string(), "c".to_string()];
    let csv = facade.export_services_csv(Some(&names)).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines,
        vec![
            "AlertName,ServiceType,HostName,CheckStatus",
            "a,HTTP,a-host,UP",
            "c,HTTP,c-host,UP",
        ]
    );

    let missing = vec!["zzz".to_string()];
    assert_matches!(
        facade.export_monitors_csv(Some(&missing)).await,
        Err(RecordError::NothingToExport)
    );
}
