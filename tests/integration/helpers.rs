//! Helper functions for integration tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use monitor_schedule::model::{Monitor, ScheduleEntry, Service, ServiceType, Status};
use monitor_schedule::monitors::{ProbeFailure, ProbeOutcome, Prober};
use monitor_schedule::storage::{
    HealthStatus, MemoryBackend, ScheduleWriteMode, ScheduleWriteSummary, StorageBackend,
    StorageError, StorageResult, StoreStats,
};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn create_test_monitor(name: &str, service_type: ServiceType, connection: &str) -> Monitor {
    Monitor {
        alert_name: name.to_string(),
        connection: connection.to_string(),
        service_type,
        health_check: "GET /health".to_string(),
        response: "200".to_string(),
        description: format!("Test monitor {name}"),
        status: Status::Down,
        check_time: None,
        schedule_time: NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
        frequency: 5,
    }
}

pub fn create_http_monitor(name: &str, url: &str) -> Monitor {
    create_test_monitor(name, ServiceType::Http, url)
}

pub fn create_test_service(name: &str, check_status: Status) -> Service {
    Service {
        alert_name: name.to_string(),
        service_type: ServiceType::Http,
        host_name: format!("{name}-host"),
        check_status,
    }
}

/// Prober that always returns the same verdict without touching the network
pub struct StaticProber(pub Status);

#[async_trait]
impl Prober for StaticProber {
    async fn probe(&self, _monitor: &Monitor) -> ProbeOutcome {
        match self.0 {
            Status::Up => ProbeOutcome::up(Some(200)),
            Status::Down => ProbeOutcome::down(ProbeFailure::Connect("static".to_string())),
        }
    }
}

/// Prober that panics on every call
pub struct PanickingProber;

#[async_trait]
impl Prober for PanickingProber {
    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        panic!("prober exploded on {}", monitor.alert_name)
    }
}

/// In-memory store whose reads or writes can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryBackend,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FlakyStore {
    async fn insert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        self.check_write()?;
        self.inner.insert_monitor(monitor).await
    }

    async fn upsert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        self.check_write()?;
        self.inner.upsert_monitor(monitor).await
    }

    async fn get_monitor(&self, alert_name: &str) -> StorageResult<Option<Monitor>> {
        self.check_read()?;
        self.inner.get_monitor(alert_name).await
    }

    async fn list_monitors(&self) -> StorageResult<Vec<Monitor>> {
        self.check_read()?;
        self.inner.list_monitors().await
    }

    async fn delete_monitor(&self, alert_name: &str) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.delete_monitor(alert_name).await
    }

    async fn record_check(
        &self,
        alert_name: &str,
        status: Status,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.record_check(alert_name, status, checked_at).await
    }

    async fn insert_service(&self, service: &Service) -> StorageResult<()> {
        self.check_write()?;
        self.inner.insert_service(service).await
    }

    async fn upsert_service(&self, service: &Service) -> StorageResult<()> {
        self.check_write()?;
        self.inner.upsert_service(service).await
    }

    async fn get_service(&self, alert_name: &str) -> StorageResult<Option<Service>> {
        self.check_read()?;
        self.inner.get_service(alert_name).await
    }

    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        self.check_read()?;
        self.inner.list_services().await
    }

    async fn monitors_and_services(&self) -> StorageResult<(Vec<Monitor>, Vec<Service>)> {
        self.check_read()?;
        self.inner.monitors_and_services().await
    }

    async fn delete_service(&self, alert_name: &str) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.delete_service(alert_name).await
    }

    async fn write_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        mode: ScheduleWriteMode,
    ) -> StorageResult<ScheduleWriteSummary> {
        self.check_write()?;
        self.inner.write_schedule(entries, mode).await
    }

    async fn get_schedule_entry(&self, alert_name: &str) -> StorageResult<Option<ScheduleEntry>> {
        self.check_read()?;
        self.inner.get_schedule_entry(alert_name).await
    }

    async fn list_schedule(&self) -> StorageResult<Vec<ScheduleEntry>> {
        self.check_read()?;
        self.inner.list_schedule().await
    }

    async fn delete_schedule_entry(&self, alert_name: &str) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.delete_schedule_entry(alert_name).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.check_read()?;
        self.inner.health_check().await
    }

    async fn get_stats(&self) -> StorageResult<StoreStats> {
        self.check_read()?;
        self.inner.get_stats().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
