//! Query, export and import over the record store
//!
//! This is the data-entry side of the system. It never touches schedule
//! entries except to read them, and it only writes monitors and services.

pub mod codec;

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::model::{Monitor, ScheduleEntry, Service};
use crate::storage::{HealthStatus, StorageBackend, StorageError, StoreStats};
use crate::validation::ValidationError;

pub use codec::{ImportError, ImportReport, RowError};

pub type RecordResult<T> = Result<T, RecordError>;

/// Message reported for every store failure; details stay in the log
pub const STORAGE_ERROR_MESSAGE: &str = "internal storage error";

/// Failure of a single facade request
#[derive(Debug)]
pub enum RecordError {
    Validation(ValidationError),
    Storage(StorageError),

    /// A name filter matched nothing
    NothingToExport,

    /// Encoding the export failed
    Csv(String),
}

impl RecordError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, RecordError::Storage(e) if e.is_duplicate_key())
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Validation(e) => write!(f, "{}", e),
            RecordError::Storage(e) => write!(f, "{}", e),
            RecordError::NothingToExport => write!(f, "no records to export"),
            RecordError::Csv(msg) => write!(f, "CSV encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Validation(e) => Some(e),
            RecordError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for RecordError {
    fn from(err: ValidationError) -> Self {
        RecordError::Validation(err)
    }
}

impl From<StorageError> for RecordError {
    fn from(err: StorageError) -> Self {
        RecordError::Storage(err)
    }
}

impl From<csv::Error> for RecordError {
    fn from(err: csv::Error) -> Self {
        RecordError::Csv(err.to_string())
    }
}

/// Keep only records whose alert name is listed; no list (or an empty one) keeps all
fn filter_by_name<T>(
    records: Vec<T>,
    names: Option<&[String]>,
    alert_name: impl Fn(&T) -> &str,
) -> RecordResult<Vec<T>> {
    match names {
        Some(names) if !names.is_empty() => {
            let selected: Vec<T> = records
                .into_iter()
                .filter(|record| names.iter().any(|name| name.as_str() == alert_name(record)))
                .collect();
            if selected.is_empty() {
                return Err(RecordError::NothingToExport);
            }
            Ok(selected)
        }
        _ => Ok(records),
    }
}

/// Record-level operations shared by the HTTP facade and embedders
#[derive(Clone)]
pub struct RecordFacade {
    store: Arc<dyn StorageBackend>,
}

impl RecordFacade {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn StorageBackend> {
        &self.store
    }

    pub async fn health(&self) -> RecordResult<HealthStatus> {
        Ok(self.store.health_check().await?)
    }

    pub async fn stats(&self) -> RecordResult<StoreStats> {
        Ok(self.store.get_stats().await?)
    }

    // ========================================================================
    // Monitors
    // ========================================================================

    pub async fn list_monitors(&self) -> RecordResult<Vec<Monitor>> {
        Ok(self.store.list_monitors().await?)
    }

    pub async fn get_monitor(&self, alert_name: &str) -> RecordResult<Option<Monitor>> {
        Ok(self.store.get_monitor(alert_name).await?)
    }

    /// Add-only create; an existing alert name is a duplicate key error
    #[instrument(skip(self, monitor), fields(alert_name = %monitor.alert_name))]
    pub async fn add_monitor(&self, monitor: &Monitor) -> RecordResult<()> {
        monitor.validate()?;
        self.store.insert_monitor(monitor).await?;
        info!("monitor added");
        Ok(())
    }

    /// Create or fully replace
    #[instrument(skip(self, monitor), fields(alert_name = %monitor.alert_name))]
    pub async fn save_monitor(&self, monitor: &Monitor) -> RecordResult<()> {
        monitor.validate()?;
        self.store.upsert_monitor(monitor).await?;
        debug!("monitor saved");
        Ok(())
    }

    pub async fn remove_monitor(&self, alert_name: &str) -> RecordResult<bool> {
        Ok(self.store.delete_monitor(alert_name).await?)
    }

    pub async fn export_monitors_csv(&self, names: Option<&[String]>) -> RecordResult<String> {
        let monitors = filter_by_name(self.store.list_monitors().await?, names, |m| {
            m.alert_name.as_str()
        })?;
        Ok(codec::monitors_to_csv(&monitors)?)
    }

    /// Upsert every valid row; invalid rows are skipped and reported
    #[instrument(skip_all)]
    pub async fn import_monitors_csv<R: Read>(&self, reader: R) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        for decoded in codec::decode_monitors(reader)? {
            let outcome = match decoded.record {
                Ok(monitor) => self.store.upsert_monitor(&monitor).await.map_err(|e| {
                    warn!(row = decoded.row, "failed to store monitor row: {}", e);
                    STORAGE_ERROR_MESSAGE.to_string()
                }),
                Err(message) => Err(message),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(message) => {
                    warn!(row = decoded.row, "monitor row rejected: {}", message);
                    report.record_error(decoded.row, decoded.alert_name, message);
                }
            }
        }

        info!(
            "monitor import: {} imported, {} rejected",
            report.success_count, report.error_count
        );
        Ok(report)
    }

    // ========================================================================
    // Services
    // ========================================================================

    pub async fn list_services(&self) -> RecordResult<Vec<Service>> {
        Ok(self.store.list_services().await?)
    }

    pub async fn get_service(&self, alert_name: &str) -> RecordResult<Option<Service>> {
        Ok(self.store.get_service(alert_name).await?)
    }

    #[instrument(skip(self, service), fields(alert_name = %service.alert_name))]
    pub async fn add_service(&self, service: &Service) -> RecordResult<()> {
        service.validate()?;
        self.store.insert_service(service).await?;
        info!("service added");
        Ok(())
    }

    #[instrument(skip(self, service), fields(alert_name = %service.alert_name))]
    pub async fn save_service(&self, service: &Service) -> RecordResult<()> {
        service.validate()?;
        self.store.upsert_service(service).await?;
        Ok(())
    }

    pub async fn remove_service(&self, alert_name: &str) -> RecordResult<bool> {
        Ok(self.store.delete_service(alert_name).await?)
    }

    pub async fn export_services_csv(&self, names: Option<&[String]>) -> RecordResult<String> {
        let services = filter_by_name(self.store.list_services().await?, names, |s| {
            s.alert_name.as_str()
        })?;
        Ok(codec::services_to_csv(&services)?)
    }

    #[instrument(skip_all)]
    pub async fn import_services_csv<R: Read>(&self, reader: R) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        for decoded in codec::decode_services(reader)? {
            let outcome = match decoded.record {
                Ok(service) => self.store.upsert_service(&service).await.map_err(|e| {
                    warn!(row = decoded.row, "failed to store service row: {}", e);
                    STORAGE_ERROR_MESSAGE.to_string()
                }),
                Err(message) => Err(message),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(message) => {
                    warn!(row = decoded.row, "service row rejected: {}", message);
                    report.record_error(decoded.row, decoded.alert_name, message);
                }
            }
        }

        info!(
            "service import: {} imported, {} rejected",
            report.success_count, report.error_count
        );
        Ok(report)
    }

    // ========================================================================
    // Schedule (read-only)
    // ========================================================================

    pub async fn list_schedule(&self) -> RecordResult<Vec<ScheduleEntry>> {
        Ok(self.store.list_schedule().await?)
    }

    pub async fn export_schedule_csv(&self, names: Option<&[String]>) -> RecordResult<String> {
        let entries = filter_by_name(self.store.list_schedule().await?, names, |e| {
            e.alert_name.as_str()
        })?;
        Ok(codec::schedule_to_csv(&entries)?)
    }
}
