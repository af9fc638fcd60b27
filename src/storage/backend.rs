//! Storage backend trait definition
//!
//! This module defines the `StorageBackend` trait that the record store
//! implementations (SQLite, in-memory) provide.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StorageResult;
use super::schema::ScheduleWriteMode;
use crate::model::{Monitor, ScheduleEntry, Service, Status};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Row counts per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub monitors: usize,
    pub services: usize,
    pub schedule_entries: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} monitors, {} services, {} schedule entries",
            self.monitors, self.services, self.schedule_entries
        )
    }
}

/// What a schedule batch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleWriteSummary {
    pub upserted: usize,
    pub pruned: usize,
}

/// Keyed record store for monitors, services and schedule entries
///
/// ## Semantics
///
/// - `insert_*` is add-only and fails with `StorageError::DuplicateKey`
///   without touching the existing record
/// - `upsert_*` atomically replaces the whole record or inserts it
/// - `list_*` returns a snapshot ordered by alert name
/// - `delete_*` reports whether a record was removed
///
/// Each call commits on its own. There are no cross-collection transactions;
/// concurrent writers to the same key resolve as last-writer-wins.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// scheduler, the propagator and request handlers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // ========================================================================
    // Monitors
    // ========================================================================

    async fn insert_monitor(&self, monitor: &Monitor) -> StorageResult<()>;

    async fn upsert_monitor(&self, monitor: &Monitor) -> StorageResult<()>;

    async fn get_monitor(&self, alert_name: &str) -> StorageResult<Option<Monitor>>;

    async fn list_monitors(&self) -> StorageResult<Vec<Monitor>>;

    async fn delete_monitor(&self, alert_name: &str) -> StorageResult<bool>;

    /// Write back the result of a check
    ///
    /// Only `status` and `check_time` are touched, so a concurrent edit of the
    /// other fields survives. Returns `false` if the monitor no longer exists.
    async fn record_check(
        &self,
        alert_name: &str,
        status: Status,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<bool>;

    // ========================================================================
    // Services
    // ========================================================================

    async fn insert_service(&self, service: &Service) -> StorageResult<()>;

    async fn upsert_service(&self, service: &Service) -> StorageResult<()>;

    async fn get_service(&self, alert_name: &str) -> StorageResult<Option<Service>>;

    async fn list_services(&self) -> StorageResult<Vec<Service>>;

    async fn delete_service(&self, alert_name: &str) -> StorageResult<bool>;

    /// Read monitors and services from one consistent snapshot
    ///
    /// Both lists are ordered by alert name. Writes that land during the read
    /// are either fully visible or not at all.
    async fn monitors_and_services(&self) -> StorageResult<(Vec<Monitor>, Vec<Service>)>;

    // ========================================================================
    // Schedule
    // ========================================================================

    /// Apply a batch of schedule entries atomically
    ///
    /// Readers observe either the state before or after the whole batch.
    async fn write_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        mode: ScheduleWriteMode,
    ) -> StorageResult<ScheduleWriteSummary>;

    async fn get_schedule_entry(&self, alert_name: &str) -> StorageResult<Option<ScheduleEntry>>;

    async fn list_schedule(&self) -> StorageResult<Vec<ScheduleEntry>>;

    async fn delete_schedule_entry(&self, alert_name: &str) -> StorageResult<bool>;

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    async fn get_stats(&self) -> StorageResult<StoreStats>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
