//! In-memory storage backend (no persistence)
//!
//! Useful for:
//! - Testing without database dependencies
//! - Running the hub with `"backend": "none"`
//!
//! All three collections live behind a single lock, so every operation
//! (including schedule batches) is atomic with respect to readers.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{HealthStatus, ScheduleWriteSummary, StorageBackend, StoreStats};
use super::error::{StorageError, StorageResult};
use super::schema::{Collection, ScheduleWriteMode};
use crate::model::{Monitor, ScheduleEntry, Service, Status};

#[derive(Debug, Default)]
struct Collections {
    monitors: BTreeMap<String, Monitor>,
    services: BTreeMap<String, Service>,
    schedule: BTreeMap<String, ScheduleEntry>,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<Collections>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Add-only insert shared by the monitor and service collections
fn insert_new<T: Clone>(
    map: &mut BTreeMap<String, T>,
    collection: Collection,
    key: &str,
    record: &T,
) -> StorageResult<()> {
    if map.contains_key(key) {
        return Err(StorageError::DuplicateKey {
            collection,
            key: key.to_string(),
        });
    }
    map.insert(key.to_string(), record.clone());
    Ok(())
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        let mut collections = self.collections.write().await;
        insert_new(
            &mut collections.monitors,
            Collection::Monitors,
            &monitor.alert_name,
            monitor,
        )
    }

    async fn upsert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .monitors
            .insert(monitor.alert_name.clone(), monitor.clone());
        Ok(())
    }

    async fn get_monitor(&self, alert_name: &str) -> StorageResult<Option<Monitor>> {
        Ok(self.collections.read().await.monitors.get(alert_name).cloned())
    }

    async fn list_monitors(&self) -> StorageResult<Vec<Monitor>> {
        Ok(self.collections.read().await.monitors.values().cloned().collect())
    }

    async fn delete_monitor(&self, alert_name: &str) -> StorageResult<bool> {
        Ok(self
            .collections
            .write()
            .await
            .monitors
            .remove(alert_name)
            .is_some())
    }

    async fn record_check(
        &self,
        alert_name: &str,
        status: Status,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.monitors.get_mut(alert_name) {
            Some(monitor) => {
                monitor.status = status;
                monitor.check_time = Some(checked_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_service(&self, service: &Service) -> StorageResult<()> {
        let mut collections = self.collections.write().await;
        insert_new(
            &mut collections.services,
            Collection::Services,
            &service.alert_name,
            service,
        )
    }

    async fn upsert_service(&self, service: &Service) -> StorageResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .services
            .insert(service.alert_name.clone(), service.clone());
        Ok(())
    }

    async fn get_service(&self, alert_name: &str) -> StorageResult<Option<Service>> {
        Ok(self.collections.read().await.services.get(alert_name).cloned())
    }

    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        Ok(self.collections.read().await.services.values().cloned().collect())
    }

    async fn monitors_and_services(&self) -> StorageResult<(Vec<Monitor>, Vec<Service>)> {
        let collections = self.collections.read().await;
        Ok((
            collections.monitors.values().cloned().collect(),
            collections.services.values().cloned().collect(),
        ))
    }

    async fn delete_service(&self, alert_name: &str) -> StorageResult<bool> {
        Ok(self
            .collections
            .write()
            .await
            .services
            .remove(alert_name)
            .is_some())
    }

    async fn write_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        mode: ScheduleWriteMode,
    ) -> StorageResult<ScheduleWriteSummary> {
        let mut collections = self.collections.write().await;
        let mut summary = ScheduleWriteSummary::default();

        if mode == ScheduleWriteMode::Replace {
            let keep: HashSet<&str> = entries.iter().map(|e| e.alert_name.as_str()).collect();
            let before = collections.schedule.len();
            collections
                .schedule
                .retain(|alert_name, _| keep.contains(alert_name.as_str()));
            summary.pruned = before - collections.schedule.len();
        }

        for entry in entries {
            collections.schedule.insert(entry.alert_name.clone(), entry);
            summary.upserted += 1;
        }

        debug!(
            "in-memory schedule write: {} upserted, {} pruned",
            summary.upserted, summary.pruned
        );
        Ok(summary)
    }

    async fn get_schedule_entry(&self, alert_name: &str) -> StorageResult<Option<ScheduleEntry>> {
        Ok(self.collections.read().await.schedule.get(alert_name).cloned())
    }

    async fn list_schedule(&self) -> StorageResult<Vec<ScheduleEntry>> {
        Ok(self.collections.read().await.schedule.values().cloned().collect())
    }

    async fn delete_schedule_entry(&self, alert_name: &str) -> StorageResult<bool> {
        Ok(self
            .collections
            .write()
            .await
            .schedule
            .remove(alert_name)
            .is_some())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let stats = self.get_stats().await?;
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("records".to_string(), stats.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<StoreStats> {
        let collections = self.collections.read().await;
        Ok(StoreStats {
            monitors: collections.monitors.len(),
            services: collections.services.len(),
            schedule_entries: collections.schedule.len(),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
