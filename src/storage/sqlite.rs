//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema creation with sqlx
//!
//! ## Representation
//!
//! - Enums are stored as their upper-case names (`UP`, `HTTPS`, ...)
//! - `check_time` / `last_check_time` are Unix milliseconds
//! - `schedule_time` is text in `YYYY-MM-DDTHH:MM:SS`

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, ScheduleWriteSummary, StorageBackend, StoreStats};
use super::error::{StorageError, StorageResult};
use super::schema::{Collection, ScheduleWriteMode};
use crate::model::{Monitor, ScheduleEntry, Service, ServiceType, Status, format_schedule_time};
use crate::validation::parse_schedule_time;

const MONITOR_SELECT: &str = r#"
    SELECT alert_name, connection, service_type, health_check, response,
           description, status, check_time, schedule_time, frequency
    FROM monitors
"#;

const SERVICE_SELECT: &str = r#"
    SELECT alert_name, service_type, host_name, check_status
    FROM services
"#;

const SCHEDULE_SELECT: &str = r#"
    SELECT alert_name, health_check, schedule_time, frequency,
           host_name, last_check_time, status
    FROM monitor_schedule
"#;

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create the three tables
    /// 3. Configure SQLite for concurrent readers (WAL mode, busy timeout)
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use monitor_schedule::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./monitor.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> StorageResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            StorageError::SerializationError(format!("timestamp out of range: {}", millis))
        })
    }

    fn monitor_from_row(row: &SqliteRow) -> StorageResult<Monitor> {
        let check_time = row
            .try_get::<Option<i64>, _>("check_time")?
            .map(Self::millis_to_timestamp)
            .transpose()?;

        Ok(Monitor {
            alert_name: row.try_get("alert_name")?,
            connection: row.try_get("connection")?,
            service_type: ServiceType::parse(&row.try_get::<String, _>("service_type")?),
            health_check: row.try_get("health_check")?,
            response: row.try_get("response")?,
            description: row.try_get("description")?,
            status: parse_status(&row.try_get::<String, _>("status")?)?,
            check_time,
            schedule_time: parse_stored_schedule_time(&row.try_get::<String, _>("schedule_time")?)?,
            frequency: parse_stored_frequency(row.try_get("frequency")?)?,
        })
    }

    fn service_from_row(row: &SqliteRow) -> StorageResult<Service> {
        Ok(Service {
            alert_name: row.try_get("alert_name")?,
            service_type: ServiceType::parse(&row.try_get::<String, _>("service_type")?),
            host_name: row.try_get("host_name")?,
            check_status: parse_status(&row.try_get::<String, _>("check_status")?)?,
        })
    }

    fn schedule_entry_from_row(row: &SqliteRow) -> StorageResult<ScheduleEntry> {
        Ok(ScheduleEntry {
            alert_name: row.try_get("alert_name")?,
            health_check: row.try_get("health_check")?,
            schedule_time: parse_stored_schedule_time(&row.try_get::<String, _>("schedule_time")?)?,
            frequency: parse_stored_frequency(row.try_get("frequency")?)?,
            host_name: row.try_get("host_name")?,
            last_check_time: Self::millis_to_timestamp(row.try_get("last_check_time")?)?,
            status: parse_status(&row.try_get::<String, _>("status")?)?,
        })
    }

    async fn delete_by_key(&self, collection: Collection, alert_name: &str) -> StorageResult<bool> {
        let sql = format!("DELETE FROM {} WHERE alert_name = ?", collection.table_name());
        let result = sqlx::query(&sql)
            .bind(alert_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: Collection) -> StorageResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table_name());
        let row: (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(row.0 as usize)
    }
}

fn parse_status(raw: &str) -> StorageResult<Status> {
    Status::parse(raw).map_err(|e| StorageError::SerializationError(e.to_string()))
}

fn parse_stored_schedule_time(raw: &str) -> StorageResult<chrono::NaiveDateTime> {
    parse_schedule_time(raw).map_err(|e| StorageError::SerializationError(e.to_string()))
}

fn parse_stored_frequency(raw: i64) -> StorageResult<u32> {
    u32::try_from(raw)
        .map_err(|_| StorageError::SerializationError(format!("frequency out of range: {}", raw)))
}

/// Map a failed add-only insert, recognising primary key collisions
fn insert_error(err: sqlx::Error, collection: Collection, key: &str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed") {
            return StorageError::DuplicateKey {
                collection,
                key: key.to_string(),
            };
        }
    }
    StorageError::from(err)
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self, monitor), fields(alert_name = %monitor.alert_name))]
    async fn insert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO monitors (
                alert_name, connection, service_type, health_check, response,
                description, status, check_time, schedule_time, frequency
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&monitor.alert_name)
        .bind(&monitor.connection)
        .bind(monitor.service_type.as_str())
        .bind(&monitor.health_check)
        .bind(&monitor.response)
        .bind(&monitor.description)
        .bind(monitor.status.as_str())
        .bind(monitor.check_time.as_ref().map(Self::timestamp_to_millis))
        .bind(format_schedule_time(&monitor.schedule_time))
        .bind(i64::from(monitor.frequency))
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, Collection::Monitors, &monitor.alert_name))?;

        Ok(())
    }

    #[instrument(skip(self, monitor), fields(alert_name = %monitor.alert_name))]
    async fn upsert_monitor(&self, monitor: &Monitor) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO monitors (
                alert_name, connection, service_type, health_check, response,
                description, status, check_time, schedule_time, frequency
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (alert_name) DO UPDATE SET
                connection = excluded.connection,
                service_type = excluded.service_type,
                health_check = excluded.health_check,
                response = excluded.response,
                description = excluded.description,
                status = excluded.status,
                check_time = excluded.check_time,
                schedule_time = excluded.schedule_time,
                frequency = excluded.frequency
            "#,
        )
        .bind(&monitor.alert_name)
        .bind(&monitor.connection)
        .bind(monitor.service_type.as_str())
        .bind(&monitor.health_check)
        .bind(&monitor.response)
        .bind(&monitor.description)
        .bind(monitor.status.as_str())
        .bind(monitor.check_time.as_ref().map(Self::timestamp_to_millis))
        .bind(format_schedule_time(&monitor.schedule_time))
        .bind(i64::from(monitor.frequency))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_monitor(&self, alert_name: &str) -> StorageResult<Option<Monitor>> {
        let sql = format!("{MONITOR_SELECT} WHERE alert_name = ?");
        sqlx::query(&sql)
            .bind(alert_name)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::monitor_from_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_monitors(&self) -> StorageResult<Vec<Monitor>> {
        let sql = format!("{MONITOR_SELECT} ORDER BY alert_name ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        debug!("loaded {} monitors", rows.len());
        rows.iter().map(Self::monitor_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_monitor(&self, alert_name: &str) -> StorageResult<bool> {
        self.delete_by_key(Collection::Monitors, alert_name).await
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn record_check(
        &self,
        alert_name: &str,
        status: Status,
        checked_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let result =
            sqlx::query("UPDATE monitors SET status = ?, check_time = ? WHERE alert_name = ?")
                .bind(status.as_str())
                .bind(Self::timestamp_to_millis(&checked_at))
                .bind(alert_name)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, service), fields(alert_name = %service.alert_name))]
    async fn insert_service(&self, service: &Service) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO services (alert_name, service_type, host_name, check_status) VALUES (?, ?, ?, ?)",
        )
        .bind(&service.alert_name)
        .bind(service.service_type.as_str())
        .bind(&service.host_name)
        .bind(service.check_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, Collection::Services, &service.alert_name))?;

        Ok(())
    }

    #[instrument(skip(self, service), fields(alert_name = %service.alert_name))]
    async fn upsert_service(&self, service: &Service) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO services (alert_name, service_type, host_name, check_status)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (alert_name) DO UPDATE SET
                service_type = excluded.service_type,
                host_name = excluded.host_name,
                check_status = excluded.check_status
            "#,
        )
        .bind(&service.alert_name)
        .bind(service.service_type.as_str())
        .bind(&service.host_name)
        .bind(service.check_status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_service(&self, alert_name: &str) -> StorageResult<Option<Service>> {
        let sql = format!("{SERVICE_SELECT} WHERE alert_name = ?");
        sqlx::query(&sql)
            .bind(alert_name)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::service_from_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        let sql = format!("{SERVICE_SELECT} ORDER BY alert_name ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::service_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_service(&self, alert_name: &str) -> StorageResult<bool> {
        self.delete_by_key(Collection::Services, alert_name).await
    }

    #[instrument(skip(self))]
    async fn monitors_and_services(&self) -> StorageResult<(Vec<Monitor>, Vec<Service>)> {
        // Both selects share one read transaction, so they see the same WAL snapshot
        let mut tx = self.pool.begin().await?;

        let monitor_sql = format!("{MONITOR_SELECT} ORDER BY alert_name ASC");
        let monitor_rows = sqlx::query(&monitor_sql).fetch_all(&mut *tx).await?;

        let service_sql = format!("{SERVICE_SELECT} ORDER BY alert_name ASC");
        let service_rows = sqlx::query(&service_sql).fetch_all(&mut *tx).await?;

        tx.commit().await?;

        let monitors = monitor_rows
            .iter()
            .map(Self::monitor_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        let services = service_rows
            .iter()
            .map(Self::service_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!(
            "loaded snapshot of {} monitors and {} services",
            monitors.len(),
            services.len()
        );
        Ok((monitors, services))
    }

    #[instrument(skip(self, entries), fields(count = entries.len(), mode = ?mode))]
    async fn write_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        mode: ScheduleWriteMode,
    ) -> StorageResult<ScheduleWriteSummary> {
        let mut summary = ScheduleWriteSummary::default();

        // One transaction so readers never see a half-written schedule
        let mut tx = self.pool.begin().await?;

        if mode == ScheduleWriteMode::Replace {
            let result = if entries.is_empty() {
                sqlx::query("DELETE FROM monitor_schedule")
                    .execute(&mut *tx)
                    .await?
            } else {
                let placeholders = vec!["?"; entries.len()].join(", ");
                let sql = format!(
                    "DELETE FROM monitor_schedule WHERE alert_name NOT IN ({})",
                    placeholders
                );
                let mut query = sqlx::query(&sql);
                for entry in &entries {
                    query = query.bind(&entry.alert_name);
                }
                query.execute(&mut *tx).await?
            };
            summary.pruned = result.rows_affected() as usize;
        }

        for entry in &entries {
            sqlx::query(
                r#"
                INSERT INTO monitor_schedule (
                    alert_name, health_check, schedule_time, frequency,
                    host_name, last_check_time, status
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (alert_name) DO UPDATE SET
                    health_check = excluded.health_check,
                    schedule_time = excluded.schedule_time,
                    frequency = excluded.frequency,
                    host_name = excluded.host_name,
                    last_check_time = excluded.last_check_time,
                    status = excluded.status
                "#,
            )
            .bind(&entry.alert_name)
            .bind(&entry.health_check)
            .bind(format_schedule_time(&entry.schedule_time))
            .bind(i64::from(entry.frequency))
            .bind(&entry.host_name)
            .bind(Self::timestamp_to_millis(&entry.last_check_time))
            .bind(entry.status.as_str())
            .execute(&mut *tx)
            .await?;

            summary.upserted += 1;
        }

        tx.commit().await?;

        debug!(
            "schedule write complete: {} upserted, {} pruned",
            summary.upserted, summary.pruned
        );
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn get_schedule_entry(&self, alert_name: &str) -> StorageResult<Option<ScheduleEntry>> {
        let sql = format!("{SCHEDULE_SELECT} WHERE alert_name = ?");
        sqlx::query(&sql)
            .bind(alert_name)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::schedule_entry_from_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_schedule(&self) -> StorageResult<Vec<ScheduleEntry>> {
        let sql = format!("{SCHEDULE_SELECT} ORDER BY alert_name ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::schedule_entry_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_schedule_entry(&self, alert_name: &str) -> StorageResult<bool> {
        self.delete_by_key(Collection::Schedule, alert_name).await
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        // Simple ping query to verify connection
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<StoreStats> {
        Ok(StoreStats {
            monitors: self.count(Collection::Monitors).await?,
            services: self.count(Collection::Services).await?,
            schedule_entries: self.count(Collection::Schedule).await?,
        })
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
