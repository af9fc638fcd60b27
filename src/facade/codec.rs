//! CSV codec for the three collections
//!
//! Exports always write the header row, in the column order from
//! [`crate::storage::schema`]. Imports locate columns by header name, so any
//! column order is accepted. Every field is trimmed.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Monitor, ScheduleEntry, Service, ServiceType, Status, format_schedule_time};
use crate::storage::schema::{MONITOR_COLUMNS, SCHEDULE_COLUMNS, SERVICE_COLUMNS};
use crate::validation::{
    ValidationError, parse_check_time, parse_frequency, parse_schedule_time, validate_alert_name,
};

/// Monitor columns an import cannot do without
pub const REQUIRED_MONITOR_COLUMNS: [&str; 9] = [
    "AlertName",
    "Connection",
    "ServiceType",
    "HealthCheck",
    "Response",
    "Description",
    "Status",
    "ScheduleTime",
    "Frequency",
];

/// A file-level import failure; no row was processed
#[derive(Debug)]
pub enum ImportError {
    /// The header row lacks required columns
    MissingColumns(Vec<String>),

    /// The header row could not be read
    Csv(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::MissingColumns(columns) => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            ImportError::Csv(msg) => write!(f, "unreadable CSV: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err.to_string())
    }
}

/// A rejected import row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based, header excluded
    pub row: usize,
    pub alert_name: Option<String>,
    pub message: String,
}

/// Result of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub(crate) fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub(crate) fn record_error(&mut self, row: usize, alert_name: Option<String>, message: String) {
        self.error_count += 1;
        self.errors.push(RowError {
            row,
            alert_name,
            message,
        });
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MonitorRow {
    alert_name: String,
    connection: String,
    service_type: String,
    health_check: String,
    response: String,
    description: String,
    status: String,
    #[serde(default)]
    check_time: String,
    schedule_time: String,
    frequency: String,
}

impl MonitorRow {
    /// Key, address, enum and time fields are trimmed; free text is kept as given
    fn into_monitor(self) -> Result<Monitor, ValidationError> {
        validate_alert_name(&self.alert_name)?;

        Ok(Monitor {
            service_type: ServiceType::parse(&self.service_type),
            status: Status::parse(&self.status)?,
            check_time: parse_check_time(&self.check_time)?,
            schedule_time: parse_schedule_time(&self.schedule_time)?,
            frequency: parse_frequency(&self.frequency)?,
            alert_name: self.alert_name.trim().to_string(),
            connection: self.connection.trim().to_string(),
            health_check: self.health_check,
            response: self.response.trim().to_string(),
            description: self.description,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceRow {
    alert_name: String,
    service_type: String,
    host_name: String,
    check_status: String,
}

impl ServiceRow {
    fn into_service(self) -> Result<Service, ValidationError> {
        validate_alert_name(&self.alert_name)?;

        Ok(Service {
            service_type: ServiceType::parse(&self.service_type),
            check_status: Status::parse(&self.check_status)?,
            alert_name: self.alert_name.trim().to_string(),
            host_name: self.host_name.trim().to_string(),
        })
    }
}

/// A row that decoded and validated, or the reason it did not
pub(crate) struct DecodedRow<T> {
    pub row: usize,
    pub alert_name: Option<String>,
    pub record: Result<T, String>,
}

/// Decode a monitor CSV into validated records, one result per data row
pub(crate) fn decode_monitors<R: Read>(reader: R) -> Result<Vec<DecodedRow<Monitor>>, ImportError> {
    decode_rows(reader, &REQUIRED_MONITOR_COLUMNS, |row: MonitorRow| {
        row.into_monitor()
    })
}

pub(crate) fn decode_services<R: Read>(reader: R) -> Result<Vec<DecodedRow<Service>>, ImportError> {
    decode_rows(reader, &SERVICE_COLUMNS, |row: ServiceRow| row.into_service())
}

fn decode_rows<R, Row, T, F>(
    reader: R,
    required: &[&str],
    convert: F,
) -> Result<Vec<DecodedRow<T>>, ImportError>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
    F: Fn(Row) -> Result<T, ValidationError>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !present.contains(*column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let alert_name_idx = headers.iter().position(|h| h == "AlertName");

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                rows.push(DecodedRow {
                    row,
                    alert_name: None,
                    record: Err(e.to_string()),
                });
                continue;
            }
        };

        let alert_name = alert_name_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let decoded = record
            .deserialize::<Row>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(|raw| convert(raw).map_err(|e| e.to_string()));

        rows.push(DecodedRow {
            row,
            alert_name,
            record: decoded,
        });
    }

    Ok(rows)
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_csv<I>(columns: &[&str], rows: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn monitors_to_csv(monitors: &[Monitor]) -> Result<String, csv::Error> {
    write_csv(
        &MONITOR_COLUMNS,
        monitors.iter().map(|m| {
            vec![
                m.alert_name.clone(),
                m.connection.clone(),
                m.service_type.to_string(),
                m.health_check.clone(),
                m.response.clone(),
                m.description.clone(),
                m.status.to_string(),
                m.check_time.as_ref().map(format_instant).unwrap_or_default(),
                format_schedule_time(&m.schedule_time),
                m.frequency.to_string(),
            ]
        }),
    )
}

pub fn services_to_csv(services: &[Service]) -> Result<String, csv::Error> {
    write_csv(
        &SERVICE_COLUMNS,
        services.iter().map(|s| {
            vec![
                s.alert_name.clone(),
                s.service_type.to_string(),
                s.host_name.clone(),
                s.check_status.to_string(),
            ]
        }),
    )
}

pub fn schedule_to_csv(entries: &[ScheduleEntry]) -> Result<String, csv::Error> {
    write_csv(
        &SCHEDULE_COLUMNS,
        entries.iter().map(|e| {
            vec![
                e.alert_name.clone(),
                e.health_check.clone(),
                format_schedule_time(&e.schedule_time),
                e.frequency.to_string(),
                e.host_name.clone(),
                format_instant(&e.last_check_time),
                e.status.to_string(),
            ]
        }),
    )
}
