//! Record types for the three keyed collections
//!
//! Every record is keyed by its `alert_name`. Monitors and services are
//! user data; schedule entries are derived by the propagator and never
//! edited directly.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitors::due::should_check;
use crate::validation::{self, ValidationError};

/// Format used when writing a schedule time back out
///
/// Sub-second precision is kept; whole seconds render without a fraction.
pub const SCHEDULE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Minutes between checks when nothing else is configured
pub const DEFAULT_FREQUENCY: u32 = 1;

/// Health verdict of a monitor or service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    Up,
    #[default]
    Down,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Status::Up)
    }

    /// Parse a status, treating an empty value as the default (DOWN)
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Status::default());
        }

        match value.to_ascii_uppercase().as_str() {
            "UP" => Ok(Status::Up),
            "DOWN" => Ok(Status::Down),
            _ => Err(ValidationError::InvalidStatus(value.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Status {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Status::parse(&value)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

/// Kind of endpoint a monitor points at
///
/// Anything that is not one of the known protocols is `Custom` and gets the
/// HTTP-style fallback check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    #[default]
    Http,
    Https,
    Tcp,
    Udp,
    Custom,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Http => "HTTP",
            ServiceType::Https => "HTTPS",
            ServiceType::Tcp => "TCP",
            ServiceType::Udp => "UDP",
            ServiceType::Custom => "CUSTOM",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HTTP" => ServiceType::Http,
            "HTTPS" => ServiceType::Https,
            "TCP" => ServiceType::Tcp,
            "UDP" => ServiceType::Udp,
            _ => ServiceType::Custom,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        ServiceType::parse(&value)
    }
}

impl From<ServiceType> for String {
    fn from(service_type: ServiceType) -> Self {
        service_type.as_str().to_string()
    }
}

/// A user-defined health check target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Primary key
    pub alert_name: String,

    /// Endpoint address (a URL for the HTTP family)
    pub connection: String,

    pub service_type: ServiceType,

    /// Check descriptor, stored but not interpreted
    pub health_check: String,

    /// Expected response signature (an HTTP status code for the HTTP family)
    pub response: String,

    pub description: String,

    #[serde(default)]
    pub status: Status,

    /// When the last check completed; `None` means never checked
    #[serde(default)]
    pub check_time: Option<DateTime<Utc>>,

    /// Base schedule anchor, validated but not used by the poll loop
    #[serde(with = "schedule_time_format")]
    pub schedule_time: NaiveDateTime,

    /// Minutes between checks
    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

impl Monitor {
    /// Whether the monitor should be probed at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        should_check(self.check_time, self.frequency, now)
    }

    /// Check the record-level invariants before it reaches the store
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_alert_name(&self.alert_name)?;
        validation::validate_frequency(self.frequency)?;
        Ok(())
    }
}

/// A host/service record whose status gates the schedule view
///
/// Correlated with the monitor of the same `alert_name` by convention only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub alert_name: String,
    pub service_type: ServiceType,
    pub host_name: String,
    #[serde(default)]
    pub check_status: Status,
}

impl Service {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_alert_name(&self.alert_name)
    }
}

/// Derived row of the schedule view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub alert_name: String,
    pub health_check: String,
    #[serde(with = "schedule_time_format")]
    pub schedule_time: NaiveDateTime,
    pub frequency: u32,
    pub host_name: String,
    pub last_check_time: DateTime<Utc>,
    pub status: Status,
}

fn default_frequency() -> u32 {
    DEFAULT_FREQUENCY
}

/// Render a schedule time the way it is persisted and exported
pub fn format_schedule_time(time: &NaiveDateTime) -> String {
    time.format(SCHEDULE_TIME_FORMAT).to_string()
}

mod schedule_time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_schedule_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::validation::parse_schedule_time(&raw).map_err(D::Error::custom)
    }
}
