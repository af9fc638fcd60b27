//! Collection layout shared by the backends and the CSV facade
//!
//! The column lists are a compatibility contract: exports write them in
//! exactly this order and imports look columns up by these names.

use std::fmt;

/// Monitor columns, in record order
pub const MONITOR_COLUMNS: [&str; 10] = [
    "AlertName",
    "Connection",
    "ServiceType",
    "HealthCheck",
    "Response",
    "Description",
    "Status",
    "CheckTime",
    "ScheduleTime",
    "Frequency",
];

/// Service columns, in record order
pub const SERVICE_COLUMNS: [&str; 4] = ["AlertName", "ServiceType", "HostName", "CheckStatus"];

/// Schedule entry columns, in record order
pub const SCHEDULE_COLUMNS: [&str; 7] = [
    "AlertName",
    "HealthCheck",
    "ScheduleTime",
    "Frequency",
    "HostName",
    "LastCheckTime",
    "Status",
];

/// The three keyed collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Monitors,
    Services,
    Schedule,
}

impl Collection {
    /// Backing SQL table
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Monitors => "monitors",
            Collection::Services => "services",
            Collection::Schedule => "monitor_schedule",
        }
    }

    /// Singular name for messages
    pub fn record_name(&self) -> &'static str {
        match self {
            Collection::Monitors => "monitor",
            Collection::Services => "service",
            Collection::Schedule => "schedule entry",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Collection::Monitors => &MONITOR_COLUMNS,
            Collection::Services => &SERVICE_COLUMNS,
            Collection::Schedule => &SCHEDULE_COLUMNS,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// How a batch of schedule entries is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleWriteMode {
    /// Upsert the given entries, leave every other entry alone
    #[default]
    Upsert,

    /// Upsert the given entries and delete every entry not among them
    Replace,
}
