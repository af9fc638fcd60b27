//! API request and response types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::storage::StoreStats;

/// Response for GET /api/v1/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Response for GET /api/v1/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub timestamp: String,
    pub monitors: usize,
    pub services: usize,
    pub schedule_entries: usize,
}

impl StatsResponse {
    pub fn new(stats: StoreStats) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            monitors: stats.monitors,
            services: stats.services,
            schedule_entries: stats.schedule_entries,
        }
    }
}

/// Response for DELETE on a single record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub alert_name: String,
    pub deleted: bool,
}

/// Query parameters for the CSV exports
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Comma-separated alert names
    pub names: Option<String>,
}

impl ExportQuery {
    pub fn names(&self) -> Option<Vec<String>> {
        self.names.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
