//! Join of monitor and service state into schedule entries

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{Monitor, ScheduleEntry, Service, Status};

/// Build the schedule entries for every actively healthy monitor
///
/// A monitor qualifies when it is UP and a service with the same alert name
/// is UP too. Entries come out in the order of `monitors`.
pub fn qualifying_entries(
    monitors: &[Monitor],
    services: &[Service],
    now: DateTime<Utc>,
) -> Vec<ScheduleEntry> {
    let healthy_hosts: HashMap<&str, &str> = services
        .iter()
        .filter(|service| service.check_status.is_up())
        .map(|service| (service.alert_name.as_str(), service.host_name.as_str()))
        .collect();

    monitors
        .iter()
        .filter(|monitor| monitor.status.is_up())
        .filter_map(|monitor| {
            healthy_hosts
                .get(monitor.alert_name.as_str())
                .map(|host_name| ScheduleEntry {
                    alert_name: monitor.alert_name.clone(),
                    health_check: monitor.health_check.clone(),
                    schedule_time: monitor.schedule_time,
                    frequency: monitor.frequency,
                    host_name: host_name.to_string(),
                    last_check_time: now,
                    status: Status::Up,
                })
        })
        .collect()
}
