//! Due-ness of a monitor

use chrono::{DateTime, Duration, Utc};

/// Whether a monitor with the given last check and frequency needs a check
///
/// A monitor that was never checked is always due. Otherwise it is due once
/// `frequency` minutes have elapsed; the boundary itself counts as due.
pub fn should_check(check_time: Option<DateTime<Utc>>, frequency: u32, now: DateTime<Utc>) -> bool {
    match check_time {
        None => true,
        Some(last_check) => now - last_check >= Duration::minutes(i64::from(frequency)),
    }
}
