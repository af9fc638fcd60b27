//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to a specific actor via mpsc
//! 2. **Reports**: Each tick returns a summary so callers (and tests) can tell
//!    a probe failure apart from an unavailable store

use std::fmt;

use serde::Serialize;
use tokio::sync::oneshot;

use crate::storage::StorageResult;

/// Commands that can be sent to the MonitorSchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run one tick immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    TickNow {
        /// Channel to send the tick report back
        respond_to: oneshot::Sender<StorageResult<SchedulerTickReport>>,
    },

    /// Update the tick interval
    ///
    /// The ticker is rebuilt, so the next timer tick fires one new interval from now.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// The actor finishes any in-flight tick and then exits.
    Shutdown,
}

/// Commands that can be sent to the SchedulePropagatorActor
#[derive(Debug)]
pub enum PropagatorCommand {
    TickNow {
        respond_to: oneshot::Sender<StorageResult<PropagationReport>>,
    },

    UpdateInterval {
        interval_secs: u64,
    },

    Shutdown,
}

/// Outcome of one scheduler tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerTickReport {
    /// Monitors in the snapshot
    pub examined: usize,

    /// Monitors that were due and probed
    pub checked: usize,

    pub up: usize,
    pub down: usize,

    /// DOWN verdicts that carried a failure (timeout, refused, panic, ...)
    pub probe_failures: usize,

    /// Write-backs that failed; the rest of the tick still ran
    pub write_failures: usize,
}

impl fmt::Display for SchedulerTickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} checked ({} up, {} down, {} probe failures, {} write failures)",
            self.checked, self.examined, self.up, self.down, self.probe_failures, self.write_failures
        )
    }
}

/// Outcome of one propagation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Monitors that passed the join
    pub qualified: usize,
    pub upserted: usize,
    pub pruned: usize,
}

impl fmt::Display for PropagationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} qualified, {} upserted, {} pruned",
            self.qualified, self.upserted, self.pruned
        )
    }
}
