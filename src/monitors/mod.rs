//! Polling and schedule-derivation logic
//!
//! Pure decision logic lives here; the periodic loops that drive it are in
//! [`crate::actors`].

pub mod due;
pub mod probe;
pub mod schedule;

pub use due::should_check;
pub use probe::{DEFAULT_PROBE_TIMEOUT, HttpProber, ProbeFailure, ProbeOutcome, Prober};
pub use schedule::qualifying_entries;
