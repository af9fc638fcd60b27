//! Actor-based polling loops
//!
//! Each loop runs as an independent tokio task and is controlled through a
//! cloneable handle that talks to it over an mpsc command channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌─────────┐
//!                  │   Hub   │
//!                  └────┬────┘
//!                       │ spawns
//!          ┌────────────┴────────────┐
//!          │                         │
//! ┌────────▼─────────┐    ┌──────────▼─────────┐
//! │ MonitorScheduler │    │ SchedulePropagator │
//! └────────┬─────────┘    └──────────┬─────────┘
//!          │ record_check            │ write_schedule
//!          └────────────┬────────────┘
//!                       ▼
//!             Arc<dyn StorageBackend>
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: `TickNow`, `UpdateInterval`, `Shutdown`
//! 2. **Request/Response**: `TickNow` answers with the tick report over a oneshot

pub mod messages;
pub mod propagator;
pub mod scheduler;

pub use messages::{PropagationReport, SchedulerTickReport};
pub use propagator::{DEFAULT_PROPAGATION_INTERVAL, PropagatorHandle, SchedulePropagatorActor};
pub use scheduler::{DEFAULT_SCHEDULER_INTERVAL, MonitorSchedulerActor, SchedulerHandle};
