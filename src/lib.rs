//! Monitor polling and schedule derivation
//!
//! - [`actors`]: the scheduler and propagator loops
//! - [`monitors`]: due-ness, probing and the monitor/service join
//! - [`storage`]: the keyed record store (SQLite or in-memory)
//! - [`facade`]: record-level CRUD plus CSV import/export
//! - [`api`]: the HTTP facade (`api` feature)
//! - [`hub`]: lifecycle owner for both loops

pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod clock;
pub mod config;
pub mod facade;
pub mod hub;
pub mod model;
pub mod monitors;
pub mod storage;
pub mod util;
pub mod validation;

pub use model::{Monitor, ScheduleEntry, Service, ServiceType, Status};
