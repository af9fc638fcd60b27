//! Keyed record store for monitors, services and schedule entries
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` lets the scheduler, propagator and
//!   API share one store without caring which backend is behind it
//! - **Async**: All operations are async for compatibility with Tokio actors
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database, one table per collection
//! - **In-Memory**: No persistence, for tests or `"backend": "none"`
//!
//! ## Usage
//!
//! ```no_run
//! use monitor_schedule::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./monitor.db").await?;
//!     let stats = backend.get_stats().await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

pub use backend::{HealthStatus, ScheduleWriteSummary, StorageBackend, StoreStats};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::{Collection, ScheduleWriteMode};

use crate::config::{StorageConfig, StorageKind};

/// Open the backend selected by the configuration
pub async fn open_backend(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    match config.backend {
        StorageKind::None => {
            info!("using in-memory storage (no persistence)");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageKind::Sqlite => {
            let backend = sqlite::SqliteBackend::new(&config.path).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageKind::Sqlite => Err(StorageError::ConnectionFailed(
            "sqlite support not compiled in (enable the storage-sqlite feature)".to_string(),
        )),
    }
}
