//! Process-wide context owning both polling loops
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use monitor_schedule::{clock::SystemClock, hub::{Hub, HubSettings}};
//! # use monitor_schedule::monitors::{DEFAULT_PROBE_TIMEOUT, HttpProber};
//! # use monitor_schedule::storage::MemoryBackend;
//! # async fn example() -> anyhow::Result<()> {
//! let hub = Hub::start(
//!     Arc::new(MemoryBackend::new()),
//!     Arc::new(HttpProber::new(DEFAULT_PROBE_TIMEOUT)?),
//!     Arc::new(SystemClock),
//!     HubSettings::default(),
//! );
//! hub.scheduler().tick_now().await?;
//! hub.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::actors::{
    DEFAULT_PROPAGATION_INTERVAL, DEFAULT_SCHEDULER_INTERVAL, PropagatorHandle, SchedulerHandle,
};
use crate::clock::Clock;
use crate::config::Config;
use crate::monitors::Prober;
use crate::storage::StorageBackend;

/// Timer settings for the two loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub scheduler_interval: Duration,
    pub propagation_interval: Duration,
    pub prune_disqualified: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            scheduler_interval: DEFAULT_SCHEDULER_INTERVAL,
            propagation_interval: DEFAULT_PROPAGATION_INTERVAL,
            prune_disqualified: false,
        }
    }
}

impl From<&Config> for HubSettings {
    fn from(config: &Config) -> Self {
        Self {
            scheduler_interval: config.scheduler_interval(),
            propagation_interval: config.propagation_interval(),
            prune_disqualified: config.schedule.prune_disqualified,
        }
    }
}

/// Running scheduler and propagator sharing one store
pub struct Hub {
    store: Arc<dyn StorageBackend>,
    scheduler: SchedulerHandle,
    propagator: PropagatorHandle,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Hub {
    /// Spawn both loops
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(store, prober, clock))]
    pub fn start(
        store: Arc<dyn StorageBackend>,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        settings: HubSettings,
    ) -> Self {
        let (scheduler, scheduler_task) = SchedulerHandle::spawn_tracked(
            Arc::clone(&store),
            prober,
            Arc::clone(&clock),
            settings.scheduler_interval.max(Duration::from_secs(1)),
        );

        let (propagator, propagator_task) = PropagatorHandle::spawn_tracked(
            Arc::clone(&store),
            clock,
            settings.prune_disqualified,
            settings.propagation_interval.max(Duration::from_secs(1)),
        );

        info!("hub started");

        Self {
            store,
            scheduler,
            propagator,
            tasks: vec![("scheduler", scheduler_task), ("propagator", propagator_task)],
        }
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub fn propagator(&self) -> &PropagatorHandle {
        &self.propagator
    }

    pub fn store(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.store)
    }

    /// Stop both loops and wait for them to exit
    ///
    /// An in-flight tick is allowed to finish. The store is left open.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
        self.propagator.shutdown().await;

        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!("{name} task ended abnormally: {e}");
            }
        }

        info!("hub stopped");
    }
}
