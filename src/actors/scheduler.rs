//! MonitorSchedulerActor - Probes due monitors and records the verdict
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → list monitors → filter due → probe each → record_check
//!     ↑
//!     └─── Commands (TickNow, UpdateInterval, Shutdown)
//! ```
//!
//! A probe never aborts a tick: failures and even panics inside the prober
//! become a DOWN verdict and `CheckTime` still advances. Only a failed read of
//! the monitor collection abandons the whole tick.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, instrument, trace, warn};

use crate::clock::Clock;
use crate::model::{Monitor, Status};
use crate::monitors::probe::{ProbeFailure, ProbeOutcome, Prober};
use crate::storage::{StorageBackend, StorageResult};

use super::messages::{SchedulerCommand, SchedulerTickReport};

/// Default time between scheduler ticks
pub const DEFAULT_SCHEDULER_INTERVAL: Duration = Duration::from_secs(60);

/// Actor that walks the monitor collection on a timer
pub struct MonitorSchedulerActor {
    store: Arc<dyn StorageBackend>,
    prober: Arc<dyn Prober>,
    clock: Arc<dyn Clock>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Current tick interval
    interval_duration: Duration,
}

impl MonitorSchedulerActor {
    pub fn new(
        store: Arc<dyn StorageBackend>,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<SchedulerCommand>,
    ) -> Self {
        Self {
            store,
            prober,
            clock,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// This runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(interval_secs = self.interval_duration.as_secs()))]
    pub async fn run(mut self) {
        debug!("starting monitor scheduler actor");

        let mut ticker = new_ticker(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) => debug!("scheduler tick: {}", report),
                        Err(e) => warn!("scheduler tick abandoned: {}", e),
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let result = self.tick().await;
                            let _ = respond_to.send(result);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs.max(1));
                            ticker = new_ticker(self.interval_duration);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("monitor scheduler actor stopped");
    }

    /// Perform one scheduling pass
    ///
    /// 1. Snapshot the monitor collection
    /// 2. Select the monitors that are due at `now`
    /// 3. Probe each one and write back `{Status, CheckTime}`
    ///
    /// Returns an error only when the snapshot cannot be read.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> StorageResult<SchedulerTickReport> {
        let monitors = self.store.list_monitors().await?;
        let now = self.clock.now();

        let mut report = SchedulerTickReport {
            examined: monitors.len(),
            ..Default::default()
        };

        for monitor in monitors.into_iter().filter(|m| m.is_due(now)) {
            let outcome = self.probe_guarded(&monitor).await;

            report.checked += 1;
            match outcome.status {
                Status::Up => report.up += 1,
                Status::Down => report.down += 1,
            }
            if let Some(failure) = &outcome.failure {
                if failure.is_error() {
                    report.probe_failures += 1;
                }
                warn!(monitor = %monitor.alert_name, "monitor is DOWN: {}", failure);
            }

            let checked_at = self.clock.now();
            match self
                .store
                .record_check(&monitor.alert_name, outcome.status, checked_at)
                .await
            {
                Ok(true) => trace!(monitor = %monitor.alert_name, "recorded {}", outcome.status),
                Ok(false) => debug!(
                    monitor = %monitor.alert_name,
                    "monitor was removed during the check, result dropped"
                ),
                Err(e) => {
                    report.write_failures += 1;
                    error!(monitor = %monitor.alert_name, "failed to record check: {}", e);
                }
            }
        }

        Ok(report)
    }

    /// Run the prober in its own task so a panic turns into a DOWN verdict
    async fn probe_guarded(&self, monitor: &Monitor) -> ProbeOutcome {
        let prober = Arc::clone(&self.prober);
        let target = monitor.clone();

        match tokio::spawn(async move { prober.probe(&target).await }).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(monitor = %monitor.alert_name, "prober panicked: {}", message);
                ProbeOutcome::down(ProbeFailure::Panicked(message))
            }
            Err(e) => ProbeOutcome::down(ProbeFailure::Panicked(e.to_string())),
        }
    }
}

/// Interval whose first tick fires one period from now
pub(crate) fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle for controlling a MonitorSchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    pub fn spawn(
        store: Arc<dyn StorageBackend>,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self::spawn_tracked(store, prober, clock, interval).0
    }

    /// Spawn a new scheduler actor and keep its task handle
    pub fn spawn_tracked(
        store: Arc<dyn StorageBackend>,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = MonitorSchedulerActor::new(store, prober, clock, interval, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Run a tick immediately and wait for its report
    ///
    /// A store failure comes back as a `StorageError` inside the `anyhow::Error`.
    pub async fn tick_now(&self) -> Result<SchedulerTickReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::TickNow { respond_to: tx })
            .await?;

        Ok(rx.await??)
    }

    /// Update the tick interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the scheduler
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
