//! SchedulePropagatorActor - Rebuilds the schedule view from monitors and services
//!
//! ```text
//! Timer tick → snapshot monitors + services → join on alert_name (both UP) → write_schedule
//! ```
//!
//! Runs on its own timer, independent of the scheduler. By default entries are
//! only ever upserted; with pruning enabled the same batch also removes every
//! entry that no longer qualifies.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::clock::Clock;
use crate::monitors::schedule::qualifying_entries;
use crate::storage::{ScheduleWriteMode, StorageBackend, StorageResult};

use super::messages::{PropagationReport, PropagatorCommand};
use super::scheduler::new_ticker;

/// Default time between propagation ticks
pub const DEFAULT_PROPAGATION_INTERVAL: Duration = Duration::from_secs(60);

pub struct SchedulePropagatorActor {
    store: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    write_mode: ScheduleWriteMode,
    command_rx: mpsc::Receiver<PropagatorCommand>,
    interval_duration: Duration,
}

impl SchedulePropagatorActor {
    pub fn new(
        store: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        prune_disqualified: bool,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<PropagatorCommand>,
    ) -> Self {
        let write_mode = if prune_disqualified {
            ScheduleWriteMode::Replace
        } else {
            ScheduleWriteMode::Upsert
        };

        Self {
            store,
            clock,
            write_mode,
            command_rx,
            interval_duration,
        }
    }

    #[instrument(skip(self), fields(interval_secs = self.interval_duration.as_secs(), mode = ?self.write_mode))]
    pub async fn run(mut self) {
        debug!("starting schedule propagator actor");

        let mut ticker = new_ticker(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) => debug!("propagation tick: {}", report),
                        Err(e) => warn!("propagation tick skipped: {}", e),
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PropagatorCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let result = self.tick().await;
                            let _ = respond_to.send(result);
                        }

                        PropagatorCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs.max(1));
                            ticker = new_ticker(self.interval_duration);
                        }

                        PropagatorCommand::Shutdown => {
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

        debug!("schedule propagator actor stopped");
    }

    /// Join monitors with services and write the qualifying entries as one batch
    ///
    /// Any store error leaves the schedule untouched.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> StorageResult<PropagationReport> {
        let (monitors, services) = self.store.monitors_and_services().await?;

        let entries = qualifying_entries(&monitors, &services, self.clock.now());
        let qualified = entries.len();

        let summary = self.store.write_schedule(entries, self.write_mode).await?;

        Ok(PropagationReport {
            qualified,
            upserted: summary.upserted,
            pruned: summary.pruned,
        })
    }
}

/// Handle for controlling a SchedulePropagatorActor
#[derive(Clone)]
pub struct PropagatorHandle {
    sender: mpsc::Sender<PropagatorCommand>,
}

impl PropagatorHandle {
    pub fn spawn(
        store: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        prune_disqualified: bool,
        interval: Duration,
    ) -> Self {
        Self::spawn_tracked(store, clock, prune_disqualified, interval).0
    }

    pub fn spawn_tracked(
        store: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        prune_disqualified: bool,
        interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SchedulePropagatorActor::new(store, clock, prune_disqualified, interval, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Run a propagation tick immediately and wait for its report
    pub async fn tick_now(&self) -> Result<PropagationReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PropagatorCommand::TickNow { respond_to: tx })
            .await?;

        Ok(rx.await??)
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(PropagatorCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(PropagatorCommand::Shutdown).await;
    }
}
