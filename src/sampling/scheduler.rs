//! Periodic sampling timer.
//!
//! Every tick tries the single-flight gate. A tick that finds a cycle in
//! flight is dropped on the spot; it never queues, waits or retries. The
//! interval skips missed deadlines, so a slow cycle cannot cause a burst of
//! catch-up ticks once it finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::sampling::cycle::SamplingCycle;
use crate::sampling::gate::SamplingGate;

/// Default period between ticks (~15 Hz).
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(66);

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The gate was free and a new cycle was spawned.
    Started,
    /// A cycle was already in flight; nothing happened.
    Dropped,
}

pub struct SamplingScheduler {
    gate: Arc<SamplingGate>,
    cycle: Arc<SamplingCycle>,
}

impl SamplingScheduler {
    pub fn new(cycle: Arc<SamplingCycle>) -> Self {
        Self {
            gate: Arc::new(SamplingGate::new()),
            cycle,
        }
    }

    pub fn gate(&self) -> &Arc<SamplingGate> {
        &self.gate
    }

    /// Handle one timer tick.
    ///
    /// Must be called from within a tokio runtime: a started cycle runs as its
    /// own task holding the gate permit until it finishes.
    pub fn tick(&self) -> TickOutcome {
        let Some(permit) = self.gate.try_acquire() else {
            self.cycle.stats().lock().record_drop();
            tracing::trace!("tick dropped, cycle still in flight");
            return TickOutcome::Dropped;
        };

        self.cycle.stats().lock().record_cycle_start();
        let cycle = Arc::clone(&self.cycle);
        tokio::spawn(async move {
            let _permit = permit;
            let outcome = cycle.run().await;
            tracing::trace!("cycle finished: {outcome:?}");
        });
        TickOutcome::Started
    }

    /// Start ticking every `period` on a timer task.
    pub fn start(self: Arc<Self>, period: Duration) -> SchedulerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let scheduler = Arc::clone(&self);

        let timer = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!("sampling started, period {period:?}");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        scheduler.tick();
                    }
                }
            }
            tracing::info!("sampling timer stopped");
        });

        SchedulerHandle {
            scheduler: self,
            shutdown,
            timer,
        }
    }
}

/// A running timer. Dropping it without [`stop`](Self::stop) leaves the
/// timer task detached until the runtime shuts down.
pub struct SchedulerHandle {
    scheduler: Arc<SamplingScheduler>,
    shutdown: watch::Sender<bool>,
    timer: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &Arc<SamplingScheduler> {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        !self.timer.is_finished()
    }

    /// Cancel the timer and wait for its task to exit.
    ///
    /// No tick fires after this returns. A cycle already in flight runs to
    /// completion on its own task and releases the gate normally.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.timer.await {
            tracing::warn!("sampling timer task ended abnormally: {e}");
        }
    }
}
