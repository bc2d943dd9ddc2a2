//! Sender loop - the single-consumer drain cycle
//!
//! One tokio task polls the queue with a bounded timeout and pushes each
//! item through the sink. The timeout is what keeps the loop responsive:
//! an empty queue yields `None`, the loop re-checks run state and polls
//! again, so emptiness never terminates it and a stop request is observed
//! at worst one `queue_empty_timeout` later.
//!
//! Known limitation: stop is cooperative. An in-flight sink call runs to
//! completion; a sink that hangs holds the loop in `Stopping` indefinitely.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use hermes_core::Transaction;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::queue::BoundedQueue;
use crate::sink::Sink;
use crate::stats::{DispatchStats, StatsSnapshot};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;
const STOPPED: u8 = 3;

/// Lifecycle state of the sender loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, never started
    Idle,
    /// Consumer task is polling the queue
    Running,
    /// Stop requested; the loop exits at the next poll boundary
    Stopping,
    /// Consumer task has exited (restartable)
    Stopped,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            IDLE => LoopState::Idle,
            RUNNING => LoopState::Running,
            STOPPING => LoopState::Stopping,
            _ => LoopState::Stopped,
        }
    }
}

/// Owns the drain cycle over a shared queue
///
/// `start()` spawns the consumer task; a second start while the loop is
/// Running or Stopping is rejected with `AlreadyRunning`. Restart from
/// `Stopped` is permitted and queued-but-undelivered items survive it in
/// order, since the queue outlives the task.
pub struct SenderLoop {
    queue: Arc<BoundedQueue<Transaction>>,
    sink: Arc<dyn Sink>,
    config: DispatchConfig,
    state: Arc<AtomicU8>,
    stats: Arc<DispatchStats>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SenderLoop {
    pub fn new(
        queue: Arc<BoundedQueue<Transaction>>,
        sink: Arc<dyn Sink>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            queue,
            sink,
            config,
            state: Arc::new(AtomicU8::new(IDLE)),
            stats: Arc::new(DispatchStats::new()),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the consumer task.
    ///
    /// Valid from `Idle` or `Stopped`; rejected with `AlreadyRunning`
    /// while a previous consumer task is still alive.
    pub fn start(&self) -> Result<(), DispatchError> {
        let started = self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .or_else(|_| {
                self.state
                    .compare_exchange(STOPPED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            });
        if started.is_err() {
            return Err(DispatchError::AlreadyRunning);
        }

        let queue = Arc::clone(&self.queue);
        let sink = Arc::clone(&self.sink);
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let config = self.config.clone();

        let handle = tokio::spawn(run_loop(queue, sink, state, stats, config));

        // A handle from a previous stopped run is just dropped; the task
        // behind it has already exited.
        *self.lock_handle() = Some(handle);
        Ok(())
    }

    /// Request a cooperative stop.
    ///
    /// Idempotent: only a Running loop transitions to Stopping; stopping an
    /// Idle, Stopping or Stopped loop is a no-op. Never interrupts an
    /// in-flight sink call.
    pub fn stop(&self) {
        if self
            .state
            .compare_exchange(RUNNING, STOPPING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("[SENDER] stop requested");
        }
    }

    /// Wait for the consumer task to exit after a stop request.
    ///
    /// Joining an already-joined Stopped loop is a no-op;
    /// `NotRunning` if the loop was never started.
    pub async fn join(&self) -> Result<(), DispatchError> {
        let handle = self.lock_handle().take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| DispatchError::TaskFailed(e.to_string())),
            None if self.state() == LoopState::Stopped => Ok(()),
            None => Err(DispatchError::NotRunning),
        }
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_loop(
    queue: Arc<BoundedQueue<Transaction>>,
    sink: Arc<dyn Sink>,
    state: Arc<AtomicU8>,
    stats: Arc<DispatchStats>,
    config: DispatchConfig,
) {
    info!(
        "[SENDER] loop started (poll timeout {:?}, queue size {})",
        config.queue_empty_timeout,
        queue.len()
    );
    let mut last_stats_time = Instant::now();

    while state.load(Ordering::Acquire) == RUNNING {
        match queue.dequeue_timeout(config.queue_empty_timeout).await {
            Some(transaction) => {
                match sink.send(&transaction).await {
                    Ok(()) => {
                        stats.record_delivered();
                        debug!("[SENDER] delivered transaction {}", transaction.id);
                    }
                    Err(e) => {
                        // Failure is isolated to this item; the loop moves on
                        stats.record_failed();
                        warn!("[SENDER] delivery failed for {}: {}", transaction.id, e);
                    }
                }

                let handled = stats.handled();
                if config.stats_log_interval > 0
                    && handled.is_multiple_of(config.stats_log_interval)
                {
                    let snapshot = stats.snapshot();
                    let elapsed = last_stats_time.elapsed();
                    let rate = config.stats_log_interval as f64 / elapsed.as_secs_f64().max(1e-9);
                    info!(
                        "[SENDER] handled {} ({} delivered, {} failed, {:.1}% success, {:.1}/s, {} queued)",
                        snapshot.handled,
                        snapshot.delivered,
                        snapshot.failed,
                        snapshot.success_rate(),
                        rate,
                        queue.len()
                    );
                    last_stats_time = Instant::now();
                }
            }
            None => {
                // Empty queue: poll again. This is what keeps the loop
                // alive through quiet periods.
                debug!(
                    "[SENDER] queue empty, re-checking run state after {:?}",
                    config.queue_empty_timeout
                );
            }
        }
    }

    state.store(STOPPED, Ordering::Release);
    let snapshot = stats.snapshot();
    info!(
        "[SENDER] loop stopped ({} delivered, {} failed, {} still queued)",
        snapshot.delivered,
        snapshot.failed,
        queue.len()
    );
}
