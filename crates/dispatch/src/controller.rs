//! Controller - public facade over the queue and sender loop
//!
//! The controller instance owns its queue and loop; multiple independent
//! controllers coexist without interference (no process-wide state).
//! Producers may call it from any task at any time: items added before
//! `start()` queue up and are processed once started, items added after
//! `stop()` queue up and are delivered only on restart.

use std::sync::Arc;

use log::{debug, info};

use hermes_core::Transaction;

use crate::config::DispatchConfig;
use crate::error::Result;
use crate::queue::BoundedQueue;
use crate::sender::{LoopState, SenderLoop};
use crate::sink::Sink;
use crate::stats::StatsSnapshot;

/// Facade over BoundedQueue + SenderLoop lifecycle
pub struct Controller {
    queue: Arc<BoundedQueue<Transaction>>,
    sender: SenderLoop,
}

impl Controller {
    /// Create a controller with default configuration
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self::with_config(sink, DispatchConfig::default())
    }

    /// Create a controller with custom configuration
    pub fn with_config(sink: Arc<dyn Sink>, config: DispatchConfig) -> Self {
        let queue = Arc::new(BoundedQueue::new(
            config.max_queue_size,
            config.full_queue_policy,
        ));
        let sender = SenderLoop::new(Arc::clone(&queue), sink, config);
        Self { queue, sender }
    }

    /// Queue one transaction for delivery.
    ///
    /// Suspends or fails under a full bound, per the configured policy.
    pub async fn add_transaction(&self, transaction: Transaction) -> Result<()> {
        self.queue.enqueue(transaction).await?;
        debug!("[CTRL] queued transaction, queue size {}", self.queue.len());
        Ok(())
    }

    /// Queue several transactions in order; returns how many were accepted.
    ///
    /// Not atomic: under the `Reject` policy a full queue stops the batch
    /// mid-way and the error reports the accepted prefix, which stays
    /// queued.
    pub async fn add_transactions_batch(&self, transactions: Vec<Transaction>) -> Result<usize> {
        let accepted = self.queue.enqueue_batch(transactions).await?;
        info!(
            "[CTRL] queued {} transactions, queue size {}",
            accepted,
            self.queue.len()
        );
        Ok(accepted)
    }

    /// Advisory queue depth
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Start the drain loop; `AlreadyRunning` on a second start
    pub fn start(&self) -> Result<()> {
        self.sender.start()
    }

    /// Request a cooperative stop (idempotent)
    pub fn stop(&self) {
        self.sender.stop()
    }

    /// Wait for the consumer task to exit after a stop request
    pub async fn join(&self) -> Result<()> {
        self.sender.join().await
    }

    pub fn state(&self) -> LoopState {
        self.sender.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.sender.stats()
    }
}
