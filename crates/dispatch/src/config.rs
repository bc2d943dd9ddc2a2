//! Dispatch configuration

use std::time::Duration;

/// Policy applied to producers when a bounded queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullQueuePolicy {
    /// Suspend the producer until the consumer frees space
    /// (cooperative backpressure)
    Block,
    /// Fail the enqueue immediately with `QueueError::Full`
    Reject,
}

/// Configuration for the dispatch pipeline
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long the consumer waits on an empty queue before re-checking
    /// run state. Bounds stop latency and idle wakeups; must be non-zero
    /// or the loop would busy-spin.
    pub queue_empty_timeout: Duration,
    /// Maximum queued transactions. `None` means unbounded.
    pub max_queue_size: Option<usize>,
    /// What producers see when a bounded queue is full
    pub full_queue_policy: FullQueuePolicy,
    /// Log throughput statistics every N handled items (0 disables)
    pub stats_log_interval: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_empty_timeout: Duration::from_secs(1),
            max_queue_size: None,
            full_queue_policy: FullQueuePolicy::Block,
            stats_log_interval: 10,
        }
    }
}

impl DispatchConfig {
    pub fn with_queue_empty_timeout(mut self, timeout: Duration) -> Self {
        self.queue_empty_timeout = timeout;
        self
    }

    pub fn with_max_queue_size(mut self, max_size: usize) -> Self {
        self.max_queue_size = Some(max_size);
        self
    }

    pub fn with_full_queue_policy(mut self, policy: FullQueuePolicy) -> Self {
        self.full_queue_policy = policy;
        self
    }
}
