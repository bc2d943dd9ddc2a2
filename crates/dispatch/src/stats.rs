//! Delivery statistics
//!
//! Submission-based counters, not confirmation-based: "delivered" means the
//! sink accepted the item, whatever happens to it downstream.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated by the sender loop and read from anywhere
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total items handed to the sink, delivered or not
    pub fn handled(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let delivered = self.delivered.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        StatsSnapshot {
            handled: delivered + failed,
            delivered,
            failed,
        }
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Items handed to the sink (delivered + failed)
    pub handled: u64,
    /// Successful deliveries
    pub delivered: u64,
    /// Failed deliveries (isolated per item, never retried by the core)
    pub failed: u64,
}

impl StatsSnapshot {
    /// Success rate in percent; 0.0 when nothing was handled yet
    pub fn success_rate(&self) -> f64 {
        if self.handled == 0 {
            0.0
        } else {
            self.delivered as f64 / self.handled as f64 * 100.0
        }
    }
}
