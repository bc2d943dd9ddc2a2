//! Error types for the dispatch crate

use thiserror::Error;

/// Queue-level errors, surfaced synchronously to producers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("Batch enqueue stopped after {accepted} items: queue full (capacity {capacity})")]
    BatchPartial { accepted: usize, capacity: usize },
}

/// Delivery errors reported by a sink
///
/// Recorded per item by the sender loop; never fatal to the loop.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout waiting for delivery acknowledgement")]
    Timeout,
}

/// Dispatch-level errors (controller and loop lifecycle)
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Sender loop is already running")]
    AlreadyRunning,

    #[error("Sender loop was never started")]
    NotRunning,

    #[error("Sender loop task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
