//! Hermes Dispatch
//!
//! Producer/consumer pipeline for the Hermes transaction relay:
//! - **BoundedQueue**: thread-safe FIFO buffer with optional capacity bound
//!   and a block-or-reject backpressure policy
//! - **SenderLoop**: single consumer draining the queue through an injected
//!   [`Sink`], with cooperative stop semantics
//! - **Controller**: thin facade producers call from any task at any time
//!
//! ## Architecture
//!
//! ```text
//! Producer(s) ──► Controller.add ──► ┌──────────────┐
//!                                    │ BoundedQueue │  strict FIFO,
//!                                    │  (bounded)   │  block | reject
//!                                    └──────┬───────┘
//!                                           │ dequeue_timeout
//!                                    ┌──────▼───────┐
//!                                    │  SenderLoop  │  one tokio task,
//!                                    │ Idle→Running │  polls run state at
//!                                    │  →Stopping   │  every boundary
//!                                    │  →Stopped    │
//!                                    └──────┬───────┘
//!                                           │ send (one at a time)
//!                                    ┌──────▼───────┐
//!                                    │     Sink     │  external delivery,
//!                                    └──────────────┘  failures isolated
//! ```
//!
//! A sink failure never stops the loop; an empty queue never terminates it.
//! `stop()` is cooperative - in-flight sends run to completion and the loop
//! exits at the next poll boundary, at worst one `queue_empty_timeout`
//! later.

pub mod config;
pub mod controller;
pub mod error;
pub mod queue;
pub mod sender;
pub mod sink;
pub mod stats;

// Re-export main types
pub use config::{DispatchConfig, FullQueuePolicy};
pub use controller::Controller;
pub use error::{DispatchError, QueueError, Result, SinkError};
pub use queue::BoundedQueue;
pub use sender::{LoopState, SenderLoop};
pub use sink::{LogSink, Sink};
pub use stats::{DispatchStats, StatsSnapshot};
