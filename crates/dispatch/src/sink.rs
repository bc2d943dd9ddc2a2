//! Sink port - the delivery boundary for dequeued transactions
//!
//! Concrete delivery (chain client, HTTP endpoint, ...) lives behind this
//! trait; the dispatch core only knows "send one transaction, report
//! success or failure". Retry and backoff, if wanted, belong to the sink.

use async_trait::async_trait;
use hermes_core::Transaction;
use log::info;

use crate::error::SinkError;

/// Delivery port for a single transaction
///
/// The sender loop calls `send` from one consumer task at a time, so an
/// implementation never races against itself; it only needs to be
/// `Send + Sync` to cross the task boundary.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one transaction.
    ///
    /// A failure is isolated to this item: the loop records it and moves on
    /// to the next. The core never retries or requeues.
    async fn send(&self, transaction: &Transaction) -> Result<(), SinkError>;
}

/// Sink that logs each delivery and always succeeds
///
/// Lets the pipeline run end-to-end without a real backend.
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
    async fn send(&self, transaction: &Transaction) -> Result<(), SinkError> {
        info!(
            "[SINK] delivered transaction {} ({} entries, {} items)",
            transaction.id,
            transaction.entry_count(),
            transaction.total_items()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        let sink = LogSink;
        let tx = Transaction::builder().with_item_counts([1, 2]).build();

        assert!(sink.send(&tx).await.is_ok());
    }
}
