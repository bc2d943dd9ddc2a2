//! Bounded FIFO queue shared by producers and the sender loop
//!
//! Lock-based with bounded critical sections: the `VecDeque` mutex is never
//! held across an await, so producers and the consumer cannot deadlock each
//! other. Wakeups go through `tokio::sync::Notify`; a notification stored
//! while nobody waits is kept as a permit, so a single waiter in the
//! check-then-wait pattern below cannot miss an update. `Notify` stores at
//! most one permit, though, so notifications from rapid dequeues can
//! coalesce while several producers sit between their full-check and their
//! `notified()` poll; a producer therefore passes the wakeup on after
//! pushing while space remains.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::config::FullQueuePolicy;
use crate::error::QueueError;

/// Thread-safe FIFO queue with an optional capacity bound
///
/// Producers call [`enqueue`](BoundedQueue::enqueue) from any number of
/// tasks; a single consumer calls
/// [`dequeue_timeout`](BoundedQueue::dequeue_timeout). When the bound is
/// reached the configured [`FullQueuePolicy`] decides whether producers
/// block or fail fast.
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// Advisory count, kept in sync under the items lock but read without it
    len: AtomicUsize,
    capacity: Option<usize>,
    policy: FullQueuePolicy,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> BoundedQueue<T> {
    /// Create a queue with the given capacity bound and full-queue policy.
    /// `None` means unbounded (the policy is then never consulted).
    pub fn new(capacity: Option<usize>, policy: FullQueuePolicy) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            len: AtomicUsize::new(0),
            capacity,
            policy,
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(None, FullQueuePolicy::Block)
    }

    /// Add an item at the tail.
    ///
    /// With a capacity bound and the queue full, `Block` suspends the
    /// caller until the consumer frees space and `Reject` returns
    /// [`QueueError::Full`] immediately.
    pub async fn enqueue(&self, item: T) -> Result<(), QueueError> {
        let mut item = item;
        loop {
            item = {
                let mut items = self.lock_items();
                match self.capacity {
                    Some(capacity) if items.len() >= capacity => match self.policy {
                        FullQueuePolicy::Reject => return Err(QueueError::Full { capacity }),
                        FullQueuePolicy::Block => item,
                    },
                    _ => {
                        items.push_back(item);
                        let len = items.len();
                        self.len.store(len, Ordering::Release);
                        drop(items);
                        self.not_empty.notify_one();
                        // Pass the wakeup on while space remains: permits
                        // from consecutive dequeues coalesce, so another
                        // blocked producer may otherwise never see its slot.
                        if let Some(capacity) = self.capacity {
                            if len < capacity {
                                self.not_full.notify_one();
                            }
                        }
                        return Ok(());
                    }
                }
            };

            // Full under the Block policy: wait for a dequeue, then re-check.
            self.not_full.notified().await;
        }
    }

    /// Add items in sequence order, equivalent to repeated `enqueue` calls.
    ///
    /// NOT atomic as a whole: under the `Reject` policy a full queue stops
    /// the batch mid-way and [`QueueError::BatchPartial`] reports how many
    /// items were accepted before the bound was hit. Under `Block` the call
    /// suspends per item and eventually accepts the whole batch.
    pub async fn enqueue_batch(&self, items: Vec<T>) -> Result<usize, QueueError> {
        let mut accepted = 0;
        for item in items {
            match self.enqueue(item).await {
                Ok(()) => accepted += 1,
                Err(QueueError::Full { capacity }) => {
                    return Err(QueueError::BatchPartial { accepted, capacity });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(accepted)
    }

    /// Remove the head item, waiting up to `timeout` for one to arrive.
    ///
    /// `None` on timeout is a signal, not an error: it gives the consumer a
    /// bounded opportunity to re-check run state instead of sleeping
    /// unboundedly.
    pub async fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut items = self.lock_items();
                if let Some(item) = items.pop_front() {
                    self.len.store(items.len(), Ordering::Release);
                    drop(items);
                    self.not_full.notify_one();
                    return Some(item);
                }
            }

            if tokio::time::timeout_at(deadline, self.not_empty.notified())
                .await
                .is_err()
            {
                return None;
            }
        }
    }

    /// Best-effort instantaneous count; advisory under concurrent access
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity bound, if any
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock_items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // The queue holds plain data; a panic while the lock was held
        // cannot leave it in an inconsistent state, so poisoning is benign.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = BoundedQueue::unbounded();

        for i in 0..5 {
            queue.enqueue(i).await.unwrap();
        }

        for expected in 0..5 {
            let item = queue.dequeue_timeout(Duration::from_millis(10)).await;
            assert_eq!(item, Some(expected));
        }
    }

    #[tokio::test]
    async fn test_dequeue_timeout_on_empty() {
        let queue: BoundedQueue<u32> = BoundedQueue::unbounded();

        let start = Instant::now();
        let item = queue.dequeue_timeout(Duration::from_millis(20)).await;

        assert_eq!(item, None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_reject_policy_at_capacity() {
        let queue = BoundedQueue::new(Some(2), FullQueuePolicy::Reject);

        queue.enqueue("a").await.unwrap();
        queue.enqueue("b").await.unwrap();
        let err = queue.enqueue("c").await.unwrap_err();

        assert_eq!(err, QueueError::Full { capacity: 2 });
        assert_eq!(queue.len(), 2);

        // Space frees after a dequeue
        queue.dequeue_timeout(Duration::from_millis(10)).await;
        queue.enqueue("c").await.unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_block_policy_unblocks_after_dequeue() {
        let queue = Arc::new(BoundedQueue::new(Some(1), FullQueuePolicy::Block));
        queue.enqueue(1u32).await.unwrap();

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                queue.dequeue_timeout(Duration::from_millis(100)).await
            })
        };

        // Blocks until the consumer frees the single slot
        queue.enqueue(2u32).await.unwrap();

        assert_eq!(consumer.await.unwrap(), Some(1));
        assert_eq!(
            queue.dequeue_timeout(Duration::from_millis(10)).await,
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_all_blocked_producers_unblock_after_multiple_dequeues() {
        // Back-to-back dequeues may coalesce into a single stored permit
        // while producers are still between their full-check and their
        // notified() poll; the woken producer must pass the wakeup on so
        // every freed slot is eventually filled.
        let queue = Arc::new(BoundedQueue::new(Some(2), FullQueuePolicy::Block));
        queue.enqueue(1u32).await.unwrap();
        queue.enqueue(2u32).await.unwrap();

        let mut blocked = Vec::new();
        for item in [3u32, 4] {
            let queue = Arc::clone(&queue);
            blocked.push(tokio::spawn(async move { queue.enqueue(item).await }));
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(queue.len(), 2);

        // Free both slots with no await point in between
        let first = queue.dequeue_timeout(Duration::from_millis(10)).await;
        let second = queue.dequeue_timeout(Duration::from_millis(10)).await;
        assert_eq!((first, second), (Some(1), Some(2)));

        for producer in blocked {
            tokio::time::timeout(Duration::from_secs(1), producer)
                .await
                .expect("blocked producer never woke")
                .unwrap()
                .unwrap();
        }
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_enqueue_in_order() {
        let queue = BoundedQueue::unbounded();

        let accepted = queue.enqueue_batch(vec![1, 2, 3]).await.unwrap();
        assert_eq!(accepted, 3);

        for expected in 1..=3 {
            assert_eq!(
                queue.dequeue_timeout(Duration::from_millis(10)).await,
                Some(expected)
            );
        }
    }

    #[tokio::test]
    async fn test_batch_partial_under_reject() {
        let queue = BoundedQueue::new(Some(2), FullQueuePolicy::Reject);

        let err = queue.enqueue_batch(vec![1, 2, 3, 4]).await.unwrap_err();

        assert_eq!(
            err,
            QueueError::BatchPartial {
                accepted: 2,
                capacity: 2
            }
        );
        // The accepted prefix is still queued, in order
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.dequeue_timeout(Duration::from_millis(10)).await,
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_concurrent_producers_no_loss_or_duplication() {
        let queue = Arc::new(BoundedQueue::unbounded());

        let mut producers = Vec::new();
        for p in 0..4u32 {
            let queue = Arc::clone(&queue);
            producers.push(tokio::spawn(async move {
                for i in 0..25u32 {
                    queue.enqueue(p * 100 + i).await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        while let Some(item) = queue.dequeue_timeout(Duration::from_millis(10)).await {
            assert!(seen.insert(item), "duplicated item {item}");
        }
        assert_eq!(seen.len(), 100);
    }

    #[tokio::test]
    async fn test_len_tracks_enqueue_dequeue() {
        let queue = BoundedQueue::unbounded();
        assert!(queue.is_empty());

        queue.enqueue(1).await.unwrap();
        queue.enqueue(2).await.unwrap();
        assert_eq!(queue.len(), 2);

        queue.dequeue_timeout(Duration::from_millis(10)).await;
        assert_eq!(queue.len(), 1);
    }
}
