//! Bounded FIFO queue decoupling feed ingestion from record processing.
//!
//! Thin wrapper over a bounded `tokio::sync::mpsc` channel. The producer
//! side suspends when the queue is full (backpressure); the consumer reads
//! with a short timeout so its loop can observe "no data available" and run
//! housekeeping or shutdown checks instead of blocking forever.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::defaults::{STREAM_QUEUE_CAPACITY, STREAM_QUEUE_RECV_TIMEOUT_SECS};

/// Producer half of the streaming queue.
#[derive(Clone)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> QueueSender<T> {
    /// Enqueue one item, suspending while the queue is full.
    ///
    /// Returns `Err` only when the consumer half has been dropped, which
    /// during shutdown is normal and not worth propagating further.
    pub async fn put(&self, item: T) -> Result<(), mpsc::error::SendError<T>> {
        self.tx.send(item).await
    }
}

/// Consumer half of the streaming queue.
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
    recv_timeout: Duration,
}

impl<T> QueueReceiver<T> {
    /// Dequeue the next item, or `None` if nothing arrives within the
    /// configured timeout. `None` is the periodic "no data" signal, not an
    /// end-of-stream marker.
    pub async fn get(&mut self) -> Option<T> {
        tokio::time::timeout(self.recv_timeout, self.rx.recv())
            .await
            .ok()
            .flatten()
    }
}

/// Create a bounded streaming queue with the default capacity and consumer
/// timeout.
pub fn stream_queue<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    stream_queue_with(
        STREAM_QUEUE_CAPACITY,
        Duration::from_secs(STREAM_QUEUE_RECV_TIMEOUT_SECS),
    )
}

/// Create a bounded streaming queue with explicit capacity and timeout.
pub fn stream_queue_with<T>(
    capacity: usize,
    recv_timeout: Duration,
) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx }, QueueReceiver { rx, recv_timeout })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_preserves_fifo_order() {
        let (tx, mut rx) = stream_queue_with::<u32>(8, Duration::from_millis(100));
        for i in 0..5 {
            tx.put(i).await.expect("queue open");
        }
        for i in 0..5 {
            assert_eq!(rx.get().await, Some(i));
        }
    }

    #[tokio::test]
    async fn get_times_out_when_empty() {
        let (_tx, mut rx) = stream_queue_with::<u32>(8, Duration::from_millis(20));
        let started = std::time::Instant::now();
        assert_eq!(rx.get().await, None);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn put_suspends_on_full_queue_until_consumer_drains() {
        let (tx, mut rx) = stream_queue_with::<u32>(1, Duration::from_millis(100));
        tx.put(1).await.expect("queue open");

        // Second put must block until the consumer frees a slot.
        let producer = tokio::spawn({
            let tx = tx.clone();
            async move { tx.put(2).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished(), "put should suspend while full");

        assert_eq!(rx.get().await, Some(1));
        producer
            .await
            .expect("producer task")
            .expect("queue open");
        assert_eq!(rx.get().await, Some(2));
    }

    #[tokio::test]
    async fn get_returns_none_after_producer_drops() {
        let (tx, mut rx) = stream_queue_with::<u32>(4, Duration::from_millis(50));
        tx.put(7).await.expect("queue open");
        drop(tx);
        assert_eq!(rx.get().await, Some(7));
        assert_eq!(rx.get().await, None);
    }
}
