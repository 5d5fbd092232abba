//! Broadcast hub: fan-out of stream events to live subscribers.
//!
//! Owns the only shared mutable state in the process besides counters: the
//! subscriber set, a lock-protected map from subscriber id to that
//! connection's channel. Registration and unregistration are atomic with
//! respect to an in-flight broadcast; a failed delivery unregisters the
//! subscriber and never blocks the others. No buffering or replay —
//! delivery is "was connected at broadcast time" only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::StreamEvent;

/// Opaque subscriber handle.
pub type SubscriberId = u64;

/// Receiving half handed to a connection's forward task.
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<str>>;

#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<Arc<str>>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber; returns its id and the event stream to
    /// forward to the connection.
    pub fn register(&self) -> (SubscriberId, EventReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let total = {
            let mut subs = self.subscribers.lock();
            subs.insert(id, tx);
            subs.len()
        };
        info!(subscriber = id, total, "Subscriber connected");
        (id, rx)
    }

    /// Remove a subscriber. Safe to call for ids already removed by a
    /// failed delivery.
    pub fn unregister(&self, id: SubscriberId) {
        let total = {
            let mut subs = self.subscribers.lock();
            subs.remove(&id);
            subs.len()
        };
        info!(subscriber = id, total, "Subscriber disconnected");
    }

    /// Deliver one event to every currently registered subscriber.
    ///
    /// The event serializes once; each delivery is a non-blocking channel
    /// send. Subscribers whose channel has closed are unregistered on the
    /// spot. Returns the number of delivery attempts made.
    pub fn broadcast(&self, event: &StreamEvent) -> usize {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json.as_str()),
            Err(e) => {
                warn!(error = %e, "Dropping unserializable event");
                return 0;
            }
        };

        let mut subs = self.subscribers.lock();
        let attempts = subs.len();
        let mut failed: Vec<SubscriberId> = Vec::new();

        for (id, tx) in subs.iter() {
            if tx.send(Arc::clone(&payload)).is_err() {
                failed.push(*id);
            }
        }
        for id in &failed {
            subs.remove(id);
            warn!(subscriber = id, "Delivery failed, subscriber removed");
        }
        drop(subs);

        debug!(attempts, failed = failed.len(), "Event broadcast");
        attempts
    }

    /// Current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
