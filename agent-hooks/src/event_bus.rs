//! An in-process, synchronous publish/subscribe event bus.
//!
//! Orthogonal to [`crate::Hooks`]: hooks are per-run lifecycle callbacks,
//! the event bus is a process-wide broadcast channel any component can
//! publish to or subscribe on, keyed by topic string.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

/// One published event.
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// The topic it was published under.
    pub topic: String,
    /// Arbitrary payload.
    pub payload: serde_json::Value,
    /// Unix epoch milliseconds. Stamped by `publish` if left zero.
    pub timestamp: u64,
}

type Subscriber = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// A handle returned by [`EventBus::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscription {
    id: u64,
    handler: Subscriber,
}

/// A topic-keyed, in-process broadcast channel.
///
/// Subscribers are invoked synchronously, in registration order, on the
/// publisher's own task — there is no per-delivery spawn. Handlers must
/// not block for long.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Construct an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a topic. Honors cancellation: if `cancellation`
    /// is already cancelled, no subscription is registered and `None` is
    /// returned.
    pub fn subscribe<F>(&self, topic: impl Into<String>, cancellation: &CancellationToken, handler: F) -> Option<SubscriptionHandle>
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        if cancellation.is_cancelled() {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut subscribers = self.subscribers.write().expect("lock poisoned");
        subscribers
            .entry(topic.into())
            .or_default()
            .push(Subscription {
                id,
                handler: Arc::new(handler),
            });
        Some(SubscriptionHandle(id))
    }

    /// Remove a subscription by handle. No-op if it is not found.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut subscribers = self.subscribers.write().expect("lock poisoned");
        for subs in subscribers.values_mut() {
            subs.retain(|sub| sub.id != handle.0);
        }
    }

    /// Publish an event to a topic. Stamps `timestamp` if it is zero,
    /// snapshots the subscriber list under a read lock, then invokes each
    /// subscriber synchronously. Honors cancellation by stopping delivery
    /// (but not un-registering) as soon as the token is cancelled.
    pub fn publish(&self, topic: &str, payload: serde_json::Value, cancellation: &CancellationToken) {
        let timestamp = now_millis();
        let event = BusEvent {
            topic: topic.to_string(),
            payload,
            timestamp,
        };

        let snapshot: Vec<Subscriber> = {
            let subscribers = self.subscribers.read().expect("lock poisoned");
            subscribers
                .get(topic)
                .map(|subs| subs.iter().map(|sub| sub.handler.clone()).collect())
                .unwrap_or_default()
        };

        for handler in snapshot {
            if cancellation.is_cancelled() {
                return;
            }
            handler(&event);
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
