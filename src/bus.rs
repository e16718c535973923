// Message bus boundary
//
// The transaction engine publishes lifecycle notifications by name with a
// JSON payload. `LocalBus` is the in-process implementation.
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

pub type EventCallback = Arc<dyn Fn(Value) -> Result<(), RouterError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub trait MessageBus: Send + Sync {
    fn subscribe(&self, event: &str, callback: EventCallback) -> SubscriptionId;

    /// Returns false if the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn subscriber_count(&self, event: &str) -> usize;
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: HashMap<String, Vec<(SubscriptionId, EventCallback)>>,
}

#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Arc<Mutex<BusInner>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every subscriber of `event` in registration order.
    /// Stops at and returns the first callback error.
    pub fn publish(&self, event: &str, payload: Value) -> Result<usize, RouterError> {
        let callbacks: Vec<EventCallback> = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .subscribers
                .get(event)
                .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        trace!(event = event, subscribers = callbacks.len(), "publishing bus event");
        for callback in &callbacks {
            callback(payload.clone())?;
        }
        Ok(callbacks.len())
    }

    pub fn total_subscriptions(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.subscribers.values().map(Vec::len).sum()
    }
}

impl MessageBus for LocalBus {
    fn subscribe(&self, event: &str, callback: EventCallback) -> SubscriptionId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner
            .subscribers
            .entry(event.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for subs in inner.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|(sub, _)| *sub == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    fn subscriber_count(&self, event: &str) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.subscribers.get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn publish_reaches_only_matching_subscribers() {
        let bus = LocalBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.subscribe(
            "a",
            Arc::new(move |_: Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        assert_eq!(bus.publish("a", json!({})).unwrap(), 1);
        assert_eq!(bus.publish("b", json!({})).unwrap(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_removes_callback_once() {
        let bus = LocalBus::new();
        let id = bus.subscribe("a", Arc::new(|_: Value| Ok(())));
        assert_eq!(bus.subscriber_count("a"), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.total_subscriptions(), 0);
    }

    #[test]
    fn callback_error_is_returned_to_publisher() {
        let bus = LocalBus::new();
        bus.subscribe("a", Arc::new(|_: Value| Err(RouterError::Handler("boom".into()))));
        assert_eq!(
            bus.publish("a", json!(null)),
            Err(RouterError::Handler("boom".into()))
        );
    }
}
