//! # Change Bus
//!
//! In-process fan-out of "something changed" notifications.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockLedger ──┐                                                        │
//! │  SalesEngine ──┼──► publish(topic, reason) ──► handlers for topic      │
//! │  Production ───┘                           └─► channel subscribers     │
//! │                                                                         │
//! │  A handler that returns Err or panics is logged and skipped;           │
//! │  the remaining handlers still run.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is synchronous and best-effort. Nothing is persisted and there
//! is no replay.

use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Notification topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    InventoryChanged,
    SalesChanged,
    ProductionChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::InventoryChanged => "INVENTORY_CHANGED",
            Topic::SalesChanged => "SALES_CHANGED",
            Topic::ProductionChanged => "PRODUCTION_CHANGED",
        }
    }
}

/// One published notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub topic: Topic,
    /// Short tag describing the change (`upsert:CU-001`, `SALE`, ...).
    pub reason: String,
}

/// Failure reported by a subscriber.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BusError(pub String);

impl BusError {
    pub fn new(message: impl Into<String>) -> Self {
        BusError(message.into())
    }
}

type Handler = Arc<dyn Fn(&ChangeEvent) -> Result<(), BusError> + Send + Sync>;

struct Subscriber {
    topic: Topic,
    handler: Handler,
}

/// Fan-out notifier shared by every engine.
#[derive(Default)]
pub struct ChangeBus {
    handlers: Mutex<Vec<Subscriber>>,
    channels: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.lock().map(|h| h.len()).unwrap_or(0);
        let channels = self.channels.lock().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("ChangeBus")
            .field("handlers", &handlers)
            .field("channels", &channels)
            .finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic`.
    pub fn subscribe<F>(&self, topic: Topic, handler: F)
    where
        F: Fn(&ChangeEvent) -> Result<(), BusError> + Send + Sync + 'static,
    {
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.push(Subscriber {
                topic,
                handler: Arc::new(handler),
            }),
            Err(_) => warn!(topic = topic.as_str(), "Handler registry poisoned; subscription dropped"),
        }
    }

    /// Returns a receiver that sees every event on every topic.
    ///
    /// The channel is unbounded: a receiver that is kept but never drained
    /// holds every event published after it subscribed. Dropping the
    /// receiver unsubscribes it on the next publish.
    pub fn subscribe_channel(&self) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        match self.channels.lock() {
            Ok(mut channels) => channels.push(tx),
            Err(_) => warn!("Channel registry poisoned; receiver will see no events"),
        }
        rx
    }

    /// Publishes `reason` on `topic`.
    ///
    /// Handlers are called outside the registry lock, so a handler may
    /// subscribe further handlers without deadlocking.
    pub fn publish(&self, topic: Topic, reason: impl Into<String>) {
        let event = ChangeEvent {
            topic,
            reason: reason.into(),
        };
        debug!(topic = topic.as_str(), reason = %event.reason, "Publishing change");

        let handlers: Vec<Handler> = match self.handlers.lock() {
            Ok(handlers) => handlers
                .iter()
                .filter(|s| s.topic == topic)
                .map(|s| Arc::clone(&s.handler))
                .collect(),
            Err(_) => {
                warn!(topic = topic.as_str(), "Handler registry poisoned");
                Vec::new()
            }
        };

        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(topic = topic.as_str(), error = %e, "Subscriber failed");
                }
                Err(_) => {
                    warn!(topic = topic.as_str(), "Subscriber panicked");
                }
            }
        }

        if let Ok(mut channels) = self.channels.lock() {
            channels.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handlers_only_see_their_topic() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.subscribe(Topic::SalesChanged, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(Topic::InventoryChanged, "clear");
        bus.publish(Topic::SalesChanged, "SALE");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_subscriber_is_isolated() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Topic::InventoryChanged, |_| Err(BusError::new("screen closed")));
        bus.subscribe(Topic::InventoryChanged, |_| panic!("boom"));
        let h = Arc::clone(&hits);
        bus.subscribe(Topic::InventoryChanged, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(Topic::InventoryChanged, "adjust:A");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_receives_and_drops() {
        let bus = ChangeBus::new();
        let rx = bus.subscribe_channel();

        bus.publish(Topic::ProductionChanged, "PRODUCTION");
        let event = rx.try_recv().unwrap();
        assert_eq!(event.topic, Topic::ProductionChanged);
        assert_eq!(event.reason, "PRODUCTION");

        drop(rx);
        bus.publish(Topic::ProductionChanged, "PRODUCTION");
        assert_eq!(bus.channels.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_poisoned_registry_does_not_panic_callers() {
        let bus = ChangeBus::new();
        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _held = bus.handlers.lock().unwrap();
            panic!("poison");
        }));

        bus.subscribe(Topic::SalesChanged, |_| Ok(()));
        bus.publish(Topic::SalesChanged, "SALE");
        assert!(bus.handlers.lock().is_err());
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::InventoryChanged.as_str(), "INVENTORY_CHANGED");
        assert_eq!(
            serde_json::to_string(&Topic::SalesChanged).unwrap(),
            "\"SALES_CHANGED\""
        );
    }
}
