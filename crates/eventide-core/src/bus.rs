//! In-process publication of committed events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::BusError;
use crate::event::EventMessage;

/// A subscriber to committed events.
///
/// Delivery is at-least-once from the repository's point of view, so
/// handlers should be idempotent.
pub trait EventHandler: Send + Sync {
    /// Identity of the handler. Two handlers with the same name are the same
    /// subscriber.
    fn name(&self) -> &str;

    /// Handles one event. Runs synchronously on the publisher's task.
    fn handle(&self, event: &EventMessage);
}

/// Routes events to the handlers subscribed to their type.
pub trait EventBus: Send + Sync {
    /// Delivers `event` to every handler subscribed to its type.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoConfiguredEventHandler`] if nobody is subscribed.
    fn publish_event(&self, event: &EventMessage) -> Result<(), BusError>;

    /// Subscribes `handler` to each of `event_types`. Subscribing the same
    /// handler to the same type twice has no effect.
    fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>, event_types: &[&str]);
}

/// Synchronous event bus that dispatches in subscription order.
#[derive(Default)]
pub struct InProcessEventBus {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl InProcessEventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers subscribed to `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }
}

impl EventBus for InProcessEventBus {
    fn publish_event(&self, event: &EventMessage) -> Result<(), BusError> {
        let event_type = event.event_type();
        let Some(handlers) = self.handlers.get(event_type).filter(|h| !h.is_empty()) else {
            warn!(event_type, event_id = %event.event_id(), "no event handler configured");
            return Err(BusError::NoConfiguredEventHandler {
                event_type: event_type.to_owned(),
            });
        };

        for handler in handlers {
            trace!(event_type, handler = handler.name(), "dispatching event");
            handler.handle(event);
        }
        Ok(())
    }

    fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>, event_types: &[&str]) {
        for event_type in event_types {
            let subscribed = self.handlers.entry((*event_type).to_owned()).or_default();
            if subscribed.iter().any(|h| h.name() == handler.name()) {
                continue;
            }
            subscribed.push(Arc::clone(&handler));
        }
    }
}

impl fmt::Debug for InProcessEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions: HashMap<&str, Vec<&str>> = self
            .handlers
            .iter()
            .map(|(event_type, handlers)| {
                (
                    event_type.as_str(),
                    handlers.iter().map(|h| h.name()).collect(),
                )
            })
            .collect();
        f.debug_struct("InProcessEventBus")
            .field("subscriptions", &subscriptions)
            .finish()
    }
}
