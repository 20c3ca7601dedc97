//! Customer notifications driven by committed order events.

use std::sync::Mutex;

use eventide_core::bus::EventHandler;
use eventide_core::event::EventMessage;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::events::{OrderCancelled, OrderCreated, OrderShipped};

/// A message queued for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// The order the message is about.
    pub order_id: String,
    /// The event that triggered it, for deduplication downstream.
    pub event_id: String,
    /// Human-readable text.
    pub message: String,
}

/// Turns order events into customer notifications.
///
/// Notifications are kept in an in-process outbox. Redelivered events are
/// recognised by event ID and ignored.
#[derive(Debug, Default)]
pub struct CustomerNotifier {
    outbox: Mutex<Vec<Notification>>,
}

impl CustomerNotifier {
    /// Handler name on the event bus.
    pub const NAME: &'static str = "ordering.customer_notifier";

    /// Creates a notifier with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the outbox.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn compose(event: &EventMessage) -> Option<String> {
        if let Some(created) = event.payload_as::<OrderCreated>() {
            return Some(format!("Thanks {}, your order is confirmed.", created.customer));
        }
        if let Some(shipped) = event.payload_as::<OrderShipped>() {
            return Some(format!("Your order is on its way with {}.", shipped.carrier));
        }
        event
            .payload_as::<OrderCancelled>()
            .map(|cancelled| format!("Your order was cancelled: {}.", cancelled.reason))
    }
}

impl EventHandler for CustomerNotifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, event: &EventMessage) {
        let Some(message) = Self::compose(event) else {
            warn!(event_type = event.event_type(), "notifier received an event it does not handle");
            return;
        };
        let event_id = event.event_id().to_string();

        let mut outbox = match self.outbox.lock() {
            Ok(outbox) => outbox,
            Err(poisoned) => poisoned.into_inner(),
        };
        if outbox.iter().any(|sent| sent.event_id == event_id) {
            return;
        }
        info!(order_id = event.aggregate_id(), %message, "customer notified");
        outbox.push(Notification {
            order_id: event.aggregate_id().to_owned(),
            event_id,
            message,
        });
    }
}
