//! Domain events for the order lifecycle.

use chrono::{DateTime, Utc};
use eventide_core::event::DomainEvent;
use serde::{Deserialize, Serialize};

/// Emitted when an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// The customer who placed the order.
    pub customer: String,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

impl DomainEvent for OrderCreated {
    const EVENT_TYPE: &'static str = "OrderCreated";
}

/// Emitted when an order leaves the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    /// The carrier handling delivery.
    pub carrier: String,
    /// When the order was handed to the carrier.
    pub shipped_at: DateTime<Utc>,
}

impl DomainEvent for OrderShipped {
    const EVENT_TYPE: &'static str = "OrderShipped";
}

/// Emitted when an order is cancelled before shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    /// Why the order was cancelled.
    pub reason: String,
    /// When the order was cancelled.
    pub cancelled_at: DateTime<Utc>,
}

impl DomainEvent for OrderCancelled {
    const EVENT_TYPE: &'static str = "OrderCancelled";
}

/// Every event type the order aggregate produces.
pub const ORDER_EVENT_TYPES: [&str; 3] = [
    OrderCreated::EVENT_TYPE,
    OrderShipped::EVENT_TYPE,
    OrderCancelled::EVENT_TYPE,
];
