//! Commands for the order lifecycle.

use eventide_core::command::Command;
use uuid::Uuid;

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identity of the new order.
    pub order_id: String,
    /// The customer placing the order.
    pub customer: String,
}

/// Command to ship a placed order.
#[derive(Debug, Clone)]
pub struct ShipOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to ship.
    pub order_id: String,
    /// The carrier handling delivery.
    pub carrier: String,
    /// The order version the caller last saw, if it should be checked.
    pub expected_version: Option<i64>,
}

/// Command to cancel a placed order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to cancel.
    pub order_id: String,
    /// Why the order is cancelled.
    pub reason: String,
    /// The order version the caller last saw, if it should be checked.
    pub expected_version: Option<i64>,
}

impl Command for CreateOrder {
    fn command_type(&self) -> &'static str {
        "ordering.create_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> &str {
        &self.order_id
    }
}

impl Command for ShipOrder {
    fn command_type(&self) -> &'static str {
        "ordering.ship_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> &str {
        &self.order_id
    }

    fn expected_version(&self) -> Option<i64> {
        self.expected_version
    }
}

impl Command for CancelOrder {
    fn command_type(&self) -> &'static str {
        "ordering.cancel_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> &str {
        &self.order_id
    }

    fn expected_version(&self) -> Option<i64> {
        self.expected_version
    }
}
