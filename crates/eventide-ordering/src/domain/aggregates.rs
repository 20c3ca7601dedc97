//! Aggregate roots for the order lifecycle.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use eventide_core::aggregate::{Aggregate, AggregateBase, AggregateKind, Appliers, UnhandledEvent};
use eventide_core::clock::Clock;
use eventide_core::event::{CAUSATION_ID_HEADER, CORRELATION_ID_HEADER, DomainEvent, EventMessage};
use serde::Serialize;
use uuid::Uuid;

use super::events::{OrderCancelled, OrderCreated, OrderShipped};
use crate::error::OrderError;

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No `OrderCreated` has been applied yet.
    New,
    /// Placed and waiting to ship.
    Placed,
    /// Handed to a carrier.
    Shipped,
    /// Cancelled before shipping.
    Cancelled,
}

/// The aggregate root for a customer order.
#[derive(Debug)]
pub struct Order {
    base: AggregateBase,
    status: OrderStatus,
    customer: Option<String>,
    carrier: Option<String>,
    cancel_reason: Option<String>,
    placed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
}

static APPLIERS: LazyLock<Appliers<Order>> = LazyLock::new(|| {
    Appliers::new()
        .on::<OrderCreated>(Order::on_created)
        .on::<OrderShipped>(Order::on_shipped)
        .on::<OrderCancelled>(Order::on_cancelled)
});

impl Order {
    /// Places the order, producing an `OrderCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` if the order already exists or the
    /// customer is blank.
    pub fn create(
        &mut self,
        customer: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), OrderError> {
        if self.status != OrderStatus::New {
            return Err(OrderError::Validation(format!(
                "order {} already exists",
                self.aggregate_id()
            )));
        }
        if customer.trim().is_empty() {
            return Err(OrderError::Validation("customer must not be blank".into()));
        }

        self.record(
            OrderCreated {
                customer: customer.to_owned(),
                placed_at: clock.now(),
            },
            correlation_id,
        );
        Ok(())
    }

    /// Ships the order, producing an `OrderShipped` event.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` unless the order is placed, or if the
    /// carrier is blank.
    pub fn ship(
        &mut self,
        carrier: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), OrderError> {
        self.require_placed("ship")?;
        if carrier.trim().is_empty() {
            return Err(OrderError::Validation("carrier must not be blank".into()));
        }

        self.record(
            OrderShipped {
                carrier: carrier.to_owned(),
                shipped_at: clock.now(),
            },
            correlation_id,
        );
        Ok(())
    }

    /// Cancels the order, producing an `OrderCancelled` event.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` unless the order is placed.
    pub fn cancel(
        &mut self,
        reason: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), OrderError> {
        self.require_placed("cancel")?;

        self.record(
            OrderCancelled {
                reason: reason.to_owned(),
                cancelled_at: clock.now(),
            },
            correlation_id,
        );
        Ok(())
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// The customer, once placed.
    #[must_use]
    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    /// The carrier, once shipped.
    #[must_use]
    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    /// The cancellation reason, once cancelled.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// When the order was placed.
    #[must_use]
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// When the order shipped.
    #[must_use]
    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    fn require_placed(&self, action: &str) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Placed => Ok(()),
            OrderStatus::New => Err(OrderError::Validation(format!(
                "cannot {action} order {}: it has not been placed",
                self.aggregate_id()
            ))),
            OrderStatus::Shipped | OrderStatus::Cancelled => {
                Err(OrderError::Validation(format!(
                    "cannot {action} order {}: it is already {}",
                    self.aggregate_id(),
                    self.status.as_str()
                )))
            }
        }
    }

    fn record<E: DomainEvent>(&mut self, event: E, correlation_id: Uuid) {
        let mut message = EventMessage::new(
            self.aggregate_id().to_owned(),
            event,
            Some(self.current_version() + 1),
        );
        message.set_header(CORRELATION_ID_HEADER, correlation_id.to_string());
        message.set_header(CAUSATION_ID_HEADER, correlation_id.to_string());
        self.apply(message, true);
    }

    fn on_created(&mut self, event: &OrderCreated) {
        self.status = OrderStatus::Placed;
        self.customer = Some(event.customer.clone());
        self.placed_at = Some(event.placed_at);
    }

    fn on_shipped(&mut self, event: &OrderShipped) {
        self.status = OrderStatus::Shipped;
        self.carrier = Some(event.carrier.clone());
        self.shipped_at = Some(event.shipped_at);
    }

    fn on_cancelled(&mut self, event: &OrderCancelled) {
        self.status = OrderStatus::Cancelled;
        self.cancel_reason = Some(event.reason.clone());
    }
}

impl OrderStatus {
    /// Lowercase name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Placed => "placed",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Aggregate for Order {
    fn aggregate_type(&self) -> &'static str {
        Self::AGGREGATE_TYPE
    }

    fn base(&self) -> &AggregateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateBase {
        &mut self.base
    }

    fn mutate(&mut self, event: &EventMessage) -> Result<(), UnhandledEvent> {
        APPLIERS.dispatch(self, event)
    }
}

impl AggregateKind for Order {
    const AGGREGATE_TYPE: &'static str = "order";

    fn with_id(id: String) -> Self {
        Self {
            base: AggregateBase::new(id),
            status: OrderStatus::New,
            customer: None,
            carrier: None,
            cancel_reason: None,
            placed_at: None,
            shipped_at: None,
        }
    }
}
