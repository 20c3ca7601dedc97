//! Query handlers for the order lifecycle.
//!
//! Queries replay the order and return a read-only view DTO.

use chrono::{DateTime, Utc};
use eventide_core::aggregate::Aggregate;
use eventide_core::repository::{Repository, RepositoryExt};
use serde::Serialize;

use crate::domain::aggregates::{Order, OrderStatus};
use crate::error::OrderError;

/// Read-only view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    /// The order identifier.
    pub order_id: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// The customer who placed the order.
    pub customer: Option<String>,
    /// The carrier, once shipped.
    pub carrier: Option<String>,
    /// The cancellation reason, once cancelled.
    pub cancel_reason: Option<String>,
    /// When the order was placed.
    pub placed_at: Option<DateTime<Utc>>,
    /// When the order shipped.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Stream position of the last event; pass it back as the expected
    /// version of the next command.
    pub version: i64,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.aggregate_id().to_owned(),
            status: order.status(),
            customer: order.customer().map(str::to_owned),
            carrier: order.carrier().map(str::to_owned),
            cancel_reason: order.cancel_reason().map(str::to_owned),
            placed_at: order.placed_at(),
            shipped_at: order.shipped_at(),
            version: order.current_version(),
        }
    }
}

/// Retrieves an order by its identity.
///
/// # Errors
///
/// Returns `OrderError::Repository` wrapping `AggregateNotFound` if the order
/// has no stream, or any other repository failure.
pub async fn get_order_by_id(
    order_id: &str,
    repository: &dyn Repository,
) -> Result<OrderView, OrderError> {
    let order = repository.load_as::<Order>(order_id).await?;
    Ok(OrderView::from(&order))
}
