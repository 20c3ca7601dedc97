//! Command handlers for the order lifecycle.
//!
//! Each handler loads (or creates) the order, runs the domain operation and
//! saves the resulting events through the repository.

use eventide_core::aggregate::{Aggregate, AggregateKind};
use eventide_core::clock::Clock;
use eventide_core::command::Command;
use eventide_core::event::EventMessage;
use eventide_core::repository::{Repository, RepositoryExt};
use eventide_core::store::ExpectedVersion;
use tracing::debug;

use crate::domain::aggregates::Order;
use crate::domain::commands::{CancelOrder, CreateOrder, ShipOrder};
use crate::error::OrderError;

/// Handles the `CreateOrder` command. The order's stream must not exist yet.
///
/// # Errors
///
/// Returns `OrderError::Validation` for an invalid command, and
/// `OrderError::Repository` with a concurrency violation if the order already
/// exists.
pub async fn handle_create_order(
    command: &CreateOrder,
    clock: &dyn Clock,
    repository: &dyn Repository,
) -> Result<Vec<EventMessage>, OrderError> {
    let mut order = Order::with_id(command.order_id.clone());
    order.create(&command.customer, command.correlation_id(), clock)?;

    let committed = repository
        .save(&mut order, Some(ExpectedVersion::NO_STREAM))
        .await?;
    debug!(command = command.command_type(), order_id = %command.order_id, "order created");
    Ok(committed)
}

/// Handles the `ShipOrder` command.
///
/// # Errors
///
/// Returns `OrderError::Validation` if the order cannot ship, and
/// `OrderError::Repository` if it does not exist or changed since
/// `expected_version`.
pub async fn handle_ship_order(
    command: &ShipOrder,
    clock: &dyn Clock,
    repository: &dyn Repository,
) -> Result<Vec<EventMessage>, OrderError> {
    let mut order = repository.load_as::<Order>(&command.order_id).await?;
    order.ship(&command.carrier, command.correlation_id(), clock)?;
    save(command, &mut order, repository).await
}

/// Handles the `CancelOrder` command.
///
/// # Errors
///
/// Returns `OrderError::Validation` if the order cannot be cancelled, and
/// `OrderError::Repository` if it does not exist or changed since
/// `expected_version`.
pub async fn handle_cancel_order(
    command: &CancelOrder,
    clock: &dyn Clock,
    repository: &dyn Repository,
) -> Result<Vec<EventMessage>, OrderError> {
    let mut order = repository.load_as::<Order>(&command.order_id).await?;
    order.cancel(&command.reason, command.correlation_id(), clock)?;
    save(command, &mut order, repository).await
}

/// Saves against the caller's expected version, falling back to the version
/// the order was loaded at.
async fn save(
    command: &dyn Command,
    order: &mut Order,
    repository: &dyn Repository,
) -> Result<Vec<EventMessage>, OrderError> {
    let expected = command
        .expected_version()
        .unwrap_or_else(|| order.original_version());
    let committed = repository.save(order, Some(expected)).await?;
    debug!(
        command = command.command_type(),
        order_id = command.aggregate_id(),
        expected,
        "order saved"
    );
    Ok(committed)
}
