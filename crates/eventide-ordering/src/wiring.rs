//! Plugs the order context into an event-sourced repository.

use std::sync::Arc;

use eventide_core::aggregate::AggregateKind;
use eventide_core::bus::{EventBus, EventHandler};
use eventide_core::error::{ConfigError, StreamNamerError};
use eventide_core::factory::{AggregateRegistry, EventRegistry};
use eventide_core::repository::EventSourcedRepository;
use eventide_core::store::EventStore;
use eventide_core::stream_namer::DelegateStreamNamer;
use thiserror::Error;

use crate::domain::aggregates::Order;
use crate::domain::events::{ORDER_EVENT_TYPES, OrderCancelled, OrderCreated, OrderShipped};

/// Failure to assemble the order repository.
#[derive(Debug, Error)]
pub enum WiringError {
    /// A stream name delegate could not be registered.
    #[error(transparent)]
    StreamNamer(#[from] StreamNamerError),

    /// The repository was missing a collaborator.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Stream name for an aggregate: `"{aggregate_type}-{aggregate_id}"`.
#[must_use]
pub fn stream_name(aggregate_type: &str, aggregate_id: &str) -> String {
    format!("{aggregate_type}-{aggregate_id}")
}

/// Registers the order stream naming scheme.
///
/// # Errors
///
/// Returns `StreamNamerError::DuplicateRegistration` if orders are already
/// registered with `namer`.
pub fn register_stream_names(namer: &mut DelegateStreamNamer) -> Result<(), StreamNamerError> {
    namer.register_delegate(stream_name, &[Order::AGGREGATE_TYPE])
}

/// Aggregate factory that knows the order aggregate.
#[must_use]
pub fn aggregate_registry() -> AggregateRegistry {
    AggregateRegistry::new().register::<Order>()
}

/// Event factory that knows every order event.
#[must_use]
pub fn event_registry() -> EventRegistry {
    EventRegistry::new()
        .register::<OrderCreated>()
        .register::<OrderShipped>()
        .register::<OrderCancelled>()
}

/// Subscribes `handler` to every order event type.
pub fn subscribe_to_order_events(bus: &mut dyn EventBus, handler: Arc<dyn EventHandler>) {
    bus.add_event_handler(handler, &ORDER_EVENT_TYPES);
}

/// Builds a repository for orders over `store`, publishing on `bus` if given.
///
/// # Errors
///
/// Returns `WiringError` if the stream namer or repository cannot be built.
pub fn order_repository(
    store: Arc<dyn EventStore>,
    bus: Option<Arc<dyn EventBus>>,
) -> Result<EventSourcedRepository, WiringError> {
    let mut namer = DelegateStreamNamer::new();
    register_stream_names(&mut namer)?;

    let mut builder = EventSourcedRepository::builder()
        .event_store(store)
        .stream_namer(Arc::new(namer))
        .aggregate_factory(Arc::new(aggregate_registry()))
        .event_factory(Arc::new(event_registry()));
    if let Some(bus) = bus {
        builder = builder.event_bus(bus);
    }
    Ok(builder.build()?)
}
