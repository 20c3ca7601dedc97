//! Factories that turn type names back into aggregates and events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::aggregate::{Aggregate, AggregateKind};
use crate::error::FactoryError;
use crate::event::{DomainEvent, EventPayload};

/// Produces a fresh aggregate for a type name and identity.
pub trait AggregateFactory: Send + Sync {
    /// Returns a new aggregate at version `-1`, or `None` if the type is
    /// unknown.
    fn get_aggregate(&self, aggregate_type: &str, aggregate_id: &str) -> Option<Box<dyn Aggregate>>;
}

/// Decodes stored payloads into typed events.
pub trait EventFactory: Send + Sync {
    /// Decodes `data` as the event registered under `event_type`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::UnknownEventType`] if nothing is registered
    /// under `event_type`, or [`FactoryError::Decode`] if `data` does not
    /// match the registered event.
    fn make_event(
        &self,
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<Arc<dyn EventPayload>, FactoryError>;
}

type MakeAggregateFn = fn(String) -> Box<dyn Aggregate>;

fn make_aggregate<A: AggregateKind>(id: String) -> Box<dyn Aggregate> {
    Box::new(A::with_id(id))
}

/// Aggregate factory backed by a type name lookup table.
#[derive(Default)]
pub struct AggregateRegistry {
    constructors: HashMap<&'static str, MakeAggregateFn>,
}

impl AggregateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `A` under [`AggregateKind::AGGREGATE_TYPE`].
    #[must_use]
    pub fn register<A: AggregateKind>(mut self) -> Self {
        self.constructors
            .insert(A::AGGREGATE_TYPE, make_aggregate::<A>);
        self
    }

    /// Whether `aggregate_type` is registered.
    #[must_use]
    pub fn contains(&self, aggregate_type: &str) -> bool {
        self.constructors.contains_key(aggregate_type)
    }
}

impl AggregateFactory for AggregateRegistry {
    fn get_aggregate(&self, aggregate_type: &str, aggregate_id: &str) -> Option<Box<dyn Aggregate>> {
        self.constructors
            .get(aggregate_type)
            .map(|make| make(aggregate_id.to_owned()))
    }
}

impl fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.constructors.keys().collect();
        types.sort_unstable();
        f.debug_struct("AggregateRegistry")
            .field("aggregate_types", &types)
            .finish()
    }
}

type DecodeFn = fn(&serde_json::Value) -> Result<Arc<dyn EventPayload>, serde_json::Error>;

fn decode<E: DomainEvent>(data: &serde_json::Value) -> Result<Arc<dyn EventPayload>, serde_json::Error> {
    let event: E = Deserialize::deserialize(data)?;
    Ok(Arc::new(event))
}

/// Event factory backed by a type name lookup table.
#[derive(Default)]
pub struct EventRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `E` under [`DomainEvent::EVENT_TYPE`].
    #[must_use]
    pub fn register<E: DomainEvent>(mut self) -> Self {
        self.decoders.insert(E::EVENT_TYPE, decode::<E>);
        self
    }

    /// Whether `event_type` is registered.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }
}

impl EventFactory for EventRegistry {
    fn make_event(
        &self,
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<Arc<dyn EventPayload>, FactoryError> {
        let decode = self
            .decoders
            .get(event_type)
            .ok_or_else(|| FactoryError::UnknownEventType(event_type.to_owned()))?;
        decode(data).map_err(|source| FactoryError::Decode {
            event_type: event_type.to_owned(),
            source,
        })
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.decoders.keys().collect();
        types.sort_unstable();
        f.debug_struct("EventRegistry")
            .field("event_types", &types)
            .finish()
    }
}
