//! The event-sourcing protocol.
//!
//! Aggregates rebuilt from their event history, the envelope events travel
//! in, the event store port, an in-process event bus and the repository that
//! ties them together. This crate contains no storage backend.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod command;
pub mod downcast;
pub mod error;
pub mod event;
pub mod factory;
pub mod repository;
pub mod store;
pub mod stream_namer;

pub use aggregate::{Aggregate, AggregateBase, AggregateKind, Appliers, UnhandledEvent};
pub use bus::{EventBus, EventHandler, InProcessEventBus};
pub use error::{
    BusError, ConfigError, FactoryError, RepositoryError, StoreError, StreamNamerError,
};
pub use event::{DomainEvent, EventMessage, Headers};
pub use factory::{AggregateFactory, AggregateRegistry, EventFactory, EventRegistry};
pub use repository::{EventSourcedRepository, Repository, RepositoryBuilder, RepositoryExt};
pub use store::{EventData, EventStore, ExpectedVersion, RecordedEvent, StreamReader, StreamWriter};
pub use stream_namer::{DelegateStreamNamer, StreamNamer};
