//! Load and save aggregates through an event store.
//!
//! The repository is the only place collaborator errors are translated into
//! [`RepositoryError`]. It holds no per-aggregate state and never retries.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::field::Empty;
use tracing::{Span, debug, instrument, warn};

use crate::aggregate::{Aggregate, AggregateKind};
use crate::bus::EventBus;
use crate::downcast::AsAny;
use crate::error::{BusError, ConfigError, FactoryError, RepositoryError, StoreError};
use crate::event::{AGGREGATE_ID_HEADER, EventMessage};
use crate::factory::{AggregateFactory, EventFactory};
use crate::store::{EventData, EventStore, ExpectedVersion};
use crate::stream_namer::StreamNamer;

/// Loads aggregates by replaying their stream and saves their pending
/// changes.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Replays the stream of the identified aggregate into a fresh instance.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::AggregateNotFound`] if the stream does not exist.
    /// - [`RepositoryError::Unauthorized`] / [`RepositoryError::RepositoryUnavailable`]
    ///   if the store refuses or is unreachable.
    /// - [`RepositoryError::Unexpected`] for anything else.
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Box<dyn Aggregate>, RepositoryError>;

    /// Appends the aggregate's pending changes and publishes them.
    ///
    /// `expected_version` uses the numeric encoding of [`ExpectedVersion`];
    /// `None` appends unconditionally. Returns the committed envelopes.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::ConcurrencyViolation`] if the stream head moved.
    ///   Nothing was written and the aggregate keeps its changes.
    /// - [`RepositoryError::NoConfiguredEventHandler`] if a committed event had
    ///   no subscriber. The events are already persisted.
    /// - The store translations listed on [`Repository::load`].
    async fn save(
        &self,
        aggregate: &mut dyn Aggregate,
        expected_version: Option<i64>,
    ) -> Result<Vec<EventMessage>, RepositoryError>;
}

/// Typed helpers over any [`Repository`].
#[async_trait]
pub trait RepositoryExt: Repository {
    /// Loads the aggregate registered as `A` and downcasts it.
    ///
    /// # Errors
    ///
    /// Any error from [`Repository::load`], or
    /// [`RepositoryError::Unexpected`] if the factory built another type.
    async fn load_as<A: AggregateKind>(&self, aggregate_id: &str) -> Result<A, RepositoryError> {
        let aggregate = self.load(A::AGGREGATE_TYPE, aggregate_id).await?;
        let found = aggregate.aggregate_type();
        AsAny::into_any(aggregate)
            .downcast::<A>()
            .map(|aggregate| *aggregate)
            .map_err(|_| {
                RepositoryError::unexpected(FactoryError::AggregateTypeMismatch {
                    expected: A::AGGREGATE_TYPE,
                    found,
                })
            })
    }
}

impl<R: Repository + ?Sized> RepositoryExt for R {}

/// Repository over an [`EventStore`], wired with a [`RepositoryBuilder`].
pub struct EventSourcedRepository {
    store: Arc<dyn EventStore>,
    stream_namer: Arc<dyn StreamNamer>,
    aggregates: Arc<dyn AggregateFactory>,
    events: Arc<dyn EventFactory>,
    bus: Option<Arc<dyn EventBus>>,
}

impl EventSourcedRepository {
    /// Starts wiring a repository.
    #[must_use]
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::default()
    }

    fn publish(&self, events: &[EventMessage]) -> Result<(), RepositoryError> {
        let Some(bus) = &self.bus else {
            return Ok(());
        };

        let mut first_failure = None;
        for event in events {
            match bus.publish_event(event) {
                Ok(()) => debug!(event_type = event.event_type(), "event published"),
                Err(BusError::NoConfiguredEventHandler { event_type }) => {
                    warn!(%event_type, event_id = %event.event_id(), "committed event was not delivered");
                    if first_failure.is_none() {
                        first_failure = Some(RepositoryError::NoConfiguredEventHandler { event_type });
                    }
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Repository for EventSourcedRepository {
    #[instrument(skip(self), fields(stream = Empty))]
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Box<dyn Aggregate>, RepositoryError> {
        let mut aggregate = self
            .aggregates
            .get_aggregate(aggregate_type, aggregate_id)
            .ok_or_else(|| {
                RepositoryError::unexpected(FactoryError::UnknownAggregateType(
                    aggregate_type.to_owned(),
                ))
            })?;
        let stream_name = self
            .stream_namer
            .stream_name(aggregate_type, aggregate_id)
            .map_err(RepositoryError::unexpected)?;
        Span::current().record("stream", stream_name.as_str());

        let mut reader = self.store.stream_reader(&stream_name);
        loop {
            let recorded = match reader.next().await {
                Ok(recorded) => recorded,
                Err(StoreError::NoMoreEvents) => break,
                Err(StoreError::NotFound { .. }) => {
                    return Err(RepositoryError::AggregateNotFound {
                        aggregate_type: aggregate_type.to_owned(),
                        aggregate_id: aggregate_id.to_owned(),
                    });
                }
                Err(err) => return Err(translate_store_error(err)),
            };

            let payload = self
                .events
                .make_event(&recorded.event_type, &recorded.data)
                .map_err(RepositoryError::unexpected)?;
            let headers = recorded
                .scan_headers()
                .map_err(RepositoryError::unexpected)?;
            let message = EventMessage::replayed(
                aggregate_id,
                recorded.event_id,
                payload,
                headers,
                recorded.stream_position,
            );
            // Stored history may contain events this build no longer handles.
            aggregate
                .mutate(&message)
                .map_err(RepositoryError::unexpected)?;
            aggregate.increment_version();
        }

        debug!(version = aggregate.current_version(), "aggregate loaded");
        Ok(aggregate)
    }

    #[instrument(
        skip(self, aggregate),
        fields(
            aggregate_type = aggregate.aggregate_type(),
            aggregate_id = aggregate.aggregate_id(),
            stream = Empty,
        )
    )]
    async fn save(
        &self,
        aggregate: &mut dyn Aggregate,
        expected_version: Option<i64>,
    ) -> Result<Vec<EventMessage>, RepositoryError> {
        let expected = match expected_version {
            None => ExpectedVersion::Any,
            Some(raw) => ExpectedVersion::try_from(raw).map_err(RepositoryError::unexpected)?,
        };
        let aggregate_id = aggregate.aggregate_id().to_owned();
        let stream_name = self
            .stream_namer
            .stream_name(aggregate.aggregate_type(), &aggregate_id)
            .map_err(RepositoryError::unexpected)?;
        Span::current().record("stream", stream_name.as_str());

        let mut changes = aggregate.changes().to_vec();
        if changes.is_empty() {
            debug!("no pending changes");
            return Ok(changes);
        }

        for change in &mut changes {
            change.set_header(AGGREGATE_ID_HEADER, aggregate_id.as_str());
        }
        let events = changes
            .iter()
            .map(EventData::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::unexpected)?;

        let mut writer = self.store.stream_writer(&stream_name);
        writer
            .append(expected, events)
            .await
            .map_err(|err| match err {
                StoreError::WrongExpectedVersion { .. } => RepositoryError::ConcurrencyViolation {
                    aggregate_id: aggregate_id.clone(),
                    stream_name: stream_name.clone(),
                    expected_version: expected,
                },
                other => translate_store_error(other),
            })?;

        aggregate.clear_changes();
        for change in &mut changes {
            change.commit();
        }
        if let Some(mut position) = expected.next_position() {
            for change in &mut changes {
                change.restamp(position);
                position += 1;
            }
        }
        debug!(count = changes.len(), %expected, "events appended");

        self.publish(&changes)?;
        Ok(changes)
    }
}

impl fmt::Debug for EventSourcedRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourcedRepository")
            .field("has_event_bus", &self.bus.is_some())
            .finish_non_exhaustive()
    }
}

fn translate_store_error(err: StoreError) -> RepositoryError {
    match err {
        StoreError::Unauthorized => RepositoryError::Unauthorized,
        StoreError::TemporarilyUnavailable => RepositoryError::RepositoryUnavailable,
        other => RepositoryError::unexpected(other),
    }
}

/// Collects the collaborators of an [`EventSourcedRepository`].
///
/// The event bus is optional; everything else is required.
#[derive(Default)]
pub struct RepositoryBuilder {
    store: Option<Arc<dyn EventStore>>,
    stream_namer: Option<Arc<dyn StreamNamer>>,
    aggregates: Option<Arc<dyn AggregateFactory>>,
    events: Option<Arc<dyn EventFactory>>,
    bus: Option<Arc<dyn EventBus>>,
}

impl RepositoryBuilder {
    /// Sets the event store.
    #[must_use]
    pub fn event_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the stream namer.
    #[must_use]
    pub fn stream_namer(mut self, stream_namer: Arc<dyn StreamNamer>) -> Self {
        self.stream_namer = Some(stream_namer);
        self
    }

    /// Sets the aggregate factory.
    #[must_use]
    pub fn aggregate_factory(mut self, aggregates: Arc<dyn AggregateFactory>) -> Self {
        self.aggregates = Some(aggregates);
        self
    }

    /// Sets the event factory.
    #[must_use]
    pub fn event_factory(mut self, events: Arc<dyn EventFactory>) -> Self {
        self.events = Some(events);
        self
    }

    /// Sets the event bus committed events are published on.
    #[must_use]
    pub fn event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Finishes wiring.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCollaborator`] naming the first required
    /// collaborator that was not set.
    pub fn build(self) -> Result<EventSourcedRepository, ConfigError> {
        Ok(EventSourcedRepository {
            store: self
                .store
                .ok_or(ConfigError::MissingCollaborator("event store"))?,
            stream_namer: self
                .stream_namer
                .ok_or(ConfigError::MissingCollaborator("stream namer"))?,
            aggregates: self
                .aggregates
                .ok_or(ConfigError::MissingCollaborator("aggregate factory"))?,
            events: self
                .events
                .ok_or(ConfigError::MissingCollaborator("event factory"))?,
            bus: self.bus,
        })
    }
}
