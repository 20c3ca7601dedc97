//! Error types.
//!
//! `RepositoryError` is the only error a caller of
//! [`Repository`](crate::repository::Repository) ever sees. The other enums
//! belong to the collaborators behind it and are translated at the repository
//! boundary.

use thiserror::Error;

use crate::store::ExpectedVersion;

/// Boxed error used to carry an underlying cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by `Repository::load` and `Repository::save`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stream for this aggregate does not exist.
    #[error("could not find any aggregate of type {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        /// The requested aggregate type.
        aggregate_type: String,
        /// The requested aggregate identity.
        aggregate_id: String,
    },

    /// The stream head did not match the expected version on append.
    #[error(
        "concurrency violation on stream {stream_name} (aggregate {aggregate_id}): expected version {expected_version}; reload and retry"
    )]
    ConcurrencyViolation {
        /// The aggregate being saved.
        aggregate_id: String,
        /// The stream the append targeted.
        stream_name: String,
        /// The version the caller expected the stream head to be at.
        expected_version: ExpectedVersion,
    },

    /// The store refused the request.
    #[error("not authorized")]
    Unauthorized,

    /// The store is temporarily unreachable or timed out.
    #[error("the repository is temporarily unavailable")]
    RepositoryUnavailable,

    /// A committed event had no subscriber on the event bus.
    #[error("no event handler configured for event type {event_type}")]
    NoConfiguredEventHandler {
        /// The event type that could not be delivered.
        event_type: String,
    },

    /// Any other failure; the original cause is kept as the error source.
    #[error("an unexpected error occurred: {0}")]
    Unexpected(#[source] BoxError),
}

impl RepositoryError {
    /// Wraps an arbitrary failure as [`RepositoryError::Unexpected`].
    pub fn unexpected(err: impl Into<BoxError>) -> Self {
        Self::Unexpected(err.into())
    }

    /// Whether retrying the whole operation later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RepositoryUnavailable)
    }

    /// Whether the caller should reload the aggregate and retry the command.
    #[must_use]
    pub fn is_concurrency_violation(&self) -> bool {
        matches!(self, Self::ConcurrencyViolation { .. })
    }
}

/// Errors reported by an event store reader or writer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The reader reached the end of the stream. Not a failure.
    #[error("there are no more events to load")]
    NoMoreEvents,

    /// The stream does not exist.
    #[error("stream {stream} does not exist")]
    NotFound {
        /// The stream name.
        stream: String,
    },

    /// The stream was hard deleted.
    #[error("stream {stream} was deleted")]
    Deleted {
        /// The stream name.
        stream: String,
    },

    /// The caller lacks permission for the stream.
    #[error("not authorized")]
    Unauthorized,

    /// The store is not ready or the request timed out.
    #[error("event store is temporarily unavailable")]
    TemporarilyUnavailable,

    /// The store rejected the request as malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The compare-and-append check failed. Nothing was written.
    #[error("wrong expected version on stream {stream}: expected {expected}, stream head is {actual:?}")]
    WrongExpectedVersion {
        /// The stream name.
        stream: String,
        /// The version the writer expected.
        expected: ExpectedVersion,
        /// The stream head at the time of the append, `None` if the stream did not exist.
        actual: Option<i64>,
    },

    /// Any backend-specific failure.
    #[error("event store failure: {0}")]
    Other(#[source] BoxError),
}

/// Errors reported by an event bus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// No handler is subscribed to the event type.
    #[error("no event handler configured for event type {event_type}")]
    NoConfiguredEventHandler {
        /// The event type that was published.
        event_type: String,
    },
}

/// Errors reported by a stream namer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamNamerError {
    /// A delegate is already registered for the aggregate type.
    #[error("the stream name delegate for \"{aggregate_type}\" is already registered")]
    DuplicateRegistration {
        /// The aggregate type.
        aggregate_type: String,
    },

    /// No delegate is registered for the aggregate type.
    #[error("there is no stream name delegate for aggregate type \"{aggregate_type}\"")]
    NoDelegate {
        /// The aggregate type.
        aggregate_type: String,
    },
}

/// Errors reported by the aggregate and event factories.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The aggregate factory has nothing registered under this type name.
    #[error("no aggregate factory registered for aggregate type {0}")]
    UnknownAggregateType(String),

    /// The factory produced an aggregate of another concrete type.
    #[error("expected aggregate type {expected}, factory produced {found}")]
    AggregateTypeMismatch {
        /// The type the caller asked for.
        expected: &'static str,
        /// The type the factory produced.
        found: &'static str,
    },

    /// The event factory has nothing registered under this type name.
    #[error("no event registered for event type {0}")]
    UnknownEventType(String),

    /// The stored payload could not be decoded into the registered event.
    #[error("failed to decode event {event_type}: {source}")]
    Decode {
        /// The event type being decoded.
        event_type: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Repository wiring errors, reported before the repository can be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required collaborator was not provided to the builder.
    #[error("repository is missing a required collaborator: {0}")]
    MissingCollaborator(&'static str),
}
