//! Mapping from aggregate type and identity to a stream name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StreamNamerError;

/// Resolves the storage stream for an aggregate.
pub trait StreamNamer: Send + Sync {
    /// Returns the stream name for the aggregate. Must be deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`StreamNamerError::NoDelegate`] if the aggregate type is not
    /// known to the namer.
    fn stream_name(&self, aggregate_type: &str, aggregate_id: &str)
    -> Result<String, StreamNamerError>;
}

/// A stream name mapping function: `(aggregate_type, aggregate_id) -> stream`.
pub type StreamNameDelegate = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Stream namer that holds one delegate per aggregate type.
///
/// A delegate may be shared by several aggregate types. Registration happens
/// once, before the namer is handed to a repository.
#[derive(Default)]
pub struct DelegateStreamNamer {
    delegates: HashMap<String, StreamNameDelegate>,
}

impl DelegateStreamNamer {
    /// Creates a namer with no delegates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `delegate` for every type in `aggregate_types`.
    ///
    /// Either all types are registered or none are.
    ///
    /// # Errors
    ///
    /// Returns [`StreamNamerError::DuplicateRegistration`] if any type is
    /// already registered or appears twice in `aggregate_types`. Existing
    /// registrations are left untouched.
    pub fn register_delegate<F>(
        &mut self,
        delegate: F,
        aggregate_types: &[&str],
    ) -> Result<(), StreamNamerError>
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        for (index, aggregate_type) in aggregate_types.iter().enumerate() {
            let listed_twice = aggregate_types[..index].contains(aggregate_type);
            if listed_twice || self.delegates.contains_key(*aggregate_type) {
                return Err(StreamNamerError::DuplicateRegistration {
                    aggregate_type: (*aggregate_type).to_owned(),
                });
            }
        }

        let delegate: StreamNameDelegate = Arc::new(delegate);
        for aggregate_type in aggregate_types {
            self.delegates
                .insert((*aggregate_type).to_owned(), Arc::clone(&delegate));
        }
        Ok(())
    }

    /// Whether a delegate is registered for `aggregate_type`.
    #[must_use]
    pub fn is_registered(&self, aggregate_type: &str) -> bool {
        self.delegates.contains_key(aggregate_type)
    }
}

impl StreamNamer for DelegateStreamNamer {
    fn stream_name(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<String, StreamNamerError> {
        self.delegates
            .get(aggregate_type)
            .map(|delegate| delegate(aggregate_type, aggregate_id))
            .ok_or_else(|| StreamNamerError::NoDelegate {
                aggregate_type: aggregate_type.to_owned(),
            })
    }
}

impl fmt::Debug for DelegateStreamNamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aggregate_types: Vec<_> = self.delegates.keys().collect();
        aggregate_types.sort_unstable();
        f.debug_struct("DelegateStreamNamer")
            .field("aggregate_types", &aggregate_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_and_id(aggregate_type: &str, aggregate_id: &str) -> String {
        format!("{aggregate_type}-{aggregate_id}")
    }

    #[test]
    fn test_get_stream_name_uses_registered_delegate() {
        // Arrange
        let mut namer = DelegateStreamNamer::new();
        namer.register_delegate(type_and_id, &["order"]).unwrap();

        // Act
        let stream = namer.stream_name("order", "Order-1").unwrap();

        // Assert
        assert_eq!(stream, "order-Order-1");
    }

    #[test]
    fn test_stream_name_is_deterministic() {
        let mut namer = DelegateStreamNamer::new();
        namer.register_delegate(type_and_id, &["order"]).unwrap();

        let first = namer.stream_name("order", "Order-1").unwrap();
        let second = namer.stream_name("order", "Order-1").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_one_delegate_can_serve_several_aggregate_types() {
        let mut namer = DelegateStreamNamer::new();
        namer
            .register_delegate(type_and_id, &["order", "invoice"])
            .unwrap();

        assert_eq!(namer.stream_name("order", "1").unwrap(), "order-1");
        assert_eq!(namer.stream_name("invoice", "2").unwrap(), "invoice-2");
    }

    #[test]
    fn test_unregistered_type_returns_no_delegate_error() {
        let mut namer = DelegateStreamNamer::new();
        namer.register_delegate(type_and_id, &["order"]).unwrap();

        let err = namer.stream_name("invoice", "1").unwrap_err();

        assert_eq!(
            err,
            StreamNamerError::NoDelegate {
                aggregate_type: "invoice".into()
            }
        );
        assert_eq!(
            err.to_string(),
            "there is no stream name delegate for aggregate type \"invoice\""
        );
    }

    #[test]
    fn test_registering_twice_fails_and_keeps_first_mapping() {
        // Arrange
        let mut namer = DelegateStreamNamer::new();
        namer.register_delegate(type_and_id, &["order"]).unwrap();

        // Act
        let err = namer
            .register_delegate(|_, id| id.to_owned(), &["order"])
            .unwrap_err();

        // Assert
        assert_eq!(
            err,
            StreamNamerError::DuplicateRegistration {
                aggregate_type: "order".into()
            }
        );
        assert_eq!(namer.stream_name("order", "Order-1").unwrap(), "order-Order-1");
    }

    #[test]
    fn test_failed_registration_registers_nothing() {
        let mut namer = DelegateStreamNamer::new();
        namer.register_delegate(type_and_id, &["order"]).unwrap();

        let result = namer.register_delegate(|_, id| id.to_owned(), &["invoice", "order"]);

        assert!(result.is_err());
        assert!(!namer.is_registered("invoice"));
    }

    #[test]
    fn test_type_listed_twice_in_one_call_is_rejected() {
        let mut namer = DelegateStreamNamer::new();

        let result = namer.register_delegate(type_and_id, &["order", "order"]);

        assert!(result.is_err());
        assert!(!namer.is_registered("order"));
    }
}
