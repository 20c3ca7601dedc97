//! Commands: requests to change one aggregate.

use uuid::Uuid;

/// A request addressed to a single aggregate.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The command name, for logging.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried onto every event the command produces.
    fn correlation_id(&self) -> Uuid;

    /// Identity of the target aggregate.
    fn aggregate_id(&self) -> &str;

    /// The version the caller last observed, if it wants the save to be
    /// checked against it.
    fn expected_version(&self) -> Option<i64> {
        None
    }
}
