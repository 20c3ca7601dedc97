//! Use cases over the order domain.

pub mod command_handlers;
pub mod notifications;
pub mod query_handlers;
