//! Building blocks without knowledge of tasks
//!
//! Nothing in here depends on the [`domain`](super::domain) module. The message bus
//! abstractions, job scheduling and HTTP helpers are shared by all services.

pub mod communication;
pub mod helpers;
pub mod http;
pub mod scheduling;

/// Error type used across services
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of an operation that only reports failure
pub type EmptyResult = Result<(), BoxedError>;
