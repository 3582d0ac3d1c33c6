//! Domain specific structures, implementations, and logic

/// Default queue size for task change events
///
/// It should hold a number of items that exceeds the burst of mutations that may happen
/// while all broadcaster instances are unavailable.
pub(self) const QUEUE_SIZE_TASK_EVENTS: usize = 10_000;

mod artifact;
mod mode;
mod task;

pub mod event;

pub use artifact::ArtifactDescriptor;
pub use mode::DeliveryMode;
pub use task::{Task, TaskIdentifier, TaskValidationError, MAX_TASK_LENGTH};
