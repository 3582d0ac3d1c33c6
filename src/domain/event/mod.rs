//! Notifications emitted by the todo service after a mutation has been persisted

mod created;
mod updated;

pub use created::TaskCreatedNotification;
pub use updated::TaskUpdatedNotification;

use super::Task;
use crate::library::communication::event::Notification;

/// Notification which carries a snapshot of a [`Task`]
pub trait TaskNotification: Notification + From<Task> {
    /// Human readable name of the event
    const LABEL: &'static str;

    /// Snapshot of the task after the mutation
    fn task(&self) -> &Task;
}
