use super::super::{Task, QUEUE_SIZE_TASK_EVENTS};
use super::TaskNotification;
use crate::library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "task.updated";
const QUEUE_SIZE: usize = QUEUE_SIZE_TASK_EVENTS;

/// Task has been marked as done
///
/// Carries the full record as it is stored after the update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TaskUpdatedNotification(pub Task);

impl Notification for TaskUpdatedNotification {
    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}

impl TaskNotification for TaskUpdatedNotification {
    const LABEL: &'static str = "Task Updated";

    fn task(&self) -> &Task {
        &self.0
    }
}

impl From<Task> for TaskUpdatedNotification {
    fn from(task: Task) -> Self {
        Self(task)
    }
}
