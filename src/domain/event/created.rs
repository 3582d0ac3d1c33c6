use super::super::{Task, QUEUE_SIZE_TASK_EVENTS};
use super::TaskNotification;
use crate::library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "task.created";
const QUEUE_SIZE: usize = QUEUE_SIZE_TASK_EVENTS;

/// Task has been added to the list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TaskCreatedNotification(pub Task);

impl Notification for TaskCreatedNotification {
    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}

impl TaskNotification for TaskCreatedNotification {
    const LABEL: &'static str = "Task Created";

    fn task(&self) -> &Task {
        &self.0
    }
}

impl From<Task> for TaskCreatedNotification {
    fn from(task: Task) -> Self {
        Self(task)
    }
}
