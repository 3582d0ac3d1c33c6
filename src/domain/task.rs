use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of characters a task description may contain
pub const MAX_TASK_LENGTH: usize = 140;

/// Store-assigned identifier of a [`Task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TaskIdentifier(i32);

impl TaskIdentifier {
    /// Wraps a raw store identifier
    pub fn new(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons why a task description is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Description contains no characters
    #[error("Task cannot be empty")]
    Empty,
    /// Description contains more than [`MAX_TASK_LENGTH`] characters
    #[error("Task cannot exceed 140 characters")]
    TooLong(usize),
}

/// Single entry of the shared task list
///
/// The wire representation is `{"id": 1, "description": "buy milk", "done": false}`,
/// the key `task` is accepted in place of `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Identifier assigned by the store
    pub id: TaskIdentifier,
    /// What needs to be done
    #[serde(alias = "task")]
    #[sqlx(rename = "task")]
    pub description: String,
    /// Whether the task has been completed
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// Checks whether a description may be stored
    pub fn validate_description(description: &str) -> Result<(), TaskValidationError> {
        let length = description.chars().count();

        if length == 0 {
            Err(TaskValidationError::Empty)
        } else if length > MAX_TASK_LENGTH {
            Err(TaskValidationError::TooLong(length))
        } else {
            Ok(())
        }
    }
}
