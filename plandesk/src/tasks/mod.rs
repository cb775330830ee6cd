//! Project tasks.
//!
//! [`TaskManager`] is the application-layer interface for creating, editing,
//! linking and deleting tasks. Status changes go through the dependency gate
//! in [`crate::gate`]; a refused change comes back as
//! [`StatusChange::Blocked`], never as an error.

pub mod manager;

pub use manager::{BoardColumn, StatusChange, TaskDraft, TaskEdit, TaskManager};

use plandesk_proto::ids::{MemberId, TaskId};
use thiserror::Error;

use crate::projects::AccessError;
use crate::store::StoreError;

/// Errors that can occur during task operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {max} characters)")]
    TitleTooLong {
        /// Allowed maximum.
        max: usize,
    },
    /// Due date lies before the start date.
    #[error("due date is before start date")]
    DueBeforeStart,
    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// A task was listed as its own prerequisite.
    #[error("a task cannot depend on itself")]
    SelfDependency,
    /// A prerequisite is not a task of the same project.
    #[error("unknown prerequisite task: {0}")]
    UnknownDependency(TaskId),
    /// The prerequisites would form a cycle (titles along the cycle).
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    /// The assignee is not a team member of the project.
    #[error("unknown assignee: {0}")]
    UnknownAssignee(MemberId),
    /// Project could not be reached.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
