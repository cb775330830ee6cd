//! Task documents.
//!
//! A task belongs to exactly one project and may list prerequisite tasks in
//! `depends_on`. Whether a status change is allowed given those prerequisites
//! is decided by the dependency gate in the `plandesk` crate; this module only
//! defines the data.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MemberId, ProjectId, TaskId, UserId};
use crate::revision::Revision;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Progress state of a task.
///
/// Variants are declared in workflow order; [`TaskStatus::rank`] exposes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Initial state of every task.
    NotStarted,
    /// Work has begun.
    InProgress,
    /// Work is finished.
    Done,
}

impl TaskStatus {
    /// The state every task is created in.
    pub const INITIAL: Self = Self::NotStarted;

    /// All statuses in workflow order.
    pub const ALL: [Self; 3] = [Self::NotStarted, Self::InProgress, Self::Done];

    /// Position of this status in the workflow (0 = initial).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    /// Human-readable label used on boards and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Error for unrecognised status or priority strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {input}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Ok(Self::NotStarted),
            "in_progress" | "doing" => Ok(Self::InProgress),
            "done" | "completed" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                kind: "task status",
                input: s.to_string(),
            }),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                kind: "priority",
                input: s.to_string(),
            }),
        }
    }
}

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Project this task belongs to.
    pub project_id: ProjectId,
    /// Short title shown on the board.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Current progress state.
    pub status: TaskStatus,
    /// Scheduling priority.
    pub priority: Priority,
    /// Prerequisite tasks, in the order they were assigned.
    pub depends_on: Vec<TaskId>,
    /// Team member responsible for the task.
    pub assignee: Option<MemberId>,
    /// Planned start date (timeline view).
    pub start_date: Option<NaiveDate>,
    /// Due date (calendar view).
    pub due_date: Option<NaiveDate>,
    /// When to remind the assignee.
    pub reminder_at: Option<DateTime<Utc>>,
    /// Milliseconds since epoch when the task was created.
    pub created_at: u64,
    /// Last write applied to this task.
    pub revision: Revision,
}

impl Task {
    /// Creates a task in its initial state with no dependencies.
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>, author: &UserId) -> Self {
        let revision = Revision::now(author);
        Self {
            id: TaskId::new(),
            project_id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::INITIAL,
            priority: Priority::default(),
            depends_on: Vec::new(),
            assignee: None,
            start_date: None,
            due_date: None,
            reminder_at: None,
            created_at: revision.at,
            revision,
        }
    }

    /// Returns `true` once the task reached [`TaskStatus::Done`].
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Returns `true` if the task is past its due date on `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_done() && self.due_date.is_some_and(|due| due < today)
    }
}
