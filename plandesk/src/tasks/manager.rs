//! Task manager for project-scoped task CRUD and gated status changes.
//!
//! `TaskManager` provides the application-layer interface for creating,
//! updating, linking and deleting tasks within a project the session user
//! belongs to.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use plandesk_proto::document::Document;
use plandesk_proto::ids::{MemberId, ProjectId, TaskId, UserId};
use plandesk_proto::task::{MAX_TASK_TITLE_LENGTH, Priority, Task, TaskStatus};
use plandesk_proto::team::TeamMember;

use super::TaskError;
use crate::collection::Collection;
use crate::gate::{self, GateDecision, Rejection};
use crate::projects::authorize;
use crate::session::Session;
use crate::store::{DocumentStore, WriteBatch};

/// Fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Title (required).
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Scheduling priority.
    pub priority: Priority,
    /// Responsible team member.
    pub assignee: Option<MemberId>,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Reminder time.
    pub reminder_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// A draft with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A partial update of task details. `None` leaves a field untouched; the
/// nested options on clearable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee: Option<Option<MemberId>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub reminder_at: Option<Option<DateTime<Utc>>>,
}

/// Result of [`TaskManager::change_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// The new status was written.
    Applied(Task),
    /// The task already had the requested status; nothing was written.
    Unchanged(Task),
    /// The dependency gate refused the change; nothing was written.
    Blocked(Rejection),
}

/// One column of the task board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardColumn {
    /// Status shared by every task in the column.
    pub status: TaskStatus,
    /// Tasks in creation order.
    pub tasks: Vec<Task>,
}

/// Manages the tasks of the projects a session user belongs to.
pub struct TaskManager<S> {
    store: Arc<S>,
    tasks: Collection<S, Task>,
    team: Collection<S, TeamMember>,
    session: Session,
    max_title_len: usize,
}

impl<S: DocumentStore> TaskManager<S> {
    /// Creates a new `TaskManager` acting as `session`.
    #[must_use]
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self {
            tasks: Collection::new(Arc::clone(&store)),
            team: Collection::new(Arc::clone(&store)),
            store,
            session,
            max_title_len: MAX_TASK_TITLE_LENGTH,
        }
    }

    /// Lowers the title length limit. Values above the document limit are
    /// clamped to it.
    #[must_use]
    pub fn with_max_title_len(mut self, max: usize) -> Self {
        self.max_title_len = max.min(MAX_TASK_TITLE_LENGTH);
        self
    }

    fn user(&self) -> &UserId {
        &self.session.user_id
    }

    fn validate_title(&self, title: &str) -> Result<String, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        if title.chars().count() > self.max_title_len {
            return Err(TaskError::TitleTooLong {
                max: self.max_title_len,
            });
        }
        Ok(title.to_string())
    }

    async fn check_assignee(
        &self,
        project: ProjectId,
        assignee: Option<MemberId>,
    ) -> Result<(), TaskError> {
        let Some(member) = assignee else {
            return Ok(());
        };
        match self.team.get(member).await? {
            Some(m) if m.project_id == project => Ok(()),
            _ => Err(TaskError::UnknownAssignee(member)),
        }
    }

    /// Creates a task with only a title.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::create`].
    pub async fn create_task(&self, project: ProjectId, title: &str) -> Result<Task, TaskError> {
        self.create(project, TaskDraft::new(title)).await
    }

    /// Creates a task in its initial status with no prerequisites.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TitleEmpty`] or [`TaskError::TitleTooLong`] for
    /// an invalid title, [`TaskError::UnknownAssignee`] if the assignee is
    /// not on the project's team, or [`TaskError::Access`] if the project is
    /// not visible to the session user.
    pub async fn create(&self, project: ProjectId, draft: TaskDraft) -> Result<Task, TaskError> {
        let title = self.validate_title(&draft.title)?;
        authorize(self.store.as_ref(), project, self.user()).await?;
        self.check_assignee(project, draft.assignee).await?;
        if let (Some(start), Some(due)) = (draft.start_date, draft.due_date) {
            if due < start {
                return Err(TaskError::DueBeforeStart);
            }
        }

        let mut task = Task::new(project, title, self.user());
        task.description = draft.description;
        task.priority = draft.priority;
        task.assignee = draft.assignee;
        task.start_date = draft.start_date;
        task.due_date = draft.due_date;
        task.reminder_at = draft.reminder_at;

        self.tasks.save(task.clone()).await?;
        tracing::info!(project_id = %project, task_id = %task.id, "task created");
        Ok(task)
    }

    /// Fetches a task from a project the session user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] or [`TaskError::Access`].
    pub async fn get(&self, id: TaskId) -> Result<Task, TaskError> {
        let task = self
            .tasks
            .get(id)
            .await?
            .ok_or(TaskError::TaskNotFound(id))?;
        authorize(self.store.as_ref(), task.project_id, self.user()).await?;
        Ok(task)
    }

    /// Returns every task in the project, sorted by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Access`] if the project is not visible.
    pub async fn list(&self, project: ProjectId) -> Result<Vec<Task>, TaskError> {
        authorize(self.store.as_ref(), project, self.user()).await?;
        let mut tasks = self.tasks.list(project).await?;
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    /// Groups the project's tasks by status, in workflow order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Access`] if the project is not visible.
    pub async fn board(&self, project: ProjectId) -> Result<Vec<BoardColumn>, TaskError> {
        let tasks = self.list(project).await?;
        Ok(TaskStatus::ALL
            .into_iter()
            .map(|status| BoardColumn {
                status,
                tasks: tasks.iter().filter(|t| t.status == status).cloned().collect(),
            })
            .collect())
    }

    /// Applies a partial update of task details.
    ///
    /// Status and prerequisites are not edited here; see
    /// [`TaskManager::change_status`] and [`TaskManager::set_dependencies`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] if the task is missing, the new title is
    /// invalid, the assignee is unknown or the dates are inverted.
    pub async fn edit(&self, id: TaskId, edit: TaskEdit) -> Result<Task, TaskError> {
        let mut task = self.get(id).await?;

        if let Some(title) = &edit.title {
            task.title = self.validate_title(title)?;
        }
        if let Some(description) = edit.description {
            task.description = description;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        if let Some(assignee) = edit.assignee {
            self.check_assignee(task.project_id, assignee).await?;
            task.assignee = assignee;
        }
        if let Some(start) = edit.start_date {
            task.start_date = start;
        }
        if let Some(due) = edit.due_date {
            task.due_date = due;
        }
        if let Some(reminder) = edit.reminder_at {
            task.reminder_at = reminder;
        }
        if let (Some(start), Some(due)) = (task.start_date, task.due_date) {
            if due < start {
                return Err(TaskError::DueBeforeStart);
            }
        }

        task.revision = task.revision.next(self.user());
        self.tasks.save(task.clone()).await?;
        tracing::debug!(task_id = %id, "task edited");
        Ok(task)
    }

    /// Replaces the task's prerequisites.
    ///
    /// Duplicates are collapsed keeping the first occurrence. Every id must
    /// name another task of the same project and the new edges must not
    /// close a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::SelfDependency`],
    /// [`TaskError::UnknownDependency`] or [`TaskError::DependencyCycle`].
    pub async fn set_dependencies(&self, id: TaskId, depends_on: &[TaskId]) -> Result<Task, TaskError> {
        let mut task = self.get(id).await?;
        let project_tasks = self.tasks.list(task.project_id).await?;
        let by_id: HashMap<TaskId, &Task> = project_tasks.iter().map(|t| (t.id, t)).collect();

        let mut seen = HashSet::new();
        let deps: Vec<TaskId> = depends_on.iter().copied().filter(|d| seen.insert(*d)).collect();
        for dep in &deps {
            if *dep == id {
                return Err(TaskError::SelfDependency);
            }
            if !by_id.contains_key(dep) {
                return Err(TaskError::UnknownDependency(*dep));
            }
        }

        if let Some(cycle) = gate::would_create_cycle(id, &deps, &project_tasks) {
            let titles = cycle
                .iter()
                .map(|c| by_id.get(c).map_or_else(|| c.to_string(), |t| t.title.clone()))
                .collect();
            return Err(TaskError::DependencyCycle(titles));
        }

        task.depends_on = deps;
        task.revision = task.revision.next(self.user());
        self.tasks.save(task.clone()).await?;
        tracing::debug!(task_id = %id, prerequisites = task.depends_on.len(), "dependencies set");
        Ok(task)
    }

    /// Requests a status change, consulting the dependency gate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] only if the task cannot be loaded or written.
    /// A refusal by the gate is [`StatusChange::Blocked`].
    pub async fn change_status(&self, id: TaskId, requested: TaskStatus) -> Result<StatusChange, TaskError> {
        let mut task = self.get(id).await?;
        let project_tasks = self.tasks.list(task.project_id).await?;

        match gate::check_transition(&task, requested, &project_tasks) {
            GateDecision::Rejected(rejection) => {
                tracing::info!(
                    task_id = %id,
                    requested = %requested,
                    blocked_by = ?rejection.blocking_titles(),
                    "status change blocked"
                );
                Ok(StatusChange::Blocked(rejection))
            }
            GateDecision::Permitted if task.status == requested => Ok(StatusChange::Unchanged(task)),
            GateDecision::Permitted => {
                let from = task.status;
                task.status = requested;
                task.revision = task.revision.next(self.user());
                self.tasks.save(task.clone()).await?;
                tracing::info!(task_id = %id, from = %from, to = %requested, "status changed");
                Ok(StatusChange::Applied(task))
            }
        }
    }

    /// Deletes a task and removes it from every other task's prerequisites,
    /// in one atomic batch.
    ///
    /// Returns how many other tasks were unlinked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] or a store failure, in which case
    /// nothing was written.
    pub async fn delete_task(&self, id: TaskId) -> Result<usize, TaskError> {
        let task = self.get(id).await?;
        let project_tasks = self.tasks.list(task.project_id).await?;

        let mut batch = WriteBatch::new();
        batch.delete(task.key());
        let mut unlinked = 0;
        for mut other in project_tasks
            .into_iter()
            .filter(|t| t.id != id && t.depends_on.contains(&id))
        {
            other.depends_on.retain(|d| *d != id);
            other.revision = other.revision.next(self.user());
            batch.put(other.into_record());
            unlinked += 1;
        }

        self.store.commit(batch).await?;
        tracing::info!(task_id = %id, unlinked, "task deleted");
        Ok(unlinked)
    }
}
