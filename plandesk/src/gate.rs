//! Dependency-gated task status transitions.
//!
//! A task may not move forward out of its initial state while any of its
//! prerequisites (`depends_on`) is not Done. The check is evaluated once, at
//! the moment of the status edit: nothing re-validates a task if a
//! prerequisite is reopened later.
//!
//! Everything here is pure and synchronous. A rejection is an ordinary
//! return value; the caller decides how to surface it.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use plandesk_proto::ids::TaskId;
use plandesk_proto::task::{Task, TaskStatus};

/// Outcome of [`check_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The caller may persist the new status.
    Permitted,
    /// At least one prerequisite is incomplete.
    Rejected(Rejection),
}

impl GateDecision {
    /// Returns `true` for [`GateDecision::Permitted`].
    #[must_use]
    pub const fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}

/// An incomplete prerequisite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocker {
    /// Prerequisite task id.
    pub id: TaskId,
    /// Prerequisite title, for display.
    pub title: String,
    /// Prerequisite's current status (never Done).
    pub status: TaskStatus,
}

/// Why a status change was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The task whose status change was refused.
    pub task_id: TaskId,
    /// Its title.
    pub task_title: String,
    /// The status that was requested.
    pub requested: TaskStatus,
    /// Incomplete prerequisites, in `depends_on` order.
    pub blocked_by: Vec<Blocker>,
    /// Titles along a dependency cycle through this task, first and last
    /// entries being the task itself. Present only when the task can never
    /// be unblocked without editing its dependencies.
    pub cycle: Option<Vec<String>>,
}

impl Rejection {
    /// Titles of the blocking prerequisites.
    #[must_use]
    pub fn blocking_titles(&self) -> Vec<&str> {
        self.blocked_by.iter().map(|b| b.title.as_str()).collect()
    }

    /// User-facing explanation naming the blocking tasks.
    #[must_use]
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Cannot move \"{}\" to {}: blocked by {}",
            self.task_title,
            self.requested.label(),
            self.blocking_titles().join(", ")
        );
        if let Some(cycle) = &self.cycle {
            msg.push_str(" (dependency cycle: ");
            msg.push_str(&cycle.join(" -> "));
            msg.push(')');
        }
        msg
    }
}

/// Returns `true` if moving from `from` to `to` is subject to the gate.
///
/// Only forward moves into a non-initial status are gated. Staying in the
/// initial status, moving backward, or re-requesting the current status are
/// always allowed.
#[must_use]
pub const fn is_gated(from: TaskStatus, to: TaskStatus) -> bool {
    to.rank() != TaskStatus::INITIAL.rank() && to.rank() > from.rank()
}

/// Decides whether `task` may move to `requested`.
///
/// `project_tasks` is every task of the task's project and is used to
/// resolve `depends_on` ids to their current status. Ids that resolve to
/// nothing (a deleted prerequisite) do not block.
#[must_use]
pub fn check_transition(task: &Task, requested: TaskStatus, project_tasks: &[Task]) -> GateDecision {
    if !is_gated(task.status, requested) || task.depends_on.is_empty() {
        return GateDecision::Permitted;
    }

    let graph = DependencyGraph::new(project_tasks).with_edges(task.id, &task.depends_on);
    let blocked_by = graph.blockers(&task.depends_on);
    if blocked_by.is_empty() {
        return GateDecision::Permitted;
    }

    let cycle = graph.cycle_through(task.id).map(|path| {
        path.iter()
            .map(|id| {
                if *id == task.id {
                    task.title.clone()
                } else {
                    graph.title(id).unwrap_or_default().to_string()
                }
            })
            .collect()
    });

    GateDecision::Rejected(Rejection {
        task_id: task.id,
        task_title: task.title.clone(),
        requested,
        blocked_by,
        cycle,
    })
}

/// Read-only view of a project's `depends_on` edges.
pub struct DependencyGraph<'a> {
    tasks: HashMap<TaskId, &'a Task>,
    edges: HashMap<TaskId, &'a [TaskId]>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds the graph from a project's tasks.
    #[must_use]
    pub fn new(tasks: &'a [Task]) -> Self {
        Self {
            tasks: tasks.iter().map(|t| (t.id, t)).collect(),
            edges: tasks.iter().map(|t| (t.id, t.depends_on.as_slice())).collect(),
        }
    }

    /// Replaces the outgoing edges of `id`, e.g. to test a proposed edit.
    #[must_use]
    pub fn with_edges(mut self, id: TaskId, depends_on: &'a [TaskId]) -> Self {
        self.edges.insert(id, depends_on);
        self
    }

    fn title(&self, id: &TaskId) -> Option<&'a str> {
        self.tasks.get(id).map(|t| t.title.as_str())
    }

    fn deps(&self, id: &TaskId) -> &'a [TaskId] {
        self.edges.get(id).copied().unwrap_or_default()
    }

    /// Incomplete tasks among `depends_on`, deduplicated, in order.
    #[must_use]
    pub fn blockers(&self, depends_on: &[TaskId]) -> Vec<Blocker> {
        let mut seen = HashSet::new();
        depends_on
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.tasks.get(id))
            .filter(|dep| !dep.is_done())
            .map(|dep| Blocker {
                id: dep.id,
                title: dep.title.clone(),
                status: dep.status,
            })
            .collect()
    }

    /// Shortest dependency cycle starting and ending at `start`, if any.
    ///
    /// A self-dependency yields `[start, start]`.
    #[must_use]
    pub fn cycle_through(&self, start: TaskId) -> Option<Vec<TaskId>> {
        let mut parent: HashMap<TaskId, Option<TaskId>> = HashMap::new();
        let mut queue = VecDeque::new();
        for &root in self.deps(&start) {
            if let Entry::Vacant(e) = parent.entry(root) {
                e.insert(None);
                queue.push_back(root);
            }
        }

        while let Some(current) = queue.pop_front() {
            if current == start {
                let mut path = vec![current];
                let mut cursor = parent.get(&current).copied().flatten();
                while let Some(id) = cursor {
                    path.push(id);
                    cursor = parent.get(&id).copied().flatten();
                }
                path.push(start);
                path.reverse();
                return Some(path);
            }
            for &next in self.deps(&current) {
                if let Entry::Vacant(e) = parent.entry(next) {
                    e.insert(Some(current));
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

/// Returns the cycle that assigning `depends_on` to `task` would create.
///
/// `project_tasks` holds the current state of the project. The returned
/// path starts and ends with `task`.
#[must_use]
pub fn would_create_cycle(
    task: TaskId,
    depends_on: &[TaskId],
    project_tasks: &[Task],
) -> Option<Vec<TaskId>> {
    DependencyGraph::new(project_tasks)
        .with_edges(task, depends_on)
        .cycle_through(task)
}
