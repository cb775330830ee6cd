//! The currently selected project.

use plandesk_proto::ids::ProjectId;
use tokio::sync::watch;

/// Holds the selected project and notifies observers when it changes.
///
/// Every project-scoped view reads its project id from here.
#[derive(Debug)]
pub struct ProjectScope {
    tx: watch::Sender<Option<ProjectId>>,
}

impl Default for ProjectScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectScope {
    /// Creates a scope with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Selects `project`, returning the previous selection.
    pub fn select(&self, project: ProjectId) -> Option<ProjectId> {
        tracing::debug!(project_id = %project, "project selected");
        self.tx.send_replace(Some(project))
    }

    /// Clears the selection, returning what was selected.
    pub fn clear(&self) -> Option<ProjectId> {
        self.tx.send_replace(None)
    }

    /// The selected project, if any.
    #[must_use]
    pub fn current(&self) -> Option<ProjectId> {
        *self.tx.borrow()
    }

    /// Subscribes to selection changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<ProjectId>> {
        self.tx.subscribe()
    }
}
