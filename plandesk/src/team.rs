//! Project team members.

use std::sync::Arc;

use plandesk_proto::document::Document;
use plandesk_proto::ids::{MemberId, ProjectId, UserId};
use plandesk_proto::risk::Risk;
use plandesk_proto::task::Task;
use plandesk_proto::team::TeamMember;

use crate::collection::Collection;
use crate::projects::{AccessError, authorize};
use crate::session::Session;
use crate::store::{DocumentStore, StoreError, WriteBatch};

/// Errors from team operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamError {
    /// Member name cannot be empty.
    #[error("member name cannot be empty")]
    NameEmpty,
    /// Email address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// No member with this id is visible.
    #[error("team member not found: {0}")]
    MemberNotFound(MemberId),
    /// Project could not be reached.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn validate_email(email: &str) -> Result<String, TeamError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(TeamError::InvalidEmail(email.to_string())),
    }
}

/// Team roster CRUD.
pub struct TeamService<S> {
    store: Arc<S>,
    members: Collection<S, TeamMember>,
    tasks: Collection<S, Task>,
    risks: Collection<S, Risk>,
    session: Session,
}

impl<S: DocumentStore> TeamService<S> {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self {
            members: Collection::new(Arc::clone(&store)),
            tasks: Collection::new(Arc::clone(&store)),
            risks: Collection::new(Arc::clone(&store)),
            store,
            session,
        }
    }

    fn user(&self) -> &UserId {
        &self.session.user_id
    }

    async fn load(&self, id: MemberId) -> Result<TeamMember, TeamError> {
        let member = self
            .members
            .get(id)
            .await?
            .ok_or(TeamError::MemberNotFound(id))?;
        authorize(self.store.as_ref(), member.project_id, self.user()).await?;
        Ok(member)
    }

    /// Adds a member to the project's team.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::NameEmpty`], [`TeamError::InvalidEmail`] or
    /// [`TeamError::Access`].
    pub async fn add(
        &self,
        project: ProjectId,
        name: &str,
        email: &str,
        role: &str,
    ) -> Result<TeamMember, TeamError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TeamError::NameEmpty);
        }
        let email = validate_email(email)?;
        authorize(self.store.as_ref(), project, self.user()).await?;

        let mut member = TeamMember::new(project, name, email, self.user());
        member.role = role.trim().to_string();
        self.members.save(member.clone()).await?;
        tracing::info!(project_id = %project, member_id = %member.id, "team member added");
        Ok(member)
    }

    /// The project's team, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::Access`] if the project is not visible.
    pub async fn list(&self, project: ProjectId) -> Result<Vec<TeamMember>, TeamError> {
        authorize(self.store.as_ref(), project, self.user()).await?;
        let mut members = self.members.list(project).await?;
        members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(members)
    }

    /// Changes a member's role.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::MemberNotFound`] if the member is not visible.
    pub async fn update_role(&self, id: MemberId, role: &str) -> Result<TeamMember, TeamError> {
        let mut member = self.load(id).await?;
        member.role = role.trim().to_string();
        member.revision = member.revision.next(self.user());
        self.members.save(member.clone()).await?;
        Ok(member)
    }

    /// Removes a member, clearing them as assignee of the project's tasks
    /// and as owner of its risks in the same batch.
    ///
    /// Returns the number of documents rewritten besides the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`TeamError::MemberNotFound`] or a store failure, in which
    /// case nothing was written.
    pub async fn remove(&self, id: MemberId) -> Result<usize, TeamError> {
        let member = self.load(id).await?;
        let project = member.project_id;
        let user = self.user();

        let mut batch = WriteBatch::new();
        batch.delete(member.key());
        let mut cleared = 0;
        for mut task in self.tasks.list(project).await? {
            if task.assignee == Some(id) {
                task.assignee = None;
                task.revision = task.revision.next(user);
                batch.put(task.into_record());
                cleared += 1;
            }
        }
        for mut risk in self.risks.list(project).await? {
            if risk.owner == Some(id) {
                risk.owner = None;
                risk.revision = risk.revision.next(user);
                batch.put(risk.into_record());
                cleared += 1;
            }
        }

        self.store.commit(batch).await?;
        tracing::info!(project_id = %project, member_id = %id, cleared, "team member removed");
        Ok(cleared)
    }
}
