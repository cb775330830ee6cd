//! Projects: the tenant boundary.
//!
//! A user only sees projects they are a member of. Every project-scoped
//! service calls [`authorize`] before touching a collection.

use std::sync::Arc;

use plandesk_proto::document::{CollectionKind, DocKey, Document};
use plandesk_proto::ids::{ProjectId, UserId};
use plandesk_proto::project::{MAX_PROJECT_NAME_LENGTH, Project};

use crate::collection::Collection;
use crate::session::Session;
use crate::store::{DocumentStore, StoreError, WriteBatch};

/// Failure to reach a project on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// No project with this id exists.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The project exists but the user is not a member.
    #[error("user {user} is not a member of project {project}")]
    Forbidden {
        /// Project that was requested.
        project: ProjectId,
        /// User that asked.
        user: UserId,
    },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads `project` and checks that `user` belongs to it.
///
/// # Errors
///
/// Returns [`AccessError::ProjectNotFound`] or [`AccessError::Forbidden`].
pub async fn authorize<S: DocumentStore>(
    store: &S,
    project: ProjectId,
    user: &UserId,
) -> Result<Project, AccessError> {
    let key = DocKey::new(CollectionKind::Projects, *project.as_uuid());
    let Some(found) = store.get(key).await?.and_then(Project::from_record) else {
        return Err(AccessError::ProjectNotFound(project));
    };
    if !found.is_member(user) {
        tracing::warn!(project_id = %project, user = %user, "access denied");
        return Err(AccessError::Forbidden {
            project,
            user: user.clone(),
        });
    }
    Ok(found)
}

/// Errors from project operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectError {
    /// Project name cannot be empty.
    #[error("project name cannot be empty")]
    NameEmpty,

    /// Project name exceeds the maximum length.
    #[error("project name too long (max {max} characters)")]
    NameTooLong {
        /// Allowed maximum.
        max: usize,
    },

    /// Only the owner may perform this operation.
    #[error("only the owner may do this to project {0}")]
    NotOwner(ProjectId),

    /// Project could not be reached.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn validate_name(name: &str) -> Result<String, ProjectError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProjectError::NameEmpty);
    }
    if name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(ProjectError::NameTooLong {
            max: MAX_PROJECT_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

/// Project CRUD on behalf of one session.
pub struct ProjectService<S> {
    store: Arc<S>,
    projects: Collection<S, Project>,
    session: Session,
}

impl<S: DocumentStore> ProjectService<S> {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self {
            projects: Collection::new(Arc::clone(&store)),
            store,
            session,
        }
    }

    fn user(&self) -> &UserId {
        &self.session.user_id
    }

    /// Creates a project owned by the session user.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::NameEmpty`] or [`ProjectError::NameTooLong`]
    /// for an invalid name.
    pub async fn create(&self, name: &str, description: &str) -> Result<Project, ProjectError> {
        let name = validate_name(name)?;
        let mut project = Project::new(name, self.user());
        project.description = description.trim().to_string();
        self.projects.save(project.clone()).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Fetches a project the session user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Access`] if it is missing or not visible.
    pub async fn get(&self, id: ProjectId) -> Result<Project, ProjectError> {
        Ok(authorize(self.store.as_ref(), id, self.user()).await?)
    }

    /// Projects the session user is a member of, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`].
    pub async fn list_for_user(&self) -> Result<Vec<Project>, ProjectError> {
        let user = self.user();
        let mut projects: Vec<Project> = self
            .projects
            .list_all()
            .await?
            .into_iter()
            .filter(|p| p.is_member(user))
            .collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(projects)
    }

    /// Renames a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError`] for an invalid name or inaccessible project.
    pub async fn rename(&self, id: ProjectId, name: &str) -> Result<Project, ProjectError> {
        let name = validate_name(name)?;
        let mut project = self.get(id).await?;
        project.name = name;
        project.revision = project.revision.next(self.user());
        self.projects.save(project.clone()).await?;
        Ok(project)
    }

    /// Grants `user` access to the project. Owner only.
    ///
    /// Adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::NotOwner`] if the session user is not the
    /// owner.
    pub async fn add_member(&self, id: ProjectId, user: UserId) -> Result<Project, ProjectError> {
        let mut project = self.get(id).await?;
        if project.owner != *self.user() {
            return Err(ProjectError::NotOwner(id));
        }
        if project.members.contains(&user) {
            return Ok(project);
        }
        tracing::info!(project_id = %id, member = %user, "member added to project");
        project.members.push(user);
        project.revision = project.revision.next(self.user());
        self.projects.save(project.clone()).await?;
        Ok(project)
    }

    /// Deletes a project and every document that belongs to it, atomically.
    /// Owner only.
    ///
    /// Returns the number of documents removed, the project included.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::NotOwner`] if the session user is not the
    /// owner, or [`ProjectError::Store`] if the batch fails (in which case
    /// nothing was deleted).
    pub async fn delete(&self, id: ProjectId) -> Result<usize, ProjectError> {
        let project = self.get(id).await?;
        if project.owner != *self.user() {
            return Err(ProjectError::NotOwner(id));
        }

        // Child collections are swept when the batch applies, so documents
        // written or removed by others since `get` are handled too.
        let mut batch = WriteBatch::new();
        for kind in CollectionKind::ALL {
            if kind != CollectionKind::Projects {
                batch.delete_scope(kind, id);
            }
        }
        batch.delete(project.key());

        let removed = self.store.commit(batch).await?;
        tracing::info!(project_id = %id, removed, "project deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>, user: &str) -> ProjectService<InMemoryStore> {
        ProjectService::new(Arc::clone(store), Session::new(user, format!("{user}@example.com")))
    }

    #[tokio::test]
    async fn create_makes_caller_owner_and_member() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        let project = alice.create("  Launch  ", "").await.unwrap();
        assert_eq!(project.name, "Launch");
        assert_eq!(project.owner, UserId::new("alice"));
        assert!(project.is_member(&UserId::new("alice")));
    }

    #[tokio::test]
    async fn name_validation() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        assert_eq!(alice.create("   ", "").await, Err(ProjectError::NameEmpty));
        let long = "x".repeat(MAX_PROJECT_NAME_LENGTH + 1);
        assert_eq!(
            alice.create(&long, "").await,
            Err(ProjectError::NameTooLong {
                max: MAX_PROJECT_NAME_LENGTH
            })
        );
    }

    #[tokio::test]
    async fn users_only_see_their_projects() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        let bob = service(&store, "bob");
        let shared = alice.create("Shared", "").await.unwrap();
        alice.create("Private", "").await.unwrap();
        alice.add_member(shared.id, UserId::new("bob")).await.unwrap();

        let visible = bob.list_for_user().await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, shared.id);
        assert_eq!(alice.list_for_user().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn outsiders_are_forbidden() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        let mallory = service(&store, "mallory");
        let project = alice.create("Launch", "").await.unwrap();
        let err = mallory.get(project.id).await.unwrap_err();
        assert!(matches!(err, ProjectError::Access(AccessError::Forbidden { .. })));
        let missing = alice.get(ProjectId::new()).await.unwrap_err();
        assert!(matches!(missing, ProjectError::Access(AccessError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        let bob = service(&store, "bob");
        let project = alice.create("Launch", "").await.unwrap();
        alice.add_member(project.id, UserId::new("bob")).await.unwrap();
        assert_eq!(bob.delete(project.id).await, Err(ProjectError::NotOwner(project.id)));
        assert_eq!(alice.delete(project.id).await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn rename_bumps_revision() {
        let store = Arc::new(InMemoryStore::new());
        let alice = service(&store, "alice");
        let project = alice.create("Launch", "").await.unwrap();
        let renamed = alice.rename(project.id, "Relaunch").await.unwrap();
        assert_eq!(renamed.name, "Relaunch");
        assert!(renamed.revision.supersedes(&project.revision));
    }
}
