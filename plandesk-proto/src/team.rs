//! Team member documents.

use serde::{Deserialize, Serialize};

use crate::ids::{MemberId, ProjectId, UserId};
use crate::revision::Revision;

/// A person working on a project.
///
/// Members are project-scoped records; `user_id` links the record to a
/// signed-in account when the person has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique member identifier.
    pub id: MemberId,
    /// Project this member belongs to.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Role on the project (e.g. "Developer").
    pub role: String,
    /// Linked account, if any.
    pub user_id: Option<UserId>,
    /// Milliseconds since epoch when the member was added.
    pub created_at: u64,
    /// Last write applied to this member.
    pub revision: Revision,
}

impl TeamMember {
    /// Creates a member record for `project_id`.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        email: impl Into<String>,
        author: &UserId,
    ) -> Self {
        let revision = Revision::now(author);
        Self {
            id: MemberId::new(),
            project_id,
            name: name.into(),
            email: email.into(),
            role: String::new(),
            user_id: None,
            created_at: revision.at,
            revision,
        }
    }
}
