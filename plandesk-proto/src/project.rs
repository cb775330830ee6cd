//! Project documents, the tenant boundary of every other collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId};
use crate::revision::Revision;

/// Maximum allowed project name length in characters.
pub const MAX_PROJECT_NAME_LENGTH: usize = 120;

/// A project and the users allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// User who created the project; only the owner may delete it.
    pub owner: UserId,
    /// Users with access to the project. Always contains `owner`.
    pub members: Vec<UserId>,
    /// Planned start of the project.
    pub start_date: Option<NaiveDate>,
    /// Planned end of the project.
    pub end_date: Option<NaiveDate>,
    /// Milliseconds since epoch when the project was created.
    pub created_at: u64,
    /// Last write applied to this project.
    pub revision: Revision,
}

impl Project {
    /// Creates a project owned by `owner`, who is also its first member.
    #[must_use]
    pub fn new(name: impl Into<String>, owner: &UserId) -> Self {
        let revision = Revision::now(owner);
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: String::new(),
            owner: owner.clone(),
            members: vec![owner.clone()],
            start_date: None,
            end_date: None,
            created_at: revision.at,
            revision,
        }
    }

    /// Returns `true` if `user` may read and write this project.
    #[must_use]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.owner == *user || self.members.contains(user)
    }
}
