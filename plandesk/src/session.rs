//! The signed-in identity.

use plandesk_proto::ids::UserId;

/// Who is performing operations.
///
/// Every write is stamped with `user_id` and every project read is checked
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Contact email, shown in reports.
    pub email: String,
}

impl Session {
    /// Creates a session for `user_id`.
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: email.into(),
        }
    }
}
