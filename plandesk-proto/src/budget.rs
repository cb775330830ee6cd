//! Budget line items.
//!
//! Amounts are stored in minor currency units (cents) to keep arithmetic
//! exact.

use serde::{Deserialize, Serialize};

use crate::ids::{BudgetItemId, ProjectId, UserId};
use crate::revision::Revision;

/// One planned expense and what has actually been spent on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// Unique item identifier.
    pub id: BudgetItemId,
    /// Project this item belongs to.
    pub project_id: ProjectId,
    /// Grouping used by the budget table (e.g. "Hardware").
    pub category: String,
    /// Free-form description.
    pub description: String,
    /// Planned amount in minor units.
    pub planned: i64,
    /// Amount spent so far in minor units.
    pub actual: i64,
    /// Milliseconds since epoch when the item was created.
    pub created_at: u64,
    /// Last write applied to this item.
    pub revision: Revision,
}

impl BudgetItem {
    /// Creates a budget item with nothing spent yet.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        category: impl Into<String>,
        planned: i64,
        author: &UserId,
    ) -> Self {
        let revision = Revision::now(author);
        Self {
            id: BudgetItemId::new(),
            project_id,
            category: category.into(),
            description: String::new(),
            planned,
            actual: 0,
            created_at: revision.at,
            revision,
        }
    }

    /// Planned minus actual; negative when over budget.
    #[must_use]
    pub const fn variance(&self) -> i64 {
        self.planned.saturating_sub(self.actual)
    }

    /// Returns `true` if more was spent than planned.
    #[must_use]
    pub const fn is_over_budget(&self) -> bool {
        self.actual > self.planned
    }
}

/// Formats a minor-unit amount as `1234.56`.
#[must_use]
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
