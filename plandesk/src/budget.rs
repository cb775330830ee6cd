//! Budget items and per-category totals.

use std::collections::BTreeMap;
use std::sync::Arc;

use plandesk_proto::budget::BudgetItem;
use plandesk_proto::ids::{BudgetItemId, ProjectId, UserId};
use serde::Serialize;

use crate::collection::Collection;
use crate::projects::{AccessError, authorize};
use crate::session::Session;
use crate::store::{DocumentStore, StoreError};

/// Errors from budget operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BudgetError {
    /// Category cannot be empty.
    #[error("budget category cannot be empty")]
    CategoryEmpty,
    /// Amounts must be zero or positive.
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(i64),
    /// No item with this id is visible.
    #[error("budget item not found: {0}")]
    ItemNotFound(BudgetItemId),
    /// Project could not be reached.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

const fn check_amount(amount: i64) -> Result<i64, BudgetError> {
    if amount < 0 {
        Err(BudgetError::NegativeAmount(amount))
    } else {
        Ok(amount)
    }
}

/// Totals for one category, or for the whole project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BudgetTotals {
    /// Sum of planned amounts (minor units).
    pub planned: i64,
    /// Sum of actual amounts (minor units).
    pub actual: i64,
    /// Planned minus actual.
    pub variance: i64,
    /// Items where actual exceeds planned.
    pub over_budget: usize,
}

impl BudgetTotals {
    fn add(&mut self, item: &BudgetItem) {
        self.planned = self.planned.saturating_add(item.planned);
        self.actual = self.actual.saturating_add(item.actual);
        self.variance = self.planned.saturating_sub(self.actual);
        if item.is_over_budget() {
            self.over_budget += 1;
        }
    }
}

/// The budget table: totals per category plus grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    /// Category name to totals, alphabetical.
    pub categories: BTreeMap<String, BudgetTotals>,
    /// Across every item.
    pub total: BudgetTotals,
}

impl BudgetSummary {
    /// Builds the summary from a project's items.
    #[must_use]
    pub fn from_items(items: &[BudgetItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary
                .categories
                .entry(item.category.clone())
                .or_default()
                .add(item);
            summary.total.add(item);
        }
        summary
    }
}

/// Budget item CRUD.
pub struct BudgetService<S> {
    store: Arc<S>,
    items: Collection<S, BudgetItem>,
    session: Session,
}

impl<S: DocumentStore> BudgetService<S> {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self {
            items: Collection::new(Arc::clone(&store)),
            store,
            session,
        }
    }

    fn user(&self) -> &UserId {
        &self.session.user_id
    }

    async fn load(&self, id: BudgetItemId) -> Result<BudgetItem, BudgetError> {
        let item = self
            .items
            .get(id)
            .await?
            .ok_or(BudgetError::ItemNotFound(id))?;
        authorize(self.store.as_ref(), item.project_id, self.user()).await?;
        Ok(item)
    }

    /// Adds a budget line.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::CategoryEmpty`], [`BudgetError::NegativeAmount`]
    /// or [`BudgetError::Access`].
    pub async fn add(
        &self,
        project: ProjectId,
        category: &str,
        description: &str,
        planned: i64,
        actual: i64,
    ) -> Result<BudgetItem, BudgetError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(BudgetError::CategoryEmpty);
        }
        let planned = check_amount(planned)?;
        let actual = check_amount(actual)?;
        authorize(self.store.as_ref(), project, self.user()).await?;

        let mut item = BudgetItem::new(project, category, planned, self.user());
        item.description = description.trim().to_string();
        item.actual = actual;
        self.items.save(item.clone()).await?;
        tracing::info!(project_id = %project, item_id = %item.id, "budget item added");
        Ok(item)
    }

    /// Updates the planned and/or actual amount.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NegativeAmount`] or
    /// [`BudgetError::ItemNotFound`].
    pub async fn update_amounts(
        &self,
        id: BudgetItemId,
        planned: Option<i64>,
        actual: Option<i64>,
    ) -> Result<BudgetItem, BudgetError> {
        if let Some(p) = planned {
            check_amount(p)?;
        }
        if let Some(a) = actual {
            check_amount(a)?;
        }
        let mut item = self.load(id).await?;
        if let Some(p) = planned {
            item.planned = p;
        }
        if let Some(a) = actual {
            item.actual = a;
        }
        item.revision = item.revision.next(self.user());
        self.items.save(item.clone()).await?;
        if item.is_over_budget() {
            tracing::warn!(item_id = %id, variance = item.variance(), "budget item over budget");
        }
        Ok(item)
    }

    /// Deletes a budget line.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::ItemNotFound`] if it is not visible.
    pub async fn remove(&self, id: BudgetItemId) -> Result<(), BudgetError> {
        self.load(id).await?;
        self.items.remove(id).await?;
        Ok(())
    }

    /// The project's items, by category then creation time.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Access`] if the project is not visible.
    pub async fn list(&self, project: ProjectId) -> Result<Vec<BudgetItem>, BudgetError> {
        authorize(self.store.as_ref(), project, self.user()).await?;
        let mut items = self.items.list(project).await?;
        items.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(items)
    }

    /// Totals per category and overall.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Access`] if the project is not visible.
    pub async fn summary(&self, project: ProjectId) -> Result<BudgetSummary, BudgetError> {
        Ok(BudgetSummary::from_items(&self.list(project).await?))
    }
}
