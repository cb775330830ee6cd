//! Risk register and probability/impact matrix.

use std::sync::Arc;

use plandesk_proto::ids::{MemberId, ProjectId, RiskId, UserId};
use plandesk_proto::risk::{Level, Risk, RiskStatus, Severity};
use plandesk_proto::team::TeamMember;
use serde::Serialize;

use crate::collection::Collection;
use crate::projects::{AccessError, authorize};
use crate::session::Session;
use crate::store::{DocumentStore, StoreError};

/// Errors from risk operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskError {
    /// Risk title cannot be empty.
    #[error("risk title cannot be empty")]
    TitleEmpty,
    /// No risk with this id is visible.
    #[error("risk not found: {0}")]
    RiskNotFound(RiskId),
    /// The owner is not a team member of the project.
    #[error("unknown risk owner: {0}")]
    UnknownOwner(MemberId),
    /// Project could not be reached.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Partial update of a risk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskUpdate {
    pub status: Option<RiskStatus>,
    pub mitigation: Option<String>,
    pub probability: Option<Level>,
    pub impact: Option<Level>,
    pub owner: Option<Option<MemberId>>,
}

/// Count of active risks per probability (rows) and impact (columns),
/// both indexed by [`Level::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskMatrix {
    /// `cells[probability][impact]`.
    pub cells: [[usize; 3]; 3],
}

impl RiskMatrix {
    /// Builds the matrix from risks, skipping closed ones.
    #[must_use]
    pub fn from_risks(risks: &[Risk]) -> Self {
        let mut matrix = Self::default();
        for risk in risks.iter().filter(|r| r.status.is_active()) {
            matrix.cells[risk.probability.index()][risk.impact.index()] += 1;
        }
        matrix
    }

    /// Number of active risks with this probability and impact.
    #[must_use]
    pub const fn count(&self, probability: Level, impact: Level) -> usize {
        self.cells[probability.index()][impact.index()]
    }
}

/// Sorts risks into register order: highest score first, then by title.
pub fn sort_register(risks: &mut [Risk]) {
    risks.sort_by(|a, b| b.score().cmp(&a.score()).then_with(|| a.title.cmp(&b.title)));
}

/// Number of active risks with [`Severity::High`].
#[must_use]
pub fn high_severity_open(risks: &[Risk]) -> usize {
    risks
        .iter()
        .filter(|r| r.status.is_active() && r.severity() == Severity::High)
        .count()
}

/// Risk register CRUD.
pub struct RiskService<S> {
    store: Arc<S>,
    risks: Collection<S, Risk>,
    team: Collection<S, TeamMember>,
    session: Session,
}

impl<S: DocumentStore> RiskService<S> {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self {
            risks: Collection::new(Arc::clone(&store)),
            team: Collection::new(Arc::clone(&store)),
            store,
            session,
        }
    }

    fn user(&self) -> &UserId {
        &self.session.user_id
    }

    async fn load(&self, id: RiskId) -> Result<Risk, RiskError> {
        let risk = self.risks.get(id).await?.ok_or(RiskError::RiskNotFound(id))?;
        authorize(self.store.as_ref(), risk.project_id, self.user()).await?;
        Ok(risk)
    }

    async fn check_owner(&self, project: ProjectId, owner: Option<MemberId>) -> Result<(), RiskError> {
        let Some(member) = owner else {
            return Ok(());
        };
        match self.team.get(member).await? {
            Some(m) if m.project_id == project => Ok(()),
            _ => Err(RiskError::UnknownOwner(member)),
        }
    }

    /// Records a new open risk.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::TitleEmpty`] or [`RiskError::Access`].
    pub async fn add(
        &self,
        project: ProjectId,
        title: &str,
        probability: Level,
        impact: Level,
        mitigation: &str,
    ) -> Result<Risk, RiskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RiskError::TitleEmpty);
        }
        authorize(self.store.as_ref(), project, self.user()).await?;

        let mut risk = Risk::new(project, title, probability, impact, self.user());
        risk.mitigation = mitigation.trim().to_string();
        self.risks.save(risk.clone()).await?;
        tracing::info!(
            project_id = %project,
            risk_id = %risk.id,
            score = risk.score(),
            "risk added"
        );
        Ok(risk)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::RiskNotFound`] or [`RiskError::UnknownOwner`].
    pub async fn update(&self, id: RiskId, update: RiskUpdate) -> Result<Risk, RiskError> {
        let mut risk = self.load(id).await?;
        if let Some(status) = update.status {
            risk.status = status;
        }
        if let Some(mitigation) = update.mitigation {
            risk.mitigation = mitigation;
        }
        if let Some(probability) = update.probability {
            risk.probability = probability;
        }
        if let Some(impact) = update.impact {
            risk.impact = impact;
        }
        if let Some(owner) = update.owner {
            self.check_owner(risk.project_id, owner).await?;
            risk.owner = owner;
        }
        risk.revision = risk.revision.next(self.user());
        self.risks.save(risk.clone()).await?;
        Ok(risk)
    }

    /// Deletes a risk.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::RiskNotFound`] if it is not visible.
    pub async fn remove(&self, id: RiskId) -> Result<(), RiskError> {
        self.load(id).await?;
        self.risks.remove(id).await?;
        Ok(())
    }

    /// The project's risks in register order.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Access`] if the project is not visible.
    pub async fn register(&self, project: ProjectId) -> Result<Vec<Risk>, RiskError> {
        authorize(self.store.as_ref(), project, self.user()).await?;
        let mut risks = self.risks.list(project).await?;
        sort_register(&mut risks);
        Ok(risks)
    }

    /// Probability/impact matrix of the project's active risks.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Access`] if the project is not visible.
    pub async fn matrix(&self, project: ProjectId) -> Result<RiskMatrix, RiskError> {
        Ok(RiskMatrix::from_risks(&self.register(project).await?))
    }
}
