//! Application context: one session's services over a shared store.

use std::sync::Arc;

use chrono::NaiveDate;
use plandesk_proto::ids::ProjectId;

use crate::budget::{BudgetError, BudgetService};
use crate::config::AppConfig;
use crate::notify::NotificationCenter;
use crate::projects::{ProjectError, ProjectService};
use crate::reports::{DashboardSummary, ProjectReport};
use crate::risks::{RiskError, RiskService};
use crate::scope::ProjectScope;
use crate::session::Session;
use crate::store::DocumentStore;
use crate::tasks::{TaskError, TaskManager};
use crate::team::{TeamError, TeamService};

/// Any failure surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A project-scoped command ran with nothing selected.
    #[error("no project selected (use --project or PLANDESK_PROJECT)")]
    NoProject,
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Team(#[from] TeamError),
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error(transparent)]
    Risk(#[from] RiskError),
    /// Report serialization failed.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Services, selected project and notifications for one session.
pub struct App<S> {
    /// Projects the session user can see.
    pub projects: ProjectService<S>,
    /// Tasks and the dependency gate.
    pub tasks: TaskManager<S>,
    /// Team rosters.
    pub team: TeamService<S>,
    /// Budget items.
    pub budget: BudgetService<S>,
    /// Risk registers.
    pub risks: RiskService<S>,
    /// Currently selected project.
    pub scope: ProjectScope,
    /// Pending toasts.
    pub notifications: NotificationCenter,
    session: Session,
}

impl<S: DocumentStore> App<S> {
    /// Builds every service over `store`, acting as the configured user.
    #[must_use]
    pub fn new(store: Arc<S>, config: &AppConfig) -> Self {
        let session = config.session();
        Self {
            projects: ProjectService::new(Arc::clone(&store), session.clone()),
            tasks: TaskManager::new(Arc::clone(&store), session.clone())
                .with_max_title_len(config.max_title_len),
            team: TeamService::new(Arc::clone(&store), session.clone()),
            budget: BudgetService::new(Arc::clone(&store), session.clone()),
            risks: RiskService::new(store, session.clone()),
            scope: ProjectScope::new(),
            notifications: NotificationCenter::new(config.toast_ttl, config.max_toasts),
            session,
        }
    }

    /// Who the app acts as.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The selected project.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoProject`] if nothing is selected.
    pub fn current_project(&self) -> Result<ProjectId, AppError> {
        self.scope.current().ok_or(AppError::NoProject)
    }

    /// Collects every collection of `project` into a report as of `today`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if the project is not visible or a read fails.
    pub async fn report(&self, project: ProjectId, today: NaiveDate) -> Result<ProjectReport, AppError> {
        let doc = self.projects.get(project).await?;
        let tasks = self.tasks.list(project).await?;
        let members = self.team.list(project).await?;
        let budget = self.budget.list(project).await?;
        let risks = self.risks.register(project).await?;
        Ok(ProjectReport::build(&doc, &tasks, &members, &budget, &risks, today))
    }

    /// The dashboard numbers for `project` as of `today`.
    ///
    /// # Errors
    ///
    /// See [`App::report`].
    pub async fn dashboard(&self, project: ProjectId, today: NaiveDate) -> Result<DashboardSummary, AppError> {
        Ok(self.report(project, today).await?.summary)
    }
}
