//! Dashboard summary and the printable project report.

use std::fmt::Write as _;

use chrono::NaiveDate;
use plandesk_proto::budget::{BudgetItem, format_amount};
use plandesk_proto::ids::{ProjectId, TaskId};
use plandesk_proto::project::Project;
use plandesk_proto::risk::{Level, Risk, RiskStatus, Severity};
use plandesk_proto::task::{Task, TaskStatus};
use plandesk_proto::team::TeamMember;
use serde::Serialize;

use crate::budget::BudgetSummary;
use crate::gate::{self, GateDecision};
use crate::risks::{self, RiskMatrix};

/// A task reference for lists in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRef {
    pub id: TaskId,
    pub title: String,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
        }
    }
}

/// Headline numbers for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub project_id: ProjectId,
    pub project_name: String,
    pub tasks_total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub done: usize,
    /// Done tasks as a whole percentage of all tasks (0 when there are none).
    pub completion_percent: u8,
    /// Past their due date and not Done.
    pub overdue: Vec<TaskRef>,
    /// Not started and waiting on an incomplete prerequisite.
    pub gated: Vec<TaskRef>,
    pub members: usize,
    pub budget_planned: i64,
    pub budget_actual: i64,
    pub budget_variance: i64,
    pub open_risks: usize,
    pub high_risks: usize,
}

impl DashboardSummary {
    /// Computes the summary as of `today`.
    #[must_use]
    pub fn build(
        project: &Project,
        tasks: &[Task],
        members: &[TeamMember],
        budget: &[BudgetItem],
        risks: &[Risk],
        today: NaiveDate,
    ) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let done = count(TaskStatus::Done);
        let completion_percent = if tasks.is_empty() {
            0
        } else {
            u8::try_from(done * 100 / tasks.len()).unwrap_or(100)
        };

        let gated = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::NotStarted)
            .filter(|t| {
                matches!(
                    gate::check_transition(t, TaskStatus::InProgress, tasks),
                    GateDecision::Rejected(_)
                )
            })
            .map(TaskRef::from)
            .collect();

        let totals = BudgetSummary::from_items(budget).total;

        Self {
            project_id: project.id,
            project_name: project.name.clone(),
            tasks_total: tasks.len(),
            not_started: count(TaskStatus::NotStarted),
            in_progress: count(TaskStatus::InProgress),
            done,
            completion_percent,
            overdue: tasks
                .iter()
                .filter(|t| t.is_overdue(today))
                .map(TaskRef::from)
                .collect(),
            gated,
            members: members.len(),
            budget_planned: totals.planned,
            budget_actual: totals.actual,
            budget_variance: totals.variance,
            open_risks: risks.iter().filter(|r| r.status.is_active()).count(),
            high_risks: risks::high_severity_open(risks),
        }
    }
}

/// One row of the risk register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskLine {
    pub title: String,
    pub probability: Level,
    pub impact: Level,
    pub score: u8,
    pub severity: Severity,
    pub status: RiskStatus,
}

impl From<&Risk> for RiskLine {
    fn from(risk: &Risk) -> Self {
        Self {
            title: risk.title.clone(),
            probability: risk.probability,
            impact: risk.impact,
            score: risk.score(),
            severity: risk.severity(),
            status: risk.status,
        }
    }
}

/// Dashboard, budget table and risk register together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub summary: DashboardSummary,
    pub budget: BudgetSummary,
    pub risks: Vec<RiskLine>,
    pub risk_matrix: RiskMatrix,
}

impl ProjectReport {
    /// Builds the report as of `today`.
    #[must_use]
    pub fn build(
        project: &Project,
        tasks: &[Task],
        members: &[TeamMember],
        budget: &[BudgetItem],
        risks: &[Risk],
        today: NaiveDate,
    ) -> Self {
        let mut register = risks.to_vec();
        risks::sort_register(&mut register);
        Self {
            summary: DashboardSummary::build(project, tasks, members, budget, risks, today),
            budget: BudgetSummary::from_items(budget),
            risks: register.iter().map(RiskLine::from).collect(),
            risk_matrix: RiskMatrix::from_risks(risks),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for the terminal.
    #[must_use]
    pub fn to_text(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", s.project_name, s.project_id);
        let _ = writeln!(
            out,
            "Tasks: {} total, {} not started, {} in progress, {} done ({}%)",
            s.tasks_total, s.not_started, s.in_progress, s.done, s.completion_percent
        );
        for task in &s.overdue {
            let _ = writeln!(out, "  overdue: {}", task.title);
        }
        for task in &s.gated {
            let _ = writeln!(out, "  waiting on prerequisites: {}", task.title);
        }
        let _ = writeln!(out, "Team: {} members", s.members);

        let _ = writeln!(out, "Budget:");
        for (category, totals) in &self.budget.categories {
            let _ = writeln!(
                out,
                "  {category:<20} planned {:>12}  actual {:>12}  variance {:>12}",
                format_amount(totals.planned),
                format_amount(totals.actual),
                format_amount(totals.variance)
            );
        }
        let _ = writeln!(
            out,
            "  {:<20} planned {:>12}  actual {:>12}  variance {:>12}",
            "TOTAL",
            format_amount(self.budget.total.planned),
            format_amount(self.budget.total.actual),
            format_amount(self.budget.total.variance)
        );

        let _ = writeln!(out, "Risks: {} open, {} high", s.open_risks, s.high_risks);
        for risk in &self.risks {
            let _ = writeln!(
                out,
                "  [{}] {:<30} {}x{}={} {}",
                risk.severity, risk.title, risk.probability, risk.impact, risk.score, risk.status
            );
        }
        out
    }
}
