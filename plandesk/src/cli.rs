//! Subcommands and their execution against an [`App`].
//!
//! Commands produce plain text on success. Gate refusals and failures are
//! raised as notifications; the binary prints those separately.

use std::fmt::Write as _;

use chrono::{DateTime, Days, NaiveDate, Utc};
use clap::Subcommand;
use plandesk_proto::budget::{BudgetItem, format_amount};
use plandesk_proto::ids::{BudgetItemId, MemberId, RiskId, TaskId, UserId};
use plandesk_proto::risk::{Level, Risk, RiskStatus};
use plandesk_proto::task::{Priority, Task, TaskStatus};

use crate::app::{App, AppError};
use crate::calendar;
use crate::risks::RiskUpdate;
use crate::store::DocumentStore;
use crate::tasks::{StatusChange, TaskDraft, TaskEdit};

/// Days shown by `calendar` when `--to` is omitted.
const DEFAULT_CALENDAR_DAYS: u64 = 30;

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, list, rename or delete projects.
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage tasks of the selected project.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage the team of the selected project.
    #[command(subcommand)]
    Member(MemberCommand),
    /// Manage the budget of the selected project.
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Manage the risk register of the selected project.
    #[command(subcommand)]
    Risk(RiskCommand),
    /// Print the project report.
    Report {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print tasks grouped by due date.
    Calendar {
        /// First day shown (default: today).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day shown (default: 30 days after `--from`).
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Print tasks whose reminder is due.
    Reminders,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project owned by you.
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the projects you belong to.
    List,
    /// Rename the selected project.
    Rename { name: String },
    /// Give another user access to the selected project.
    AddMember { user: String },
    /// Delete the selected project and everything in it.
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task.
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        assignee: Option<MemberId>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        remind_at: Option<DateTime<Utc>>,
    },
    /// List tasks in creation order.
    List,
    /// Show tasks grouped by status.
    Board,
    /// Edit task details.
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<MemberId>,
        /// Remove the assignee.
        #[arg(long)]
        unassign: bool,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        remind_at: Option<DateTime<Utc>>,
    },
    /// Replace a task's prerequisites (none clears them).
    Deps { id: TaskId, depends_on: Vec<TaskId> },
    /// Move a task to another status.
    Status { id: TaskId, status: TaskStatus },
    /// Delete a task.
    Rm { id: TaskId },
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Add a team member.
    Add {
        name: String,
        email: String,
        #[arg(long, default_value = "")]
        role: String,
    },
    /// List the team.
    List,
    /// Change a member's role.
    Role { id: MemberId, role: String },
    /// Remove a member and clear their assignments.
    Rm { id: MemberId },
}

#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    /// Add a budget item. Amounts are decimal, e.g. `1250.50`.
    Add {
        category: String,
        #[arg(value_parser = parse_amount)]
        planned: i64,
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        actual: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Print the budget table.
    List,
    /// Update the amounts of an item.
    Set {
        id: BudgetItemId,
        #[arg(long, value_parser = parse_amount)]
        planned: Option<i64>,
        #[arg(long, value_parser = parse_amount)]
        actual: Option<i64>,
    },
    /// Delete an item.
    Rm { id: BudgetItemId },
}

#[derive(Subcommand, Debug)]
pub enum RiskCommand {
    /// Record a risk.
    Add {
        title: String,
        #[arg(long, default_value = "medium")]
        probability: Level,
        #[arg(long, default_value = "medium")]
        impact: Level,
        #[arg(long, default_value = "")]
        mitigation: String,
    },
    /// Print the register and the probability/impact matrix.
    List,
    /// Change a risk's status.
    Status {
        id: RiskId,
        status: RiskStatus,
        #[arg(long)]
        mitigation: Option<String>,
    },
    /// Delete a risk.
    Rm { id: RiskId },
}

/// What a command printed and whether it changed stored data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Text for stdout.
    pub output: String,
    /// `true` if the store must be saved.
    pub mutated: bool,
}

impl Outcome {
    fn read(output: String) -> Self {
        Self {
            output,
            mutated: false,
        }
    }

    fn write(output: String) -> Self {
        Self {
            output,
            mutated: true,
        }
    }
}

/// Parses a decimal amount (`12`, `12.5`, `12.50`) into minor units.
///
/// # Errors
///
/// Returns a message if the text is not a number with at most two decimals.
pub fn parse_amount(s: &str) -> Result<i64, String> {
    let invalid = || format!("invalid amount: {s}");
    let trimmed = s.trim();
    let (negative, digits) = trimmed
        .strip_prefix('-')
        .map_or((false, trimmed), |rest| (true, rest));
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || frac.len() > 2 || !all_digits(whole) || !all_digits(frac) {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    let minor = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(invalid)?;
    Ok(if negative { -minor } else { minor })
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn task_line(task: &Task) -> String {
    let mut line = format!("{}  [{}] {}", task.id, task.status.label(), task.title);
    if task.priority != Priority::Medium {
        let _ = write!(line, "  priority:{}", task.priority);
    }
    if let Some(due) = task.due_date {
        let _ = write!(line, "  due:{due}");
    }
    if !task.depends_on.is_empty() {
        let _ = write!(line, "  depends on {}", task.depends_on.len());
    }
    line
}

fn budget_line(item: &BudgetItem) -> String {
    format!(
        "{}  {:<16} {:>12} {:>12} {:>12}  {}",
        item.id,
        item.category,
        format_amount(item.planned),
        format_amount(item.actual),
        format_amount(item.variance()),
        item.description
    )
}

fn risk_line(risk: &Risk) -> String {
    format!(
        "{}  [{}] {}  {}x{}={}  {}",
        risk.id,
        risk.severity(),
        risk.title,
        risk.probability,
        risk.impact,
        risk.score(),
        risk.status
    )
}

/// Runs one command.
///
/// # Errors
///
/// Returns [`AppError`] for invalid input, missing documents, access
/// violations, store failures or a missing project selection.
pub async fn execute<S: DocumentStore>(app: &mut App<S>, command: Command) -> Result<Outcome, AppError> {
    match command {
        Command::Project(cmd) => project(app, cmd).await,
        Command::Task(cmd) => task(app, cmd).await,
        Command::Member(cmd) => member(app, cmd).await,
        Command::Budget(cmd) => budget(app, cmd).await,
        Command::Risk(cmd) => risk(app, cmd).await,
        Command::Report { json } => {
            let report = app.report(app.current_project()?, today()).await?;
            let output = if json {
                let mut out = report.to_json()?;
                out.push('\n');
                out
            } else {
                report.to_text()
            };
            Ok(Outcome::read(output))
        }
        Command::Calendar { from, to } => {
            let from = from.unwrap_or_else(today);
            let to = to
                .or_else(|| from.checked_add_days(Days::new(DEFAULT_CALENDAR_DAYS)))
                .unwrap_or(from);
            let tasks = app.tasks.list(app.current_project()?).await?;
            let mut out = String::new();
            for day in calendar::timeline(&tasks, from, to) {
                let _ = writeln!(out, "{}", day.date);
                for task in &day.tasks {
                    let _ = writeln!(out, "  {}", task_line(task));
                }
            }
            Ok(Outcome::read(out))
        }
        Command::Reminders => {
            let tasks = app.tasks.list(app.current_project()?).await?;
            let mut out = String::new();
            for task in calendar::due_reminders(&tasks, Utc::now()) {
                let _ = writeln!(out, "{}", task_line(task));
            }
            Ok(Outcome::read(out))
        }
    }
}

async fn project<S: DocumentStore>(app: &mut App<S>, cmd: ProjectCommand) -> Result<Outcome, AppError> {
    match cmd {
        ProjectCommand::Create { name, description } => {
            let project = app.projects.create(&name, &description).await?;
            app.scope.select(project.id);
            app.notifications.success(format!("Created project \"{}\"", project.name));
            Ok(Outcome::write(format!("{}\n", project.id)))
        }
        ProjectCommand::List => {
            let current = app.scope.current();
            let mut out = String::new();
            for project in app.projects.list_for_user().await? {
                let marker = if current == Some(project.id) { '*' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{marker} {}  {}  ({} members)",
                    project.id,
                    project.name,
                    project.members.len()
                );
            }
            Ok(Outcome::read(out))
        }
        ProjectCommand::Rename { name } => {
            let project = app.projects.rename(app.current_project()?, &name).await?;
            Ok(Outcome::write(format!("{}  {}\n", project.id, project.name)))
        }
        ProjectCommand::AddMember { user } => {
            let project = app
                .projects
                .add_member(app.current_project()?, UserId::new(user))
                .await?;
            Ok(Outcome::write(format!("{} members\n", project.members.len())))
        }
        ProjectCommand::Delete => {
            let id = app.current_project()?;
            let removed = app.projects.delete(id).await?;
            app.scope.clear();
            app.notifications.success(format!("Deleted project and {} documents", removed.saturating_sub(1)));
            Ok(Outcome::write(String::new()))
        }
    }
}

async fn task<S: DocumentStore>(app: &mut App<S>, cmd: TaskCommand) -> Result<Outcome, AppError> {
    match cmd {
        TaskCommand::Add {
            title,
            description,
            priority,
            assignee,
            start,
            due,
            remind_at,
        } => {
            let draft = TaskDraft {
                title,
                description,
                priority,
                assignee,
                start_date: start,
                due_date: due,
                reminder_at: remind_at,
            };
            let task = app.tasks.create(app.current_project()?, draft).await?;
            Ok(Outcome::write(format!("{}\n", task_line(&task))))
        }
        TaskCommand::List => {
            let mut out = String::new();
            for task in app.tasks.list(app.current_project()?).await? {
                let _ = writeln!(out, "{}", task_line(&task));
            }
            Ok(Outcome::read(out))
        }
        TaskCommand::Board => {
            let mut out = String::new();
            for column in app.tasks.board(app.current_project()?).await? {
                let _ = writeln!(out, "{} ({})", column.status.label(), column.tasks.len());
                for task in &column.tasks {
                    let _ = writeln!(out, "  {}", task_line(task));
                }
            }
            Ok(Outcome::read(out))
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            priority,
            assignee,
            unassign,
            start,
            due,
            clear_due,
            remind_at,
        } => {
            let edit = TaskEdit {
                title,
                description,
                priority,
                assignee: if unassign { Some(None) } else { assignee.map(Some) },
                start_date: start.map(Some),
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                reminder_at: remind_at.map(Some),
            };
            let task = app.tasks.edit(id, edit).await?;
            Ok(Outcome::write(format!("{}\n", task_line(&task))))
        }
        TaskCommand::Deps { id, depends_on } => {
            let task = app.tasks.set_dependencies(id, &depends_on).await?;
            Ok(Outcome::write(format!("{}\n", task_line(&task))))
        }
        TaskCommand::Status { id, status } => match app.tasks.change_status(id, status).await? {
            StatusChange::Applied(task) => {
                app.notifications.success(format!("\"{}\" moved to {}", task.title, task.status.label()));
                Ok(Outcome::write(format!("{}\n", task_line(&task))))
            }
            StatusChange::Unchanged(task) => Ok(Outcome::read(format!("{}\n", task_line(&task)))),
            StatusChange::Blocked(rejection) => {
                let mut out = String::new();
                for blocker in &rejection.blocked_by {
                    let _ = writeln!(out, "{}  [{}] {}", blocker.id, blocker.status.label(), blocker.title);
                }
                app.notifications.warning(rejection.message());
                Ok(Outcome::read(out))
            }
        },
        TaskCommand::Rm { id } => {
            let unlinked = app.tasks.delete_task(id).await?;
            if unlinked > 0 {
                app.notifications.info(format!("Removed from the prerequisites of {unlinked} tasks"));
            }
            Ok(Outcome::write(String::new()))
        }
    }
}

async fn member<S: DocumentStore>(app: &mut App<S>, cmd: MemberCommand) -> Result<Outcome, AppError> {
    match cmd {
        MemberCommand::Add { name, email, role } => {
            let member = app.team.add(app.current_project()?, &name, &email, &role).await?;
            Ok(Outcome::write(format!("{}\n", member.id)))
        }
        MemberCommand::List => {
            let mut out = String::new();
            for m in app.team.list(app.current_project()?).await? {
                let _ = writeln!(out, "{}  {}  <{}>  {}", m.id, m.name, m.email, m.role);
            }
            Ok(Outcome::read(out))
        }
        MemberCommand::Role { id, role } => {
            let m = app.team.update_role(id, &role).await?;
            Ok(Outcome::write(format!("{}  {}  {}\n", m.id, m.name, m.role)))
        }
        MemberCommand::Rm { id } => {
            let cleared = app.team.remove(id).await?;
            if cleared > 0 {
                app.notifications.info(format!("Cleared {cleared} assignments"));
            }
            Ok(Outcome::write(String::new()))
        }
    }
}

async fn budget<S: DocumentStore>(app: &mut App<S>, cmd: BudgetCommand) -> Result<Outcome, AppError> {
    match cmd {
        BudgetCommand::Add {
            category,
            planned,
            actual,
            description,
        } => {
            let item = app
                .budget
                .add(app.current_project()?, &category, &description, planned, actual)
                .await?;
            Ok(Outcome::write(format!("{}\n", budget_line(&item))))
        }
        BudgetCommand::List => {
            let items = app.budget.list(app.current_project()?).await?;
            let summary = crate::budget::BudgetSummary::from_items(&items);
            let mut out = String::new();
            for item in &items {
                let _ = writeln!(out, "{}", budget_line(item));
            }
            let _ = writeln!(
                out,
                "total planned {}  actual {}  variance {}  ({} over budget)",
                format_amount(summary.total.planned),
                format_amount(summary.total.actual),
                format_amount(summary.total.variance),
                summary.total.over_budget
            );
            Ok(Outcome::read(out))
        }
        BudgetCommand::Set { id, planned, actual } => {
            let item = app.budget.update_amounts(id, planned, actual).await?;
            if item.is_over_budget() {
                app.notifications.warning(format!(
                    "{} is over budget by {}",
                    item.category,
                    format_amount(-item.variance())
                ));
            }
            Ok(Outcome::write(format!("{}\n", budget_line(&item))))
        }
        BudgetCommand::Rm { id } => {
            app.budget.remove(id).await?;
            Ok(Outcome::write(String::new()))
        }
    }
}

async fn risk<S: DocumentStore>(app: &mut App<S>, cmd: RiskCommand) -> Result<Outcome, AppError> {
    match cmd {
        RiskCommand::Add {
            title,
            probability,
            impact,
            mitigation,
        } => {
            let risk = app
                .risks
                .add(app.current_project()?, &title, probability, impact, &mitigation)
                .await?;
            Ok(Outcome::write(format!("{}\n", risk_line(&risk))))
        }
        RiskCommand::List => {
            let project = app.current_project()?;
            let register = app.risks.register(project).await?;
            let matrix = crate::risks::RiskMatrix::from_risks(&register);
            let mut out = String::new();
            for risk in &register {
                let _ = writeln!(out, "{}", risk_line(risk));
            }
            let _ = writeln!(out, "probability \\ impact  low medium high");
            for probability in Level::ALL.iter().rev() {
                let _ = write!(out, "{:<21}", probability.to_string());
                for impact in Level::ALL {
                    let _ = write!(out, " {:>4}", matrix.count(*probability, impact));
                }
                out.push('\n');
            }
            Ok(Outcome::read(out))
        }
        RiskCommand::Status {
            id,
            status,
            mitigation,
        } => {
            let update = RiskUpdate {
                status: Some(status),
                mitigation,
                ..RiskUpdate::default()
            };
            let risk = app.risks.update(id, update).await?;
            Ok(Outcome::write(format!("{}\n", risk_line(&risk))))
        }
        RiskCommand::Rm { id } => {
            app.risks.remove(id).await?;
            Ok(Outcome::write(String::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_parse_to_minor_units() {
        assert_eq!(parse_amount("12"), Ok(1_200));
        assert_eq!(parse_amount("12.5"), Ok(1_250));
        assert_eq!(parse_amount("12.05"), Ok(1_205));
        assert_eq!(parse_amount(".75"), Ok(75));
        assert_eq!(parse_amount("-3.10"), Ok(-310));
    }

    #[test]
    fn bad_amounts_are_rejected() {
        for bad in ["", ".", "1.234", "1,5", "abc", "1.-5"] {
            assert!(parse_amount(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn task_line_shows_details() {
        let mut task = Task::new(
            plandesk_proto::ids::ProjectId::new(),
            "Ship",
            &UserId::new("u"),
        );
        task.priority = Priority::High;
        task.due_date = NaiveDate::from_ymd_opt(2025, 2, 3);
        let line = task_line(&task);
        assert!(line.contains("[Not started] Ship"));
        assert!(line.contains("priority:high"));
        assert!(line.contains("due:2025-02-03"));
    }
}
