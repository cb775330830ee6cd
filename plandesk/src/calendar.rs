//! Timeline and reminders.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use plandesk_proto::task::Task;

/// Tasks due on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineDay {
    pub date: NaiveDate,
    /// Ordered by title.
    pub tasks: Vec<Task>,
}

/// Groups tasks by due date within `from..=to`, earliest first.
///
/// Tasks without a due date are left out.
#[must_use]
pub fn timeline(tasks: &[Task], from: NaiveDate, to: NaiveDate) -> Vec<TimelineDay> {
    let mut days: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(due) = task.due_date.filter(|d| (from..=to).contains(d)) {
            days.entry(due).or_default().push(task.clone());
        }
    }
    days.into_iter()
        .map(|(date, mut tasks)| {
            tasks.sort_by(|a, b| a.title.cmp(&b.title));
            TimelineDay { date, tasks }
        })
        .collect()
}

/// Tasks whose reminder has come due at `now` and that are not Done,
/// oldest reminder first.
#[must_use]
pub fn due_reminders(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    let mut due: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_done() && t.reminder_at.is_some_and(|at| at <= now))
        .collect();
    due.sort_by_key(|t| t.reminder_at);
    due
}
