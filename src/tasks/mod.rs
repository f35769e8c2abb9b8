//! Priority scoring, due-date predicates and ordering for tasks.
//!
//! Everything here is a pure function of the task list and `today`.

pub mod filter;
pub mod stats;

use chrono::NaiveDate;

use crate::calendar::days_until;
use crate::db::{Task, TaskStatus};

/// Urgency given to a task due today or earlier.
const MAX_URGENCY: f64 = 50.0;

/// Priority score in 0..=100: `50 / max(1, days left) + difficulty * 10`,
/// rounded half up and capped at 100.
pub fn calculate_priority(task: &Task, today: NaiveDate) -> u8 {
    let days_left  = days_until(task.due_date, today).max(1);
    let urgency    = MAX_URGENCY / days_left as f64;
    let difficulty = f64::from(task.difficulty.get()) * 10.0;
    (urgency + difficulty).min(100.0).round() as u8
}

/// Past due and not done. A done task is never overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.due_date < today && task.status != TaskStatus::Done
}

/// Due today, whatever the status.
pub fn is_due_today(task: &Task, today: NaiveDate) -> bool {
    task.due_date == today
}

/// Highest priority first, earlier due date on ties. The input is left
/// untouched; full ties keep their input order.
pub fn sort_tasks(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        calculate_priority(b, today).cmp(&calculate_priority(a, today))
            .then(a.due_date.cmp(&b.due_date))
    });
    sorted
}

// ─── Status badge ─────────────────────────────────────────────────────────────

/// The single label a task list shows next to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Done,
    Overdue,
    DueToday,
    InProgress,
    Open,
}

pub fn status_badge(task: &Task, today: NaiveDate) -> StatusBadge {
    match task.status {
        TaskStatus::Done                        => StatusBadge::Done,
        _ if is_overdue(task, today)            => StatusBadge::Overdue,
        _ if is_due_today(task, today)          => StatusBadge::DueToday,
        TaskStatus::InProgress                  => StatusBadge::InProgress,
        TaskStatus::Open                        => StatusBadge::Open,
    }
}
