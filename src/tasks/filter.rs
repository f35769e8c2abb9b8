use chrono::NaiveDate;
use std::str::FromStr;

use super::{is_due_today, is_overdue, sort_tasks};
use crate::db::{Task, TaskStatus, TaskType};

/// The status dropdown of the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    All,
    /// Open or in progress.
    #[default]
    Open,
    Done,
    /// Due today and not done yet.
    Today,
    Overdue,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            StatusFilter::All     => true,
            StatusFilter::Open    => task.status.is_pending(),
            StatusFilter::Done    => task.status == TaskStatus::Done,
            StatusFilter::Today   => is_due_today(task, today) && task.status != TaskStatus::Done,
            StatusFilter::Overdue => is_overdue(task, today),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all"     => Ok(StatusFilter::All),
            "open"    => Ok(StatusFilter::Open),
            "done"    => Ok(StatusFilter::Done),
            "today"   => Ok(StatusFilter::Today),
            "overdue" => Ok(StatusFilter::Overdue),
            other     => Err(format!("unknown filter '{other}' (all, open, done, today, overdue)")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status:     StatusFilter,
    pub subject_id: Option<String>,
    pub task_type:  Option<TaskType>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        self.status.matches(task, today)
            && self.subject_id.as_deref().map_or(true, |id| task.subject_id == id)
            && self.task_type.map_or(true, |t| task.task_type == t)
    }
}

/// Applies `filter` and returns the survivors in [`sort_tasks`] order.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter, today: NaiveDate) -> Vec<Task> {
    let kept: Vec<Task> = tasks.iter()
        .filter(|t| filter.matches(t, today))
        .cloned()
        .collect();
    sort_tasks(&kept, today)
}
