//! Aggregate counts for the dashboard.

use chrono::NaiveDate;
use serde::Serialize;

use super::is_overdue;
use crate::db::{Subject, Task, TaskStatus};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total:        usize,
    pub done:         usize,
    /// Open and in-progress together.
    pub open:         usize,
    pub overdue:      usize,
    pub percent_done: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub done:       usize,
    pub open:       usize,
    /// Sum of estimated minutes over all of the subject's tasks.
    pub total_time: u64,
}

/// Estimated minutes, split by completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeSummary {
    pub total:     u64,
    pub done:      u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectRow {
    pub subject_id: String,
    pub name:       String,
    pub color:      String,
    pub stats:      SubjectStats,
}

pub fn calculate_stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    let total   = tasks.len();
    let done    = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let open    = tasks.iter().filter(|t| t.status.is_pending()).count();
    let overdue = tasks.iter().filter(|t| is_overdue(t, today)).count();
    TaskStats { total, done, open, overdue, percent_done: percent(done, total) }
}

pub fn calculate_subject_stats(tasks: &[Task], subject_id: &str) -> SubjectStats {
    tasks.iter()
        .filter(|t| t.subject_id == subject_id)
        .fold(SubjectStats::default(), |mut acc, t| {
            match t.status {
                TaskStatus::Done                           => acc.done += 1,
                TaskStatus::Open | TaskStatus::InProgress  => acc.open += 1,
            }
            acc.total_time += u64::from(t.estimated_time_minutes);
            acc
        })
}

pub fn calculate_time_summary(tasks: &[Task]) -> TimeSummary {
    let total: u64 = tasks.iter().map(|t| u64::from(t.estimated_time_minutes)).sum();
    let done: u64 = tasks.iter()
        .filter(|t| t.status == TaskStatus::Done)
        .map(|t| u64::from(t.estimated_time_minutes))
        .sum();
    TimeSummary { total, done, remaining: total - done }
}

/// One row per subject, in subject order.
pub fn subject_breakdown(subjects: &[Subject], tasks: &[Task]) -> Vec<SubjectRow> {
    subjects.iter().map(|s| SubjectRow {
        subject_id: s.id.clone(),
        name:       s.name.clone(),
        color:      s.color.clone(),
        stats:      calculate_subject_stats(tasks, &s.id),
    }).collect()
}

/// Display name for a subject id, falling back for dangling references.
pub fn subject_name<'a>(subjects: &'a [Subject], id: &str) -> &'a str {
    subjects.iter().find(|s| s.id == id).map_or("Unknown", |s| s.name.as_str())
}

pub fn subject_color<'a>(subjects: &'a [Subject], id: &str) -> &'a str {
    subjects.iter().find(|s| s.id == id).map_or(theme::FALLBACK_COLOR, |s| s.color.as_str())
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 { return 0; }
    (part as f64 / whole as f64 * 100.0).round() as u8
}
