//! Plain-text rendering of task lists, subjects and the dashboard.

use chrono::NaiveDate;
use std::fmt::Write;

use crate::db::{Subject, Task, TaskType};
use crate::tasks::stats::{subject_color, subject_name, SubjectRow, TaskStats, TimeSummary};
use crate::tasks::{calculate_priority, status_badge, StatusBadge};
use crate::theme;

const BAR_WIDTH: usize = 20;

// ─── Formatting ───────────────────────────────────────────────────────────────

/// `dd.mm.yyyy`
pub fn format_date(d: NaiveDate) -> String {
    d.format("%d.%m.%Y").to_string()
}

/// `1h 30min`, `2h` or `45min`.
pub fn format_time(minutes: u64) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

pub fn type_label(t: TaskType) -> &'static str {
    match t {
        TaskType::Homework => "Homework",
        TaskType::Exam     => "Exam",
        TaskType::Project  => "Project",
    }
}

pub fn badge_label(b: StatusBadge) -> &'static str {
    match b {
        StatusBadge::Done       => "✓ Done",
        StatusBadge::Overdue    => "⚠ Overdue",
        StatusBadge::DueToday   => "🔥 Today",
        StatusBadge::InProgress => "⏳ In progress",
        StatusBadge::Open       => "○ Open",
    }
}

fn badge_color(b: StatusBadge) -> &'static str {
    match b {
        StatusBadge::Done       => "#10b981",
        StatusBadge::Overdue    => "#ef4444",
        StatusBadge::DueToday   => "#f59e0b",
        StatusBadge::InProgress => "#3b82f6",
        StatusBadge::Open       => "#6b7280",
    }
}

pub fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// First block of a uuid, enough to address a task on the command line.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

// ─── Views ────────────────────────────────────────────────────────────────────

pub struct View<'a> {
    pub subjects: &'a [Subject],
    pub today:    NaiveDate,
    pub color:    bool,
}

impl View<'_> {
    fn paint(&self, hex: &str, text: &str) -> String {
        if self.color { theme::paint(hex, text) } else { text.to_owned() }
    }

    pub fn task_line(&self, t: &Task) -> String {
        let badge   = status_badge(t, self.today);
        let subject = self.paint(
            subject_color(self.subjects, &t.subject_id),
            subject_name(self.subjects, &t.subject_id),
        );
        let mut line = format!(
            "{:<8}  {:>3}  {}  {}  [{}] {} · due {} · {}",
            short_id(&t.id),
            calculate_priority(t, self.today),
            self.paint(badge_color(badge), badge_label(badge)),
            t.title,
            subject,
            type_label(t.task_type),
            format_date(t.due_date),
            format_time(u64::from(t.estimated_time_minutes)),
        );
        if let Some(desc) = &t.description {
            let _ = write!(line, "\n            {desc}");
        }
        line
    }

    pub fn task_list(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return "No tasks found. Add one or change the filter.".to_owned();
        }
        let mut out = String::from("ID        PRIO  TASK\n");
        for t in tasks {
            out.push_str(&self.task_line(t));
            out.push('\n');
        }
        out
    }

    pub fn subject_list(&self, rows: &[SubjectRow]) -> String {
        if rows.is_empty() {
            return "No subjects yet. Create one with: sp add-subject NAME".to_owned();
        }
        let mut out = String::new();
        for r in rows {
            let _ = writeln!(
                out, "{:<8}  {}  {} open · {} done · {}",
                short_id(&r.subject_id),
                self.paint(&r.color, &format!("● {}", r.name)),
                r.stats.open, r.stats.done,
                format_time(r.stats.total_time),
            );
        }
        out
    }

    pub fn dashboard(&self, stats: &TaskStats, time: &TimeSummary, rows: &[SubjectRow]) -> String {
        if stats.total == 0 {
            return "No data yet. Create tasks to see statistics.".to_owned();
        }
        let mut out = String::new();
        let _ = writeln!(out, "Progress  {} {}%", progress_bar(stats.percent_done), stats.percent_done);
        let overdue = format!("{} overdue", stats.overdue);
        let overdue = if stats.overdue > 0 { self.paint("#ef4444", &overdue) } else { overdue };
        let _ = writeln!(out, "Tasks     {} done · {} open · {}", stats.done, stats.open, overdue);
        let _ = writeln!(
            out, "Time      {} total · {} done · {} remaining",
            format_time(time.total), format_time(time.done), format_time(time.remaining),
        );
        if !rows.is_empty() {
            out.push_str("\nBy subject\n");
            out.push_str(&self.subject_list(rows));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TaskStatus;
    use crate::tasks::fixtures::{task, titled, today, with_status};
    use crate::tasks::stats::SubjectStats;

    fn plain(subjects: &[Subject]) -> View<'_> {
        View { subjects, today: today(), color: false }
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_time(0), "0min");
        assert_eq!(format_time(45), "45min");
        assert_eq!(format_time(120), "2h");
        assert_eq!(format_time(95), "1h 35min");
    }

    #[test]
    fn formats_dates_day_first() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()), "07.03.2024");
    }

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }

    #[test]
    fn task_line_shows_priority_badge_and_fallback_subject() {
        let t = titled(task(0, 3), "Worksheet");
        let line = plain(&[]).task_line(&t);
        assert!(line.contains(" 80 "), "{line}");
        assert!(line.contains("🔥 Today"));
        assert!(line.contains("Worksheet"));
        assert!(line.contains("[Unknown] Homework"));
        assert!(line.contains("15.05.2024"));
        assert!(line.contains("1h"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn done_task_gets_done_badge() {
        let t = with_status(task(-1, 3), TaskStatus::Done);
        assert!(plain(&[]).task_line(&t).contains("✓ Done"));
    }

    #[test]
    fn empty_views_show_hints() {
        assert!(plain(&[]).task_list(&[]).starts_with("No tasks"));
        assert!(plain(&[]).subject_list(&[]).starts_with("No subjects"));
        let zero = TaskStats::default();
        assert!(plain(&[]).dashboard(&zero, &TimeSummary::default(), &[]).starts_with("No data"));
    }

    #[test]
    fn dashboard_lists_subject_rows() {
        let rows = vec![SubjectRow {
            subject_id: "abcd1234-0000".into(),
            name: "Math".into(),
            color: "#667eea".into(),
            stats: SubjectStats { done: 2, open: 1, total_time: 95 },
        }];
        let stats = TaskStats { total: 3, done: 2, open: 1, overdue: 0, percent_done: 67 };
        let time  = TimeSummary { total: 95, done: 75, remaining: 20 };
        let out = plain(&[]).dashboard(&stats, &time, &rows);
        assert!(out.contains("67%"));
        assert!(out.contains("2 done · 1 open · 0 overdue"));
        assert!(out.contains("abcd1234"));
        assert!(out.contains("● Math  1 open · 2 done · 1h 35min"));
    }
}
