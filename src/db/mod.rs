mod planner;
mod store;

pub use planner::Planner;
pub use store::{default_db_path, Database};
#[cfg(test)]
pub use store::MemoryStore;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::theme;

// ─── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Homework,
    Exam,
    Project,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Homework => "homework",
            TaskType::Exam     => "exam",
            TaskType::Project  => "project",
        }
    }
}

impl FromStr for TaskType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "homework" => Ok(TaskType::Homework),
            "exam"     => Ok(TaskType::Exam),
            "project"  => Ok(TaskType::Project),
            _          => Err(ValidationError::UnknownTaskType(s.to_owned())),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open       => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done       => "done",
        }
    }

    /// Open and in-progress both count as "still to do".
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Open | TaskStatus::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open"                       => Ok(TaskStatus::Open),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "done"                       => Ok(TaskStatus::Done),
            _                            => Err(ValidationError::UnknownStatus(s.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Task difficulty, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn get(self) -> u8 { self.0 }
}

impl Default for Difficulty {
    fn default() -> Self { Difficulty(3) }
}

impl TryFrom<i64> for Difficulty {
    type Error = ValidationError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if (1..=5).contains(&v) {
            Ok(Difficulty(v as u8))
        } else {
            Err(ValidationError::DifficultyOutOfRange(v))
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 { d.0 }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v: i64 = s.trim().parse()
            .map_err(|_| ValidationError::InvalidDifficulty(s.to_owned()))?;
        Difficulty::try_from(v)
    }
}

// ─── Domain models ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id:         String,
    pub name:       String,
    pub color:      String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id:          String,
    pub subject_id:  String,
    pub title:       String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub task_type:   TaskType,
    pub difficulty:  Difficulty,
    pub due_date:    NaiveDate,
    #[serde(default, deserialize_with = "minutes_or_zero")]
    pub estimated_time_minutes: u32,
    #[serde(default)]
    pub status:       TaskStatus,
    pub created_at:   DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A cleared estimate is stored as `null`; it counts as zero minutes.
fn minutes_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or(0))
}

// ─── Construction ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name:  String,
    pub color: String,
}

impl NewSubject {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), color: theme::default_color().to_owned() }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_owned();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_subject_name(&self.name)?;
        validate_color(&self.color)
    }

    pub(crate) fn build(self, created_at: DateTime<Utc>) -> Subject {
        Subject {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_owned(),
            color: self.color,
            created_at,
        }
    }
}

/// Input for a new task. Defaults mirror the task form: homework,
/// difficulty 3, one hour.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub subject_id:  String,
    pub title:       String,
    pub description: Option<String>,
    pub task_type:   TaskType,
    pub difficulty:  Difficulty,
    pub due_date:    NaiveDate,
    pub estimated_time_minutes: u32,
}

impl NewTask {
    pub fn new(subject_id: &str, title: &str, due_date: NaiveDate) -> Self {
        Self {
            subject_id: subject_id.to_owned(),
            title: title.to_owned(),
            description: None,
            task_type: TaskType::default(),
            difficulty: Difficulty::default(),
            due_date,
            estimated_time_minutes: 60,
        }
    }

    pub fn task_type(mut self, t: TaskType) -> Self { self.task_type = t; self }
    pub fn difficulty(mut self, d: Difficulty) -> Self { self.difficulty = d; self }
    pub fn minutes(mut self, m: u32) -> Self { self.estimated_time_minutes = m; self }
    pub fn description(mut self, d: &str) -> Self { self.description = Some(d.to_owned()); self }

    /// Field checks only; the subject reference is checked by the planner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_minutes(self.estimated_time_minutes)
    }

    pub(crate) fn build(self, created_at: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4().to_string(),
            subject_id: self.subject_id,
            title: self.title.trim().to_owned(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            task_type: self.task_type,
            difficulty: self.difficulty,
            due_date: self.due_date,
            estimated_time_minutes: self.estimated_time_minutes,
            status: TaskStatus::Open,
            created_at,
            completed_at: None,
        }
    }
}

// ─── Partial updates ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name:  Option<String>,
    pub color: Option<String>,
}

impl SubjectPatch {
    pub fn is_empty(&self) -> bool { self.name.is_none() && self.color.is_none() }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name { validate_subject_name(name)?; }
        if let Some(color) = &self.color { validate_color(color)?; }
        Ok(())
    }

    pub(crate) fn apply(self, s: &mut Subject) {
        if let Some(name) = self.name { s.name = name.trim().to_owned(); }
        if let Some(color) = self.color { s.color = color; }
    }
}

/// Only the fields that are `Some` change. `completed_at: Some(None)`
/// clears the completion stamp, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub subject_id:   Option<String>,
    pub title:        Option<String>,
    pub description:  Option<Option<String>>,
    pub task_type:    Option<TaskType>,
    pub difficulty:   Option<Difficulty>,
    pub due_date:     Option<NaiveDate>,
    pub estimated_time_minutes: Option<u32>,
    pub status:       Option<TaskStatus>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    /// Back to open with the completion stamp cleared.
    pub fn reopen() -> Self {
        Self { status: Some(TaskStatus::Open), completed_at: Some(None), ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title { validate_title(title)?; }
        if let Some(m) = self.estimated_time_minutes { validate_minutes(m)?; }
        Ok(())
    }

    /// Merges the patch into `t`. A transition to done stamps `now` unless
    /// the task already carries a completion time.
    pub(crate) fn apply(self, t: &mut Task, now: DateTime<Utc>) {
        if let Some(v) = self.subject_id   { t.subject_id = v; }
        if let Some(v) = self.title        { t.title = v.trim().to_owned(); }
        if let Some(v) = self.description  { t.description = v.filter(|d| !d.trim().is_empty()); }
        if let Some(v) = self.task_type    { t.task_type = v; }
        if let Some(v) = self.difficulty   { t.difficulty = v; }
        if let Some(v) = self.due_date     { t.due_date = v; }
        if let Some(v) = self.estimated_time_minutes { t.estimated_time_minutes = v; }
        if let Some(v) = self.completed_at { t.completed_at = v; }
        if let Some(v) = self.status {
            t.status = v;
            if v == TaskStatus::Done && t.completed_at.is_none() {
                t.completed_at = Some(now);
            }
        }
    }
}

// ─── Field validation ─────────────────────────────────────────────────────────

fn validate_subject_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() { Err(ValidationError::EmptySubjectName) } else { Ok(()) }
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    if theme::is_hex_color(color) { Ok(()) } else { Err(ValidationError::InvalidColor(color.to_owned())) }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() { Err(ValidationError::EmptyTitle) } else { Ok(()) }
}

fn validate_minutes(m: u32) -> Result<(), ValidationError> {
    if m == 0 { Err(ValidationError::NonPositiveEstimate) } else { Ok(()) }
}
