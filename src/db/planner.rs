//! Subject/task repository on top of a [`KvStore`].
//!
//! Both collections live in memory as owned lists in insertion order.
//! Every mutation builds the next version of the affected list, writes it
//! to the store wholesale and only then swaps it in, so a failed write
//! leaves the in-memory state untouched.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{KvStore, SUBJECTS_KEY, TASKS_KEY};
use super::{NewSubject, NewTask, Subject, SubjectPatch, Task, TaskPatch};
use crate::calendar::Clock;
use crate::error::{EntityKind, PlannerError, PlannerResult, ValidationError};

// ─── Collection I/O ───────────────────────────────────────────────────────────

async fn read_collection<S: KvStore, T: DeserializeOwned>(store: &S, key: &str) -> PlannerResult<Vec<T>> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|source| PlannerError::Corrupt { key: key.to_owned(), source }),
        None => Ok(Vec::new()),
    }
}

async fn write_collection<S: KvStore, T: Serialize>(store: &S, key: &str, items: &[T]) -> PlannerResult<()> {
    let raw = serde_json::to_string(items)
        .map_err(|source| PlannerError::Encode { key: key.to_owned(), source })?;
    store.put(key, &raw).await?;
    tracing::debug!(key, count = items.len(), "collection saved");
    Ok(())
}

pub async fn get_subjects<S: KvStore>(store: &S) -> PlannerResult<Vec<Subject>> {
    read_collection(store, SUBJECTS_KEY).await
}

pub async fn save_subjects<S: KvStore>(store: &S, subjects: &[Subject]) -> PlannerResult<()> {
    write_collection(store, SUBJECTS_KEY, subjects).await
}

pub async fn get_tasks<S: KvStore>(store: &S) -> PlannerResult<Vec<Task>> {
    read_collection(store, TASKS_KEY).await
}

pub async fn save_tasks<S: KvStore>(store: &S, tasks: &[Task]) -> PlannerResult<()> {
    write_collection(store, TASKS_KEY, tasks).await
}

// ─── Planner ──────────────────────────────────────────────────────────────────

pub struct Planner<S: KvStore> {
    store:    S,
    clock:    Box<dyn Clock>,
    subjects: Vec<Subject>,
    tasks:    Vec<Task>,
}

impl<S: KvStore> Planner<S> {
    pub async fn load(store: S, clock: Box<dyn Clock>) -> PlannerResult<Self> {
        let subjects = get_subjects(&store).await?;
        let tasks    = get_tasks(&store).await?;
        tracing::debug!(subjects = subjects.len(), tasks = tasks.len(), "planner loaded");
        Ok(Self { store, clock, subjects, tasks })
    }

    pub fn today(&self) -> NaiveDate { self.clock.today() }

    #[cfg(test)]
    pub fn store(&self) -> &S { &self.store }

    pub fn subjects(&self) -> &[Subject] { &self.subjects }
    pub fn tasks(&self) -> &[Task] { &self.tasks }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    #[cfg(test)]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ── Subjects ──────────────────────────────────────────────────────────────

    pub async fn add_subject(&mut self, new: NewSubject) -> PlannerResult<Subject> {
        new.validate()?;
        let subject = new.build(self.clock.now());

        let mut next = self.subjects.clone();
        next.push(subject.clone());
        save_subjects(&self.store, &next).await?;
        self.subjects = next;

        tracing::info!(id = %subject.id, name = %subject.name, "subject added");
        Ok(subject)
    }

    pub async fn update_subject(&mut self, id: &str, patch: SubjectPatch) -> PlannerResult<Subject> {
        patch.validate()?;
        let idx = self.subject_index(id)?;

        let mut next = self.subjects.clone();
        patch.apply(&mut next[idx]);
        let updated = next[idx].clone();
        save_subjects(&self.store, &next).await?;
        self.subjects = next;

        tracing::info!(id, "subject updated");
        Ok(updated)
    }

    /// Removes the subject and every task that references it. Returns the
    /// number of tasks removed.
    pub async fn delete_subject(&mut self, id: &str) -> PlannerResult<usize> {
        let idx = self.subject_index(id)?;

        let mut next_subjects = self.subjects.clone();
        next_subjects.remove(idx);
        let next_tasks: Vec<Task> = self.tasks.iter()
            .filter(|t| t.subject_id != id)
            .cloned()
            .collect();
        let removed = self.tasks.len() - next_tasks.len();

        save_subjects(&self.store, &next_subjects).await?;
        save_tasks(&self.store, &next_tasks).await?;
        self.subjects = next_subjects;
        self.tasks    = next_tasks;

        tracing::info!(id, removed_tasks = removed, "subject deleted");
        Ok(removed)
    }

    // ── Tasks ─────────────────────────────────────────────────────────────────

    pub async fn add_task(&mut self, new: NewTask) -> PlannerResult<Task> {
        new.validate()?;
        self.require_subject(&new.subject_id)?;
        let task = new.build(self.clock.now());

        let mut next = self.tasks.clone();
        next.push(task.clone());
        save_tasks(&self.store, &next).await?;
        self.tasks = next;

        tracing::info!(id = %task.id, subject = %task.subject_id, title = %task.title, "task added");
        Ok(task)
    }

    /// Merges `patch` into the task. See [`TaskPatch`] for how the
    /// completion stamp is handled.
    pub async fn update_task(&mut self, id: &str, patch: TaskPatch) -> PlannerResult<Task> {
        patch.validate()?;
        if let Some(subject_id) = &patch.subject_id {
            self.require_subject(subject_id)?;
        }
        let idx = self.task_index(id)?;

        let mut next = self.tasks.clone();
        patch.apply(&mut next[idx], self.clock.now());
        let updated = next[idx].clone();
        save_tasks(&self.store, &next).await?;
        self.tasks = next;

        tracing::info!(id, status = %updated.status, "task updated");
        Ok(updated)
    }

    pub async fn delete_task(&mut self, id: &str) -> PlannerResult<Task> {
        let idx = self.task_index(id)?;

        let mut next = self.tasks.clone();
        let removed = next.remove(idx);
        save_tasks(&self.store, &next).await?;
        self.tasks = next;

        tracing::info!(id, "task deleted");
        Ok(removed)
    }

    // ── Id lookup ─────────────────────────────────────────────────────────────

    /// Resolves a full id or a unique id prefix.
    pub fn resolve_subject_id(&self, prefix: &str) -> PlannerResult<String> {
        resolve(EntityKind::Subject, prefix, self.subjects.iter().map(|s| s.id.as_str()))
    }

    pub fn resolve_task_id(&self, prefix: &str) -> PlannerResult<String> {
        resolve(EntityKind::Task, prefix, self.tasks.iter().map(|t| t.id.as_str()))
    }

    fn subject_index(&self, id: &str) -> PlannerResult<usize> {
        self.subjects.iter().position(|s| s.id == id).ok_or_else(|| {
            tracing::warn!(id, "subject not found");
            PlannerError::not_found(EntityKind::Subject, id)
        })
    }

    fn task_index(&self, id: &str) -> PlannerResult<usize> {
        self.tasks.iter().position(|t| t.id == id).ok_or_else(|| {
            tracing::warn!(id, "task not found");
            PlannerError::not_found(EntityKind::Task, id)
        })
    }

    fn require_subject(&self, id: &str) -> Result<(), ValidationError> {
        if self.subject(id).is_some() {
            Ok(())
        } else {
            Err(ValidationError::UnknownSubject(id.to_owned()))
        }
    }
}

fn resolve<'a>(kind: EntityKind, prefix: &str, ids: impl Iterator<Item = &'a str>) -> PlannerResult<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(PlannerError::not_found(kind, prefix));
    }
    let hits: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    if hits.contains(&prefix) {
        return Ok(prefix.to_owned());
    }
    match hits.as_slice() {
        [id] => Ok((*id).to_owned()),
        []   => Err(PlannerError::not_found(kind, prefix)),
        _    => Err(PlannerError::AmbiguousId { kind, prefix: prefix.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use crate::db::{Database, MemoryStore, TaskStatus};

    fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() }

    async fn planner() -> Planner<MemoryStore> {
        Planner::load(MemoryStore::default(), Box::new(FixedClock::on(today()))).await.unwrap()
    }

    async fn with_subject(p: &mut Planner<MemoryStore>, name: &str) -> Subject {
        p.add_subject(NewSubject::new(name)).await.unwrap()
    }

    #[tokio::test]
    async fn empty_store_loads_empty_collections() {
        let p = planner().await;
        assert!(p.subjects().is_empty());
        assert!(p.tasks().is_empty());
        assert_eq!(p.today(), today());
    }

    #[tokio::test]
    async fn add_persists_json_records() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let task  = p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();

        let stored: Vec<Task> = serde_json::from_str(&p.store().raw(TASKS_KEY).unwrap()).unwrap();
        assert_eq!(stored, vec![task]);
        let stored: Vec<Subject> = serde_json::from_str(&p.store().raw(SUBJECTS_KEY).unwrap()).unwrap();
        assert_eq!(stored[0].name, "Math");
    }

    #[tokio::test]
    async fn add_task_requires_existing_subject() {
        let mut p = planner().await;
        let err = p.add_task(NewTask::new("nope", "Worksheet", today())).await.unwrap_err();
        assert!(matches!(err, PlannerError::Validation(ValidationError::UnknownSubject(_))));
        assert!(p.tasks().is_empty());
        assert_eq!(p.store().write_count(), 0);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_writing() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let writes = p.store().write_count();

        let err = p.add_task(NewTask::new(&math.id, "", today())).await.unwrap_err();
        assert!(matches!(err, PlannerError::Validation(ValidationError::EmptyTitle)));

        let err = p.add_subject(NewSubject::new("Art").with_color("pink")).await.unwrap_err();
        assert!(matches!(err, PlannerError::Validation(ValidationError::InvalidColor(_))));
        assert_eq!(p.store().write_count(), writes);
    }

    #[tokio::test]
    async fn update_task_merges_and_stamps_completion() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let t     = p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();

        let done = p.update_task(&t.id, TaskPatch::status(TaskStatus::Done)).await.unwrap();
        assert_eq!(done.title, "Worksheet");
        assert_eq!(done.completed_at, Some(FixedClock::on(today()).now()));

        let reopened = p.update_task(&t.id, TaskPatch::reopen()).await.unwrap();
        assert_eq!(reopened.status, TaskStatus::Open);
        assert_eq!(reopened.completed_at, None);
        assert_eq!(p.task(&t.id), Some(&reopened));
    }

    #[tokio::test]
    async fn update_rejects_moving_task_to_unknown_subject() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let t     = p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();

        let patch = TaskPatch { subject_id: Some("ghost".into()), ..Default::default() };
        assert!(p.update_task(&t.id, patch).await.is_err());
        assert_eq!(p.task(&t.id).unwrap().subject_id, math.id);
    }

    #[tokio::test]
    async fn missing_ids_report_not_found_without_writing() {
        let mut p = planner().await;
        with_subject(&mut p, "Math").await;
        let writes = p.store().write_count();

        let err = p.update_task("missing", TaskPatch::status(TaskStatus::Done)).await.unwrap_err();
        assert!(matches!(err, PlannerError::NotFound { kind: EntityKind::Task, .. }));
        let err = p.delete_task("missing").await.unwrap_err();
        assert!(matches!(err, PlannerError::NotFound { kind: EntityKind::Task, .. }));
        let err = p.update_subject("missing", SubjectPatch::default()).await.unwrap_err();
        assert!(matches!(err, PlannerError::NotFound { kind: EntityKind::Subject, .. }));
        let err = p.delete_subject("missing").await.unwrap_err();
        assert!(matches!(err, PlannerError::NotFound { kind: EntityKind::Subject, .. }));

        assert_eq!(p.store().write_count(), writes);
    }

    #[tokio::test]
    async fn delete_subject_cascades_to_its_tasks() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let bio   = with_subject(&mut p, "Biology").await;
        p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();
        p.add_task(NewTask::new(&math.id, "Exam prep", today())).await.unwrap();
        let keep = p.add_task(NewTask::new(&bio.id, "Cells", today())).await.unwrap();

        assert_eq!(p.delete_subject(&math.id).await.unwrap(), 2);
        assert_eq!(p.subjects().len(), 1);
        assert_eq!(p.tasks(), &[keep.clone()]);

        let stored = get_tasks(p.store()).await.unwrap();
        assert_eq!(stored, vec![keep]);
        assert_eq!(get_subjects(p.store()).await.unwrap()[0].id, bio.id);
    }

    #[tokio::test]
    async fn update_subject_changes_only_given_fields() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let patch = SubjectPatch { color: Some("#10b981".into()), ..Default::default() };
        let updated = p.update_subject(&math.id, patch).await.unwrap();
        assert_eq!(updated.name, "Math");
        assert_eq!(updated.color, "#10b981");
        assert_eq!(updated.created_at, math.created_at);
    }

    #[tokio::test]
    async fn delete_task_returns_removed_task() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        let t     = p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();
        assert_eq!(p.delete_task(&t.id).await.unwrap(), t);
        assert!(p.tasks().is_empty());
    }

    #[tokio::test]
    async fn corrupt_collection_fails_to_load() {
        let store = MemoryStore::default();
        store.put(TASKS_KEY, "{not json").await.unwrap();
        let err = Planner::load(store, Box::new(FixedClock::on(today()))).await.err().unwrap();
        assert!(matches!(err, PlannerError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn failed_cascade_write_keeps_memory_state() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        p.add_task(NewTask::new(&math.id, "Worksheet", today())).await.unwrap();

        p.store().refuse_writes_to(TASKS_KEY);
        let err = p.delete_subject(&math.id).await.unwrap_err();
        assert!(matches!(err, PlannerError::Storage(_)));
        assert_eq!(p.subjects().len(), 1);
        assert_eq!(p.tasks().len(), 1);
    }

    #[tokio::test]
    async fn null_estimate_in_stored_tasks_still_loads() {
        let store = MemoryStore::default();
        store.put(TASKS_KEY, r#"[{"id":"t1","subjectId":"s1","title":"Read","type":"exam",
            "difficulty":4,"dueDate":"2024-05-03","estimatedTimeMinutes":null,
            "status":"open","createdAt":"2024-04-20T08:00:00Z","completedAt":null}]"#).await.unwrap();
        let p = Planner::load(store, Box::new(FixedClock::on(today()))).await.unwrap();
        assert_eq!(p.tasks()[0].estimated_time_minutes, 0);
    }

    #[tokio::test]
    async fn resolves_unique_prefixes() {
        let mut p = planner().await;
        let math  = with_subject(&mut p, "Math").await;
        assert_eq!(p.resolve_subject_id(&math.id[..8]).unwrap(), math.id);
        assert_eq!(p.resolve_subject_id(&math.id).unwrap(), math.id);
        assert!(matches!(p.resolve_task_id("abc"), Err(PlannerError::NotFound { .. })));
        assert!(matches!(p.resolve_subject_id(""), Err(PlannerError::NotFound { .. })));

        let ids = ["abc1", "abc2", "abc"];
        let err = resolve(EntityKind::Task, "ab", ids.into_iter()).unwrap_err();
        assert!(matches!(err, PlannerError::AmbiguousId { .. }));
        assert_eq!(resolve(EntityKind::Task, "abc", ids.into_iter()).unwrap(), "abc");
        assert_eq!(resolve(EntityKind::Task, "abc2", ids.into_iter()).unwrap(), "abc2");
    }

    #[tokio::test]
    async fn sqlite_backed_planner_reloads_state() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let clock = || Box::new(FixedClock::on(today()));
        let mut p = Planner::load(db.clone(), clock()).await.unwrap();
        let math  = p.add_subject(NewSubject::new("Math")).await.unwrap();
        let t     = p.add_task(NewTask::new(&math.id, "Worksheet", today()).minutes(45)).await.unwrap();

        let reloaded = Planner::load(db, clock()).await.unwrap();
        assert_eq!(reloaded.subjects(), &[math]);
        assert_eq!(reloaded.tasks(), &[t]);
    }
}
