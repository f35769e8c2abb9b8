use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};

use crate::error::PlannerResult;

pub const SUBJECTS_KEY: &str = "study_planner_subjects";
pub const TASKS_KEY:    &str = "study_planner_tasks";

/// String key-value persistence. Values are opaque to the store.
pub trait KvStore {
    async fn get(&self, key: &str) -> PlannerResult<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> PlannerResult<()>;
}

// ─── SQLite ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn connect(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        Ok(Self { pool: SqlitePool::connect_with(opts).await? })
    }

    /// Private in-memory database; a single connection so every query sees it.
    #[cfg(test)]
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        tracing::info!("DB migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl KvStore for Database {
    async fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key=?")
            .bind(key).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> PlannerResult<()> {
        sqlx::query(
            "INSERT INTO kv (key,value,updated_at) VALUES (?,?,?)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at"
        )
        .bind(key).bind(value).bind(Utc::now().to_rfc3339())
        .execute(&self.pool).await?;
        Ok(())
    }
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studyplanner")
        .join("studyplanner.db")
}

// ─── In-memory ────────────────────────────────────────────────────────────────

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    map: std::sync::Mutex<std::collections::HashMap<String, String>>,
    writes: std::sync::atomic::AtomicUsize,
    refused: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    /// Makes every later `put` to `key` fail.
    pub fn refuse_writes_to(&self, key: &str) {
        *self.refused.lock().unwrap() = Some(key.to_owned());
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn put(&self, key: &str, value: &str) -> PlannerResult<()> {
        if self.refused.lock().unwrap().as_deref() == Some(key) {
            return Err(sqlx::Error::PoolClosed.into());
        }
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.map.lock().unwrap().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
