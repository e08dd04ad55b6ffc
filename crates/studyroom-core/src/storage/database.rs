//! SQLite-backed persistence.
//!
//! Provides persistent storage for:
//! - Memorization items, recurring tasks and focus sessions (JSON bodies
//!   with indexed scalar columns)
//! - The activity history
//! - Key-value store for timer pointers

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::data_dir;
use super::store::Store;
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::recurrence::{RecurringTaskInstance, TaskStatus};
use crate::review::MemorizationItem;
use crate::session::{FocusSession, PendingSession};

const CURRENT_SESSION_KEY: &str = "current_session";
const PENDING_SESSION_KEY: &str = "pending_session";

/// SQLite database implementing [`Store`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("studyroom.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cards (
                id             TEXT PRIMARY KEY,
                next_review_at TEXT NOT NULL,
                body           TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id     TEXT PRIMARY KEY,
                due_at TEXT,
                status TEXT NOT NULL,
                body   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                created_at TEXT NOT NULL,
                body       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS activity (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                at   TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cards_next_review_at ON cards(next_review_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_due_at ON tasks(due_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);
            CREATE INDEX IF NOT EXISTS idx_activity_at ON activity(at);",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn load_body<T: DeserializeOwned>(&self, sql: &str, id: &str) -> Result<Option<T>> {
        let body = self
            .conn
            .query_row(sql, params![id], |row| row.get::<_, String>(0))
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn list_bodies<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(serde_json::from_str(&row?)?);
        }
        Ok(out)
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn status_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Open => "open",
        TaskStatus::Completed => "completed",
    }
}

impl Store for Database {
    fn load_item(&self, id: &str) -> Result<Option<MemorizationItem>> {
        self.load_body("SELECT body FROM cards WHERE id = ?1", id)
    }

    fn save_item(&self, item: &MemorizationItem) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cards (id, next_review_at, body) VALUES (?1, ?2, ?3)",
            params![
                item.id,
                timestamp(&item.next_review_at),
                serde_json::to_string(item)?
            ],
        )?;
        Ok(())
    }

    fn list_items(&self) -> Result<Vec<MemorizationItem>> {
        self.list_bodies("SELECT body FROM cards ORDER BY next_review_at, id", [])
    }

    fn load_task(&self, id: &str) -> Result<Option<RecurringTaskInstance>> {
        self.load_body("SELECT body FROM tasks WHERE id = ?1", id)
    }

    fn save_task(&self, task: &RecurringTaskInstance) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (id, due_at, status, body) VALUES (?1, ?2, ?3, ?4)",
            params![
                task.id,
                task.due_at.as_ref().map(timestamp),
                status_str(task.status),
                serde_json::to_string(task)?
            ],
        )?;
        Ok(())
    }

    fn list_tasks(&self) -> Result<Vec<RecurringTaskInstance>> {
        self.list_bodies(
            "SELECT body FROM tasks ORDER BY due_at IS NULL, due_at, id",
            [],
        )
    }

    fn complete_task(
        &self,
        completed: &RecurringTaskInstance,
        successor: Option<&RecurringTaskInstance>,
        events: &[Event],
    ) -> Result<()> {
        // Rolled back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;
        self.save_task(completed)?;
        if let Some(next) = successor {
            self.save_task(next)?;
        }
        for event in events {
            self.append_event(event)?;
        }
        tx.commit()?;
        debug!(task = %completed.id, events = events.len(), "task completion committed");
        Ok(())
    }

    fn load_session(&self, id: &str) -> Result<Option<FocusSession>> {
        self.load_body("SELECT body FROM sessions WHERE id = ?1", id)
    }

    fn save_session(&self, session: &FocusSession) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions (id, state, created_at, body) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id,
                session.state.to_string(),
                timestamp(&session.created_at),
                serde_json::to_string(session)?
            ],
        )?;
        Ok(())
    }

    fn list_sessions(&self, limit: usize) -> Result<Vec<FocusSession>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.list_bodies(
            "SELECT body FROM sessions ORDER BY created_at DESC, id DESC LIMIT ?1",
            params![limit],
        )
    }

    fn current_session_id(&self) -> Result<Option<String>> {
        self.kv_get(CURRENT_SESSION_KEY)
    }

    fn set_current_session_id(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => self.kv_set(CURRENT_SESSION_KEY, id),
            None => self.kv_delete(CURRENT_SESSION_KEY),
        }
    }

    fn load_pending(&self) -> Result<Option<PendingSession>> {
        match self.kv_get(PENDING_SESSION_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_pending(&self, pending: Option<&PendingSession>) -> Result<()> {
        match pending {
            Some(pending) => self.kv_set(PENDING_SESSION_KEY, &serde_json::to_string(pending)?),
            None => self.kv_delete(PENDING_SESSION_KEY),
        }
    }

    fn append_event(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT INTO activity (kind, at, body) VALUES (?1, ?2, ?3)",
            params![
                event.kind(),
                timestamp(&event.at()),
                serde_json::to_string(event)?
            ],
        )?;
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<Event>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.list_bodies(
            "SELECT body FROM activity ORDER BY id DESC LIMIT ?1",
            params![limit],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{RecurrenceKind, RecurrenceRule};
    use crate::review::ReviewPolicy;
    use crate::session::{CycleConfig, SessionType};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn kv_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn items_round_trip_and_list_by_due_date() {
        let db = Database::open_in_memory().unwrap();
        let policy = ReviewPolicy::default();
        let later = MemorizationItem::new("b", "later", &policy, now() + Duration::days(2));
        let sooner = MemorizationItem::new("a", "sooner", &policy, now());
        db.save_item(&later).unwrap();
        db.save_item(&sooner).unwrap();

        assert_eq!(db.load_item("b").unwrap(), Some(later));
        assert!(db.load_item("missing").unwrap().is_none());
        let ids: Vec<String> = db.list_items().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn saving_a_task_twice_overwrites() {
        let db = Database::open_in_memory().unwrap();
        let task = RecurringTaskInstance::new(
            "t1",
            "Review notes",
            Some(now()),
            Some(RecurrenceRule::new(RecurrenceKind::Daily, 1)),
            now(),
        );
        db.save_task(&task).unwrap();
        db.save_task(&task.completed(now())).unwrap();
        let tasks = db.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
    }

    #[test]
    fn failed_completion_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let rule = RecurrenceRule::new(RecurrenceKind::Daily, 1);
        let open = RecurringTaskInstance::new(
            "t1",
            "Review notes",
            Some(now()),
            Some(rule.clone()),
            now(),
        );
        db.save_task(&open).unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_successor BEFORE INSERT ON tasks WHEN NEW.id = 't2'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let completed = open.completed(now());
        let successor = RecurringTaskInstance::new(
            "t2",
            "Review notes",
            Some(now() + Duration::days(1)),
            Some(rule),
            now(),
        );
        let events = [Event::TaskCompleted {
            task_id: "t1".into(),
            title: "Review notes".into(),
            at: now(),
        }];
        assert!(db.complete_task(&completed, Some(&successor), &events).is_err());

        assert_eq!(db.load_task("t1").unwrap().unwrap().status, TaskStatus::Open);
        assert!(db.load_task("t2").unwrap().is_none());
        assert!(db.recent_events(10).unwrap().is_empty());
    }

    #[test]
    fn completion_writes_task_successor_and_events() {
        let db = Database::open_in_memory().unwrap();
        let rule = RecurrenceRule::new(RecurrenceKind::Daily, 1);
        let open = RecurringTaskInstance::new(
            "t1",
            "Review notes",
            Some(now()),
            Some(rule.clone()),
            now(),
        );
        let successor = RecurringTaskInstance::new(
            "t2",
            "Review notes",
            Some(now() + Duration::days(1)),
            Some(rule),
            now(),
        );
        let events = [Event::TaskCompleted {
            task_id: "t1".into(),
            title: "Review notes".into(),
            at: now(),
        }];
        db.complete_task(&open.completed(now()), Some(&successor), &events)
            .unwrap();

        assert_eq!(db.load_task("t1").unwrap().unwrap().status, TaskStatus::Completed);
        assert_eq!(db.load_task("t2").unwrap(), Some(successor));
        assert_eq!(db.recent_events(10).unwrap().len(), 1);
    }

    #[test]
    fn session_pointers() {
        let db = Database::open_in_memory().unwrap();
        let session =
            FocusSession::start("s1", SessionType::Focus, CycleConfig::default(), 0, &now()).unwrap();
        db.save_session(&session).unwrap();
        db.set_current_session_id(Some("s1")).unwrap();
        assert_eq!(db.current_session_id().unwrap().as_deref(), Some("s1"));
        assert_eq!(db.load_session("s1").unwrap(), Some(session));

        db.set_current_session_id(None).unwrap();
        assert!(db.current_session_id().unwrap().is_none());
        assert!(db.load_pending().unwrap().is_none());
    }

    #[test]
    fn events_come_back_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..3 {
            db.append_event(&Event::TaskCompleted {
                task_id: format!("t{i}"),
                title: String::new(),
                at: now() + Duration::minutes(i),
            })
            .unwrap();
        }
        let events = db.recent_events(2).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::TaskCompleted { task_id, .. } if task_id == "t2"));
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
