//! SQLite-backed plan store.
//!
//! One database holds users, candidates, plan rows and settings. Every
//! scheduling pass runs inside a single `IMMEDIATE` transaction, so
//! concurrent passes serialize on the write lock and a failed pass leaves
//! no partial moves behind. `plan.candidate_id` is `UNIQUE`, which turns a
//! double assignment race into a rejected insert.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::domain::{
    Assignment, AssignmentId, Candidate, CandidateId, NewAssignment, NewCandidate, PlanStatus, Role, User, UserId,
};
use crate::error::{Result, SendplanError};
use crate::scheduler::Quota;
use crate::store::traits::{AssignmentStore, CandidateStore, InsertOutcome, SenderDirectory, SettingsStore};
use crate::views::{AssignmentView, Visibility};

/// Settings key holding the per-day quota.
pub const QUOTA_SETTING: &str = "per_day";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        name TEXT,
        role TEXT NOT NULL CHECK (role IN ('admin', 'sender')),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS candidates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        handle TEXT NOT NULL UNIQUE,
        full_name TEXT,
        link TEXT,
        avatar_url TEXT,
        unwanted INTEGER NOT NULL DEFAULT 0,
        category TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS plan (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        candidate_id INTEGER NOT NULL UNIQUE REFERENCES candidates(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        account_label TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'sent', 'interested', 'won')),
        assigned_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        updated_by_user_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX IF NOT EXISTS idx_plan_sender_date ON plan(assigned_user_id, date);
    CREATE INDEX IF NOT EXISTS idx_plan_date ON plan(date);
    CREATE INDEX IF NOT EXISTS idx_candidates_unwanted ON candidates(unwanted);

    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT
    );
"#;

/// Owner of the SQLite connection.
pub struct PlanStore {
    /// None for in-memory databases
    path: Option<PathBuf>,
    db: Connection,
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl PlanStore {
    /// Open or create a database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)?;
        db.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::init(&db)?;
        log::info!("Opened plan store at {}", path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            db,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        Self::init(&db)?;
        Ok(Self { path: None, db })
    }

    /// Initialize the schema and seed defaults.
    fn init(db: &Connection) -> Result<()> {
        db.busy_timeout(Duration::from_secs(5))?;
        db.pragma_update(None, "foreign_keys", "ON")?;
        db.execute_batch(SCHEMA)?;
        db.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![QUOTA_SETTING, Quota::default().to_string()],
        )?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Non-transactional access for reads and single-row admin writes.
    pub fn source(&self) -> SqliteSource<'_> {
        SqliteSource::new(&self.db)
    }

    /// Run `f` in one IMMEDIATE transaction; commit on Ok, roll back on Err.
    pub fn in_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&SqliteSource<'_>) -> Result<T>,
    {
        let tx = self.db.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&SqliteSource::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }
}

/// Collaborator implementations over a connection or open transaction.
pub struct SqliteSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Register a user. Duplicate usernames are rejected.
    pub fn add_user(&self, username: &str, name: Option<&str>, role: Role) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SendplanError::InvalidInput("username must not be empty".to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO users (username, name, role) VALUES (?1, ?2, ?3)",
                params![username, name, role],
            )
            .map_err(|e| unique_violation_as(e, || format!("user already exists: {}", username)))?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            name: name.map(str::to_string),
            role,
        })
    }

    pub fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, name, role FROM users WHERE username = ?1",
                [username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare("SELECT id, username, name, role FROM users ORDER BY id")?;
        let users = stmt.query_map([], user_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Insert a candidate. Duplicate handles are rejected.
    pub fn add_candidate(&self, new: &NewCandidate) -> Result<Candidate> {
        let handle = new.handle.trim();
        if handle.is_empty() {
            return Err(SendplanError::InvalidInput("handle must not be empty".to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO candidates (handle, full_name, link, avatar_url, unwanted, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![handle, new.full_name, new.link, new.avatar_url, new.unwanted, new.category],
            )
            .map_err(|e| unique_violation_as(e, || format!("candidate already exists: {}", handle)))?;

        Ok(Candidate {
            id: self.conn.last_insert_rowid(),
            handle: handle.to_string(),
            full_name: new.full_name.clone(),
            link: new.link.clone(),
            avatar_url: new.avatar_url.clone(),
            unwanted: new.unwanted,
            category: new.category.clone(),
        })
    }

    /// Flag or unflag a candidate. An existing assignment is left alone.
    pub fn set_unwanted(&self, handle: &str, unwanted: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE candidates SET unwanted = ?1 WHERE handle = ?2",
            params![unwanted, handle],
        )?;
        if changed == 0 {
            return Err(SendplanError::NotFound(format!("candidate {}", handle)));
        }
        Ok(())
    }

    /// Number of plan rows.
    pub fn count_assignments(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM plan", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        let assignment = self
            .conn
            .query_row(
                "SELECT id, candidate_id, date, account_label, assigned_user_id, status, updated_by_user_id
                 FROM plan WHERE id = ?1",
                [id],
                assignment_from_row,
            )
            .optional()?;
        Ok(assignment)
    }

    /// Write a status and the identity that changed it.
    pub fn update_status(&self, id: AssignmentId, status: PlanStatus, updated_by: Option<UserId>) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE plan SET status = ?1, updated_by_user_id = ?2 WHERE id = ?3",
            params![status, updated_by, id],
        )?;
        Ok(changed)
    }

    /// Store the per-day quota (already clamped by `Quota`).
    pub fn set_quota(&self, quota: Quota) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![QUOTA_SETTING, quota.to_string()],
        )?;
        Ok(())
    }
}

impl CandidateStore for SqliteSource<'_> {
    fn find_unassigned_eligible(&self, after: Option<CandidateId>, limit: usize) -> Result<Vec<Candidate>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT c.id, c.handle, c.full_name, c.link, c.avatar_url, c.unwanted, c.category
             FROM candidates c
             WHERE c.unwanted = 0
               AND c.id > ?1
               AND NOT EXISTS (SELECT 1 FROM plan p WHERE p.candidate_id = c.id)
             ORDER BY c.id ASC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let candidates = stmt
            .query_map(params![after.unwrap_or(0), limit], candidate_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(candidates)
    }

    fn count_all(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SettingsStore for SqliteSource<'_> {
    fn get_quota(&self) -> Result<Quota> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [QUOTA_SETTING], |row| row.get(0))
            .optional()?;
        Ok(Quota::from_setting(raw.flatten().as_deref()))
    }
}

impl SenderDirectory for SqliteSource<'_> {
    fn list_senders(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, username, name, role FROM users WHERE role = 'sender' ORDER BY id")?;
        let senders = stmt.query_map([], user_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(senders)
    }
}

impl AssignmentStore for SqliteSource<'_> {
    fn load_schedulable(&self, sender: UserId, window_start: NaiveDate) -> Result<Vec<Assignment>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, candidate_id, date, account_label, assigned_user_id, status, updated_by_user_id
             FROM plan
             WHERE assigned_user_id = ?1 AND (date >= ?2 OR status = 'pending')
             ORDER BY date, id",
        )?;
        let rows = stmt
            .query_map(params![sender, window_start], assignment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn move_assignment(&self, id: AssignmentId, date: NaiveDate) -> Result<()> {
        let mut stmt = self.conn.prepare_cached("UPDATE plan SET date = ?1 WHERE id = ?2")?;
        stmt.execute(params![date, id])?;
        Ok(())
    }

    fn insert_assignment(&self, new: &NewAssignment) -> Result<InsertOutcome> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO plan (candidate_id, date, account_label, assigned_user_id, status)
             VALUES (?1, ?2, ?3, ?4, 'pending')",
        )?;
        match stmt.execute(params![new.candidate_id, new.date, new.account_label, new.sender_id]) {
            Ok(_) => Ok(InsertOutcome::Inserted(self.conn.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    fn list_views(&self, from: NaiveDate, to: NaiveDate, visibility: Visibility) -> Result<Vec<AssignmentView>> {
        let owner = match visibility {
            Visibility::All => None,
            Visibility::OwnedBy(id) => Some(id),
            Visibility::Nothing => return Ok(Vec::new()),
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT pl.id, pl.date, pl.account_label, pl.status, pl.assigned_user_id,
                    c.id, c.handle, c.full_name, c.link, c.avatar_url,
                    u.username, u.name
             FROM plan pl
             JOIN candidates c ON c.id = pl.candidate_id
             LEFT JOIN users u ON u.id = pl.assigned_user_id
             WHERE pl.date BETWEEN ?1 AND ?2
               AND (?3 IS NULL OR pl.assigned_user_id = ?3)
             ORDER BY pl.date, pl.id",
        )?;
        let views = stmt
            .query_map(params![from, to, owner], |row| {
                Ok(AssignmentView {
                    plan_id: row.get(0)?,
                    date: row.get(1)?,
                    account_label: row.get(2)?,
                    status: row.get(3)?,
                    sender_id: row.get(4)?,
                    candidate_id: row.get(5)?,
                    handle: row.get(6)?,
                    full_name: row.get(7)?,
                    link: row.get(8)?,
                    avatar_url: row.get(9)?,
                    sender_username: row.get(10)?,
                    sender_name: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(views)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
    })
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        id: row.get(0)?,
        handle: row.get(1)?,
        full_name: row.get(2)?,
        link: row.get(3)?,
        avatar_url: row.get(4)?,
        unwanted: row.get(5)?,
        category: row.get(6)?,
    })
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        candidate_id: row.get(1)?,
        date: row.get(2)?,
        account_label: row.get(3)?,
        sender_id: row.get(4)?,
        status: row.get(5)?,
        updated_by: row.get(6)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn unique_violation_as(err: rusqlite::Error, message: impl FnOnce() -> String) -> SendplanError {
    if is_unique_violation(&err) {
        SendplanError::InvalidInput(message())
    } else {
        err.into()
    }
}

impl ToSql for PlanStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PlanStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
