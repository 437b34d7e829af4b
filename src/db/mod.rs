// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Database module for generated artifacts and focus sessions

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{LuminaraError, Result};

/// Database manager for Luminara (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Cheatsheet,
    Quiz,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Cheatsheet => "cheatsheet",
            ArtifactKind::Quiz => "quiz",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "cheatsheet" => Some(ArtifactKind::Cheatsheet),
            "quiz" => Some(ArtifactKind::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusKind {
    Timer,
    Stopwatch,
}

impl FocusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusKind::Timer => "timer",
            FocusKind::Stopwatch => "stopwatch",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "timer" => Some(FocusKind::Timer),
            "stopwatch" => Some(FocusKind::Stopwatch),
            _ => None,
        }
    }
}

/// A cheatsheet or quiz written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    pub kind: ArtifactKind,
    pub source_path: String,
    pub file_hash: String,
    pub output_path: String,
    pub model: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn new(
        kind: ArtifactKind,
        source_path: &Path,
        file_hash: &str,
        output_path: &Path,
        model: &str,
        item_count: usize,
    ) -> Self {
        Self {
            id: new_record_id(),
            kind,
            source_path: source_path.display().to_string(),
            file_hash: file_hash.to_string(),
            output_path: output_path.display().to_string(),
            model: model.to_string(),
            item_count: item_count as i64,
            created_at: Utc::now(),
        }
    }
}

/// One run of the countdown or stopwatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub kind: FocusKind,
    pub planned_secs: i64,
    pub elapsed_secs: i64,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
}

impl FocusSession {
    pub fn new(
        kind: FocusKind,
        planned_secs: u64,
        elapsed_secs: u64,
        completed: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_record_id(),
            kind,
            planned_secs: planned_secs as i64,
            elapsed_secs: elapsed_secs as i64,
            completed,
            started_at,
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbStats {
    pub artifact_count: i64,
    pub focus_session_count: i64,
    pub focus_minutes: i64,
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn artifact_from_row(row: &Row<'_>) -> rusqlite::Result<ArtifactRecord> {
    let kind: String = row.get(1)?;
    let created_str: String = row.get(7)?;
    Ok(ArtifactRecord {
        id: row.get(0)?,
        kind: ArtifactKind::parse(&kind).unwrap_or(ArtifactKind::Cheatsheet),
        source_path: row.get(2)?,
        file_hash: row.get(3)?,
        output_path: row.get(4)?,
        model: row.get(5)?,
        item_count: row.get(6)?,
        created_at: parse_timestamp(&created_str),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    let kind: String = row.get(1)?;
    let started_str: String = row.get(5)?;
    Ok(FocusSession {
        id: row.get(0)?,
        kind: FocusKind::parse(&kind).unwrap_or(FocusKind::Timer),
        planned_secs: row.get(2)?,
        elapsed_secs: row.get(3)?,
        completed: row.get(4)?,
        started_at: parse_timestamp(&started_str),
    })
}

const ARTIFACT_COLUMNS: &str =
    "id, kind, source_path, file_hash, output_path, model, item_count, created_at";

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LuminaraError::Config("Database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS artifacts (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                source_path TEXT NOT NULL,
                file_hash TEXT NOT NULL,
                output_path TEXT NOT NULL,
                model TEXT NOT NULL,
                item_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS focus_sessions (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                planned_secs INTEGER NOT NULL DEFAULT 0,
                elapsed_secs INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                started_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_artifacts_hash ON artifacts(file_hash, kind);
            CREATE INDEX IF NOT EXISTS idx_sessions_started ON focus_sessions(started_at);
        "#,
        )?;
        Ok(())
    }

    pub fn record_artifact(&self, record: &ArtifactRecord) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT OR REPLACE INTO artifacts (id, kind, source_path, file_hash, output_path, model, item_count, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                record.id,
                record.kind.as_str(),
                record.source_path,
                record.file_hash,
                record.output_path,
                record.model,
                record.item_count,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Latest artifact of `kind` generated from a file with this hash
    pub fn find_artifact(&self, hash: &str, kind: ArtifactKind) -> Result<Option<ArtifactRecord>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM artifacts WHERE file_hash = ?1 AND kind = ?2 ORDER BY created_at DESC LIMIT 1",
                ARTIFACT_COLUMNS
            ),
            params![hash, kind.as_str()],
            artifact_from_row,
        );
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn recent_artifacts(&self, limit: usize) -> Result<Vec<ArtifactRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artifacts ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            ARTIFACT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![limit as i64], artifact_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn record_focus_session(&self, session: &FocusSession) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO focus_sessions (id, kind, planned_secs, elapsed_secs, completed, started_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                session.id,
                session.kind.as_str(),
                session.planned_secs,
                session.elapsed_secs,
                session.completed,
                session.started_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn recent_focus_sessions(&self, limit: usize) -> Result<Vec<FocusSession>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, kind, planned_secs, elapsed_secs, completed, started_at
               FROM focus_sessions ORDER BY started_at DESC, rowid DESC LIMIT ?1"#,
        )?;
        let sessions = stmt
            .query_map(params![limit as i64], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.lock_conn()?;
        let artifact_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
        let (focus_session_count, focus_secs): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(elapsed_secs), 0) FROM focus_sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DbStats {
            artifact_count,
            focus_session_count,
            focus_minutes: focus_secs / 60,
        })
    }

    /// Vacuum database
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }
}

/// Generate a new UUID for records
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}
