//! Durable SQLite-backed history store.
//!
//! One row per turn in a `messages` table. The column set is additive-only
//! across versions: on startup any column missing from a pre-existing database
//! is added in place, never dropping or rewriting existing rows.

use crate::error::Result;
use crate::history::{HistoryStore, Turn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Columns that may be absent from databases created by earlier versions,
/// paired with the full declaration used to add them.
const OPTIONAL_COLUMNS: &[(&str, &str)] = &[
    ("input_tokens", "input_tokens INTEGER DEFAULT 0"),
    ("output_tokens", "output_tokens INTEGER DEFAULT 0"),
    ("cost", "cost REAL DEFAULT 0.0"),
    ("cost_formatted", "cost_formatted TEXT DEFAULT '$0.000000'"),
    ("agent", "agent TEXT DEFAULT 'agent1'"),
    ("created_at", "created_at INTEGER DEFAULT 0"),
];

/// SQLite-based turn storage.
///
/// The connection is opened once and held for the process lifetime; the
/// interaction loop never has more than one operation in flight.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) the database at `path` and ensure the schema is
    /// current.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message TEXT,
            response TEXT,
            input_tokens INTEGER DEFAULT 0,
            output_tokens INTEGER DEFAULT 0,
            cost REAL DEFAULT 0.0,
            cost_formatted TEXT DEFAULT '$0.000000',
            agent TEXT DEFAULT 'agent1',
            created_at INTEGER DEFAULT 0
        )",
    )?;

    // Pre-existing databases may predate some columns; add what is missing.
    let existing = existing_columns(conn)?;
    for (name, declaration) in OPTIONAL_COLUMNS {
        if !existing.contains(*name) {
            debug!(column = name, "adding missing history column");
            conn.execute(&format!("ALTER TABLE messages ADD COLUMN {}", declaration), [])?;
        }
    }

    Ok(())
}

fn existing_columns(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(messages)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(columns)
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn append(&self, turn: &Turn) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO messages
                (message, response, input_tokens, output_tokens, cost, cost_formatted, agent, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                turn.message,
                turn.response,
                turn.input_tokens,
                turn.output_tokens,
                turn.cost,
                turn.cost_formatted,
                turn.agent,
                turn.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, message, response, input_tokens, output_tokens,
                    cost, cost_formatted, agent, created_at
             FROM messages ORDER BY id DESC LIMIT ?",
        )?;

        let turns = stmt
            .query_map(params![n as i64], |row| {
                Ok(Turn {
                    id: Some(row.get::<_, i64>(0)?),
                    message: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    response: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    input_tokens: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    output_tokens: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                    cost: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                    cost_formatted: row
                        .get::<_, Option<String>>(6)?
                        .unwrap_or_else(|| "$0.000000".to_string()),
                    agent: row.get::<_, Option<String>>(7)?.unwrap_or_else(|| "agent1".to_string()),
                    created_at: DateTime::from_timestamp(
                        row.get::<_, Option<i64>>(8)?.unwrap_or(0),
                        0,
                    )
                    .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(turns)
    }
}
