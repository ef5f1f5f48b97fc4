use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection, Result};
use std::io;
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::history::{EntryKind, HistoryEntry};

/// A history entry as read back from the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub sequence: String,
    pub title: String,
    pub progress: Option<String>,
    pub dead_time: bool,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration_secs: u64,
}

/// Persistent activity log across playback sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default location, creating it if needed
    pub fn new() -> Result<Self> {
        let path = AppDirs::history_db_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS history_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sequence TEXT NOT NULL,
                title TEXT NOT NULL,
                progress TEXT,
                dead_time BOOLEAN NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                duration_secs INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_entries_ended_at ON history_entries(ended_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record(&self, sequence: &str, entry: &HistoryEntry) -> Result<()> {
        let progress = match &entry.kind {
            EntryKind::Timer { progress, .. } => Some(progress.as_str()),
            EntryKind::DeadTime => None,
        };

        self.conn.execute(
            r#"
            INSERT INTO history_entries
            (sequence, title, progress, dead_time, started_at, ended_at, duration_secs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                sequence,
                entry.title(),
                progress,
                entry.is_dead_time(),
                utc_timestamp(entry.from),
                utc_timestamp(entry.to),
                entry.duration_secs() as i64,
            ],
        )?;

        Ok(())
    }

    /// Most recent entries first
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT sequence, title, progress, dead_time, started_at, ended_at, duration_secs
            FROM history_entries
            ORDER BY ended_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(StoredEntry {
                sequence: row.get(0)?,
                title: row.get(1)?,
                progress: row.get(2)?,
                dead_time: row.get(3)?,
                started_at: parse_timestamp(row.get(4)?, 4)?,
                ended_at: parse_timestamp(row.get(5)?, 5)?,
                duration_secs: row.get::<_, i64>(6)?.max(0) as u64,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }

        Ok(entries)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM history_entries", [])?;
        Ok(())
    }
}

/// Timestamps are stored in UTC so text order is time order
fn utc_timestamp(at: DateTime<Local>) -> String {
    at.with_timezone(&Utc).to_rfc3339()
}

fn parse_timestamp(text: String, column: usize) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                column,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}

/// Write entries as CSV with a header row
pub fn write_csv<W: io::Write>(entries: &[StoredEntry], out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "sequence",
        "title",
        "progress",
        "dead_time",
        "started_at",
        "ended_at",
        "duration_secs",
    ])?;

    for entry in entries {
        writer.write_record([
            entry.sequence.clone(),
            entry.title.clone(),
            entry.progress.clone().unwrap_or_default(),
            entry.dead_time.to_string(),
            entry.started_at.to_rfc3339(),
            entry.ended_at.to_rfc3339(),
            entry.duration_secs.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
