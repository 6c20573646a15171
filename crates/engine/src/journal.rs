use anyhow::Context;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::game::Game;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Append-only log of applied actions plus the latest table, in SQLite.
/// `rev` is the log's highest sequence number.
#[derive(Debug, Clone)]
pub struct Journal {
    db_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedEvent {
    pub seq: i64,
    pub ts_ms: i64,
    pub kind: String,
    pub color: Option<String>,
    pub payload: serde_json::Value,
}

impl Journal {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn open(&self) -> anyhow::Result<Connection> {
        let path = self.db_path.clone();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create db dir: {}", dir.display()))?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open sqlite db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        migrate(&conn)?;
        Ok(conn)
    }

    pub fn rev(&self) -> anyhow::Result<i64> {
        let conn = self.open()?;
        let rev: Option<i64> =
            conn.query_row("SELECT MAX(seq) FROM event_log", [], |row| row.get(0))?;
        Ok(rev.unwrap_or(0))
    }

    /// Most recent events, newest first.
    pub fn recent(&self, limit: usize) -> anyhow::Result<Vec<LoggedEvent>> {
        let conn = self.open()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT seq, ts_ms, kind, color, payload_json FROM event_log ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            let payload: String = row.get(4)?;
            Ok(LoggedEvent {
                seq: row.get(0)?,
                ts_ms: row.get(1)?,
                kind: row.get(2)?,
                color: row.get(3)?,
                payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
            })
        })?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    /// Record an action and the table it produced in one transaction.
    pub fn commit(
        &self,
        kind: &str,
        color: Option<&str>,
        payload: &serde_json::Value,
        game: &Game,
    ) -> anyhow::Result<i64> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let seq = insert_event(&tx, kind, color, payload)?;
        save_game_tx(&tx, game, seq)?;
        tx.commit()?;
        Ok(seq)
    }

    pub fn save_game(&self, game: &Game) -> anyhow::Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let rev: Option<i64> =
            tx.query_row("SELECT MAX(seq) FROM event_log", [], |row| row.get(0))?;
        save_game_tx(&tx, game, rev.unwrap_or(0))?;
        tx.commit()?;
        Ok(())
    }

    /// The last saved table, if any.
    pub fn load_game(&self) -> anyhow::Result<Option<Game>> {
        let conn = self.open()?;
        let body: Option<String> = conn
            .query_row("SELECT body_json FROM games WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        body.map(|json| serde_json::from_str(&json).context("decode saved game"))
            .transpose()
    }
}

fn insert_event(
    conn: &Connection,
    kind: &str,
    color: Option<&str>,
    payload: &serde_json::Value,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO event_log (ts_ms, kind, color, payload_json) VALUES (?1, ?2, ?3, ?4)",
        (now_ms(), kind, color, payload.to_string()),
    )
    .with_context(|| format!("append event {kind}"))?;
    Ok(conn.last_insert_rowid())
}

fn save_game_tx(tx: &rusqlite::Transaction<'_>, game: &Game, rev: i64) -> anyhow::Result<()> {
    let body = serde_json::to_string(game).context("encode game")?;
    tx.execute(
        "INSERT INTO games (id, rev, body_json, updated_at) VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET rev = excluded.rev, body_json = excluded.body_json,
                                       updated_at = excluded.updated_at",
        (rev, body, now_rfc3339()),
    )?;
    Ok(())
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    let v: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if v < 1 {
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS event_log (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  ts_ms INTEGER NOT NULL,
  kind TEXT NOT NULL,
  color TEXT,
  payload_json TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_event_log_kind ON event_log(kind);

-- Single row: the table as of `rev`.
CREATE TABLE IF NOT EXISTS games (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  rev INTEGER NOT NULL,
  body_json TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#,
        )?;

        conn.pragma_update(None, "user_version", 1_i64)?;
    }

    Ok(())
}
