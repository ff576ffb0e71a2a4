//! SQLite-backed relational store.
//!
//! Words live in a single table:
//!
//! - `countries(name TEXT PRIMARY KEY)`
//!
//! Prefix queries are range scans over the primary-key index:
//! `name >= P AND name < P || SENTINEL`. SQLite's default `BINARY`
//! collation compares UTF-8 bytes, which matches Rust string ordering.
//!
//! Connections are configured with:
//!
//! - `journal_mode = WAL` for concurrent readers and a single writer.
//! - `synchronous = NORMAL` as a balance between safety and speed.
//! - `busy_timeout` to avoid transient `database is locked` errors.
//!
//! A small pool of idle connections is kept so concurrent queries do not
//! reopen the database on every request.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};

use crate::index::{canonical_word, SeedError, SENTINEL};

const MAX_IDLE_CONNECTIONS: usize = 8;

/// Result of a bounded range scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowScan {
    pub names: Vec<String>,
    /// More rows matched than the limit allowed.
    pub truncated: bool,
}

/// Shared handle to the relational table.
pub struct RelationalStore {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl RelationalStore {
    /// Open (or create) the database at `db_path` and ensure the schema
    /// exists.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Self::connect(db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            path: db_path.to_path_buf(),
            idle: Mutex::new(vec![conn]),
        })
    }

    fn connect(path: &Path) -> rusqlite::Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(5000))?;

        Ok(conn)
    }

    fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                name TEXT PRIMARY KEY NOT NULL
            );
        "#,
        )
    }

    /// Run `f` with a pooled connection, opening a new one when the pool
    /// is empty. The connection returns to the pool afterwards.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<T> {
        let pooled = self.idle.lock().pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => Self::connect(&self.path)?,
        };

        let result = f(&mut conn);

        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_CONNECTIONS {
            idle.push(conn);
        }

        result
    }

    /// Replace the table contents with the canonical form of `words`.
    ///
    /// Runs in a single transaction; on error the previous rows remain.
    /// Returns the number of distinct rows stored.
    pub fn rebuild<I, S>(&self, words: I) -> Result<u64, SeedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = words
            .into_iter()
            .map(|w| canonical_word(w.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM countries", [])?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO countries (name) VALUES (?1) ON CONFLICT (name) DO NOTHING",
                )?;
                for word in &canonical {
                    stmt.execute(params![word])?;
                }
            }

            let rows: i64 =
                tx.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
            tx.commit()?;
            Ok(rows)
        })?;

        Ok(rows as u64)
    }

    /// Names starting with `prefix`, ascending, at most `limit` of them.
    ///
    /// `prefix` must already be canonical.
    pub fn scan_prefix(&self, prefix: &str, limit: usize) -> rusqlite::Result<RowScan> {
        let mut upper = prefix.to_string();
        upper.push(SENTINEL);
        let fetch = limit.saturating_add(1).min(i64::MAX as usize) as i64;

        let mut names = self.with_connection(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT name FROM countries
                 WHERE name >= ?1 AND name < ?2
                 ORDER BY name ASC
                 LIMIT ?3",
            )?;

            let rows = stmt.query_map(params![prefix, upper, fetch], |row| {
                row.get::<_, String>(0)
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let truncated = names.len() > limit;
        names.truncate(limit);

        Ok(RowScan { names, truncated })
    }

    /// Number of rows currently stored.
    pub fn count(&self) -> rusqlite::Result<u64> {
        let rows: i64 = self.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
        })?;
        Ok(rows as u64)
    }
}
