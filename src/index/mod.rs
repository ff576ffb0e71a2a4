//! Prefix stores and the maintenance rebuild.
//!
//! Two stores answer the same "words starting with P" question:
//!
//! - `OrderedStore` keeps a `PrefixIndex` in memory, persisted as a
//!   JSON Lines snapshot.
//! - `RelationalStore` keeps a SQLite table of canonical words.
//!
//! Both are replaced wholesale by `run_seed`; neither is mutated while
//! serving queries.

pub mod prefix;
pub mod snapshot;
mod sqlite;

pub use prefix::{PrefixIndex, PrefixScan};
pub use snapshot::SnapshotHeader;
pub use sqlite::{RelationalStore, RowScan};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use parking_lot::RwLock;

use crate::models::{EngineKind, SeedConfig, SeedSummary};
use crate::vocabulary;

/// Terminal marker appended to complete words in the ordered index.
///
/// `char::MAX` sorts after every other code point, so a word's terminal
/// is the last entry in the block of entries that begin with that word.
pub const SENTINEL: char = char::MAX;

/// Failures raised while rebuilding a store.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid word {word:?}: {reason}")]
    InvalidWord { word: String, reason: &'static str },
    #[error("corrupt snapshot at {path}: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl SeedError {
    pub(crate) fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        SeedError::CorruptSnapshot {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Canonicalize a vocabulary word for storage.
///
/// Words are upper-cased; blank words and words containing the sentinel
/// are rejected.
pub fn canonical_word(raw: &str) -> Result<String, SeedError> {
    if raw.trim().is_empty() {
        return Err(SeedError::InvalidWord {
            word: raw.to_string(),
            reason: "word is blank",
        });
    }

    let word = raw.to_uppercase();
    if word.contains(SENTINEL) {
        return Err(SeedError::InvalidWord {
            word: raw.to_string(),
            reason: "word contains the reserved terminal marker",
        });
    }

    Ok(word)
}

/// Shared handle to the ordered prefix index.
///
/// Readers clone the current `Arc` and scan without holding the lock;
/// `rebuild` builds a complete replacement before swapping it in.
#[derive(Debug)]
pub struct OrderedStore {
    path: Option<PathBuf>,
    current: RwLock<Option<Arc<PrefixIndex>>>,
}

impl OrderedStore {
    /// Store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
        }
    }

    /// Open a store backed by the snapshot at `path`.
    ///
    /// A missing snapshot leaves the store unseeded; a corrupt one is an
    /// error.
    pub fn open(path: &Path) -> Result<Self> {
        let current = if path.exists() {
            let (header, index) = snapshot::read_snapshot(path)
                .with_context(|| format!("failed to load ordered index at {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                words = header.words,
                entries = header.entries,
                "loaded ordered index snapshot"
            );
            Some(Arc::new(index))
        } else {
            tracing::warn!(path = %path.display(), "ordered index snapshot not found");
            None
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            current: RwLock::new(current),
        })
    }

    /// Current index, or `None` if the store has never been seeded.
    pub fn snapshot(&self) -> Option<Arc<PrefixIndex>> {
        self.current.read().clone()
    }

    /// Build a new index from `words`, persist it when the store has a
    /// path, and swap it in. On error the previous index stays live.
    pub fn rebuild<I, S>(&self, words: I) -> Result<SnapshotHeader, SeedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let staged = PrefixIndex::build(words)?;
        let created_at = current_epoch_seconds();

        let header = match &self.path {
            Some(path) => snapshot::write_snapshot(path, &staged, created_at)?,
            None => SnapshotHeader {
                schema_version: snapshot::SNAPSHOT_SCHEMA_VERSION.to_string(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                words: staged.word_count(),
                entries: staged.entries().len() as u64,
                created_at,
            },
        };

        *self.current.write() = Some(Arc::new(staged));
        Ok(header)
    }
}

/// Rebuild the store(s) selected by `config`.
///
/// This is the maintenance entry point behind `speedsearch seed`.
pub fn run_seed(config: &SeedConfig) -> Result<Vec<SeedSummary>> {
    let words = match &config.words {
        Some(path) => vocabulary::load_words(path)?,
        None => vocabulary::builtin_words(),
    };

    tracing::info!(
        words = words.len(),
        backend = ?config.target,
        "rebuilding prefix stores"
    );

    let mut summaries = Vec::new();

    if config.target.includes(EngineKind::Ordered) {
        let store = OrderedStore {
            path: Some(config.index_path.clone()),
            current: RwLock::new(None),
        };
        let header = store.rebuild(&words).with_context(|| {
            format!(
                "failed to seed ordered index at {}",
                config.index_path.display()
            )
        })?;

        tracing::info!(
            path = %config.index_path.display(),
            words = header.words,
            entries = header.entries,
            "seeded ordered index"
        );

        summaries.push(SeedSummary {
            engine: EngineKind::Ordered,
            path: config.index_path.clone(),
            words: header.words,
            entries: header.entries,
            created_at: format_timestamp_iso8601(header.created_at),
        });
    }

    if config.target.includes(EngineKind::Relational) {
        let store = RelationalStore::open(&config.db_path)?;
        let rows = store.rebuild(&words).with_context(|| {
            format!(
                "failed to seed relational table at {}",
                config.db_path.display()
            )
        })?;

        tracing::info!(path = %config.db_path.display(), rows, "seeded relational table");

        summaries.push(SeedSummary {
            engine: EngineKind::Relational,
            path: config.db_path.clone(),
            words: rows,
            entries: rows,
            created_at: format_timestamp_iso8601(current_epoch_seconds()),
        });
    }

    Ok(summaries)
}

fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn format_timestamp_iso8601(secs: u64) -> Option<String> {
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    let ts = secs as i64;
    let dt = OffsetDateTime::from_unix_timestamp(ts).ok()?;
    Some(dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeedTarget;
    use tempfile::tempdir;

    #[test]
    fn canonical_word_upper_cases_and_rejects_blank() {
        assert_eq!(canonical_word("France").expect("word"), "FRANCE");
        assert!(matches!(
            canonical_word("   "),
            Err(SeedError::InvalidWord { .. })
        ));
    }

    #[test]
    fn ordered_store_starts_unseeded_without_snapshot() {
        let dir = tempdir().expect("tempdir");
        let store = OrderedStore::open(&dir.path().join("ordered.jsonl")).expect("store");
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn failed_rebuild_keeps_previous_index_live() {
        let store = OrderedStore::in_memory();
        store.rebuild(["France"]).expect("seed");
        let before = store.snapshot().expect("seeded");

        let bad = format!("X{SENTINEL}");
        assert!(store.rebuild(["Germany".to_string(), bad]).is_err());

        let after = store.snapshot().expect("still seeded");
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn rebuild_swaps_in_a_new_index_for_existing_readers() {
        let store = OrderedStore::in_memory();
        store.rebuild(["France"]).expect("first");
        let held = store.snapshot().expect("first index");

        store.rebuild(["Germany"]).expect("second");

        assert_eq!(held.scan("F", 100).matches, vec!["FRANCE"]);
        let current = store.snapshot().expect("second index");
        assert!(current.scan("F", 100).matches.is_empty());
        assert_eq!(current.scan("G", 100).matches, vec!["GERMANY"]);
    }

    #[test]
    fn run_seed_populates_both_stores_from_word_file() {
        let dir = tempdir().expect("tempdir");
        let words_path = dir.path().join("words.txt");
        std::fs::write(&words_path, "France\nGermany\n").expect("write words");

        let config = SeedConfig {
            target: SeedTarget::All,
            words: Some(words_path),
            index_path: dir.path().join("ordered.jsonl"),
            db_path: dir.path().join("countries.sqlite"),
        };

        let summaries = run_seed(&config).expect("seed");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].engine, EngineKind::Ordered);
        assert_eq!(summaries[0].words, 2);
        assert_eq!(summaries[1].engine, EngineKind::Relational);
        assert_eq!(summaries[1].entries, 2);

        let ordered = OrderedStore::open(&config.index_path).expect("reopen");
        let index = ordered.snapshot().expect("seeded");
        assert_eq!(index.scan("G", 100).matches, vec!["GERMANY"]);
    }

    #[test]
    fn run_seed_can_target_a_single_store() {
        let dir = tempdir().expect("tempdir");
        let config = SeedConfig {
            target: SeedTarget::Relational,
            words: None,
            index_path: dir.path().join("ordered.jsonl"),
            db_path: dir.path().join("countries.sqlite"),
        };

        let summaries = run_seed(&config).expect("seed");
        assert_eq!(summaries.len(), 1);
        assert!(!config.index_path.exists());
        assert!(summaries[0].words > 100);
    }
}
