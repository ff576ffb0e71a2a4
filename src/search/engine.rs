//! Prefix query engines.
//!
//! Both engines implement `PrefixEngine`: a `lookup` against their
//! store with an already canonical prefix, and a provided `query` that
//! validates the raw input and measures the lookup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::index::{OrderedStore, RelationalStore};
use crate::models::{EngineKind, DEFAULT_LIMIT, DEFAULT_WINDOW};
use crate::search::query::{canonical_prefix, ValidationError};

/// Backend failure while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("ordered index has not been seeded")]
    NotSeeded,
    #[error("relational query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("query worker failed: {0}")]
    Worker(String),
}

/// Any failure of `PrefixEngine::query`.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Matches produced by a single lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    pub matches: Vec<String>,
    pub truncated: bool,
}

/// Matches plus the wall-clock time spent finding them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub matches: Vec<String>,
    pub truncated: bool,
    pub elapsed: Duration,
}

/// A strategy for answering "all words starting with P".
pub trait PrefixEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Look up completions for a canonical prefix.
    fn lookup(&self, prefix: &str) -> Result<Lookup, EngineError>;

    /// Validate and canonicalize `raw`, then look it up.
    ///
    /// The elapsed time covers canonicalization and the lookup.
    fn query(&self, raw: &str) -> Result<QueryOutput, QueryError> {
        let start = Instant::now();
        let prefix = canonical_prefix(raw)?;
        let lookup = self.lookup(&prefix)?;
        let elapsed = start.elapsed();

        tracing::debug!(
            engine = %self.kind(),
            prefix = %prefix,
            matches = lookup.matches.len(),
            truncated = lookup.truncated,
            elapsed_us = elapsed.as_micros() as u64,
            "prefix query"
        );

        Ok(QueryOutput {
            matches: lookup.matches,
            truncated: lookup.truncated,
            elapsed,
        })
    }
}

/// Rank lookup plus windowed scan over the ordered prefix index.
#[derive(Debug, Clone)]
pub struct OrderedEngine {
    store: Arc<OrderedStore>,
    window: usize,
}

impl OrderedEngine {
    pub fn new(store: Arc<OrderedStore>) -> Self {
        Self {
            store,
            window: DEFAULT_WINDOW,
        }
    }

    /// Maximum number of index entries scanned per query.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

impl PrefixEngine for OrderedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Ordered
    }

    fn lookup(&self, prefix: &str) -> Result<Lookup, EngineError> {
        let index = self.store.snapshot().ok_or(EngineError::NotSeeded)?;
        let scan = index.scan(prefix, self.window);

        Ok(Lookup {
            matches: scan.matches,
            truncated: scan.truncated,
        })
    }
}

/// Primary-key range scan over the relational table.
pub struct RelationalEngine {
    store: Arc<RelationalStore>,
    limit: usize,
}

impl RelationalEngine {
    pub fn new(store: Arc<RelationalStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Maximum number of rows returned per query.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PrefixEngine for RelationalEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Relational
    }

    fn lookup(&self, prefix: &str) -> Result<Lookup, EngineError> {
        let scan = self.store.scan_prefix(prefix, self.limit)?;

        Ok(Lookup {
            matches: scan.names,
            truncated: scan.truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_ordered(words: &[&str]) -> OrderedEngine {
        let store = OrderedStore::in_memory();
        store.rebuild(words).expect("seed ordered");
        OrderedEngine::new(Arc::new(store))
    }

    #[test]
    fn ordered_engine_answers_scenarios() {
        let engine = seeded_ordered(&["France", "Germany"]);

        assert_eq!(engine.query("F").expect("F").matches, vec!["FRANCE"]);
        assert_eq!(engine.query("G").expect("G").matches, vec!["GERMANY"]);
        assert!(engine.query("Z").expect("Z").matches.is_empty());
        assert_eq!(engine.query("fra").expect("fra").matches, vec!["FRANCE"]);
        assert_eq!(engine.query("france").expect("full").matches, vec!["FRANCE"]);
    }

    #[test]
    fn ordered_engine_rejects_blank_query() {
        let engine = seeded_ordered(&["France"]);
        let err = engine.query("  ").expect_err("blank");
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[test]
    fn unseeded_ordered_engine_reports_backend_error() {
        let engine = OrderedEngine::new(Arc::new(OrderedStore::in_memory()));
        let err = engine.query("F").expect_err("not seeded");
        assert!(matches!(err, QueryError::Engine(EngineError::NotSeeded)));
    }

    #[test]
    fn ordered_engine_window_is_configurable() {
        let engine = seeded_ordered(&["Samoa", "San Marino", "Saudi Arabia"]).with_window(3);

        let output = engine.query("SA").expect("query");
        assert!(output.truncated);
        assert!(output.matches.is_empty());
    }

    #[test]
    fn relational_engine_matches_ordered_engine_on_small_vocabulary() {
        let dir = tempdir().expect("tempdir");
        let store = RelationalStore::open(&dir.path().join("countries.sqlite")).expect("store");
        store.rebuild(["France", "Germany"]).expect("seed");
        let relational = RelationalEngine::new(Arc::new(store));
        let ordered = seeded_ordered(&["France", "Germany"]);

        let marked = format!("FRANCE{}", crate::index::SENTINEL);
        for q in ["F", "g", "Z", "FRANCE", "GERMANYX", marked.as_str()] {
            let left = ordered.query(q).expect("ordered");
            let right = relational.query(q).expect("relational");
            assert_eq!(left.matches, right.matches, "query {q:?}");
        }
    }

    #[test]
    fn relational_engine_applies_limit() {
        let dir = tempdir().expect("tempdir");
        let store = RelationalStore::open(&dir.path().join("countries.sqlite")).expect("store");
        store
            .rebuild(["Malawi", "Malaysia", "Maldives", "Mali", "Malta"])
            .expect("seed");
        let engine = RelationalEngine::new(Arc::new(store)).with_limit(2);

        let output = engine.query("mal").expect("query");
        assert_eq!(output.matches, vec!["MALAWI", "MALAYSIA"]);
        assert!(output.truncated);
    }
}
