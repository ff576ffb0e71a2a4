//! Shared data models for query payloads, seed summaries, and engine
//! selection.
//!
//! These types form the stable JSON API surface used by the CLI and the
//! HTTP server.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fixed message returned when the `q` parameter is missing or blank.
pub const QUERY_REQUIRED_MESSAGE: &str = "Query parameter \"q\" is required.";

/// Fixed message returned in place of any internal engine failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// Default number of ordered-index entries scanned per query.
pub const DEFAULT_WINDOW: usize = 100;

/// Default number of rows returned by the relational engine.
pub const DEFAULT_LIMIT: usize = 10;

/// Retrieval strategy used to answer a prefix query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-memory ordered prefix index with sentinel-marked terminals.
    Ordered,
    /// Sorted SQLite table scanned by primary-key range.
    Relational,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Ordered => "ordered",
            EngineKind::Relational => "relational",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-string parameters accepted by the search endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Successful query payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Completed words, in ascending order.
    pub result: Vec<String>,
    /// Elapsed query time in fractional milliseconds.
    pub duration: f64,
    /// Set when the engine's window or row limit cut the result short.
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

/// Client-error payload for invalid queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Masked payload returned for internal failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub result: Vec<String>,
    pub message: String,
}

impl ErrorResponse {
    pub fn query_required() -> Self {
        Self {
            error: QUERY_REQUIRED_MESSAGE.to_string(),
        }
    }
}

impl FailureResponse {
    pub fn generic() -> Self {
        Self {
            result: Vec::new(),
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Which store(s) a maintenance rebuild targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedTarget {
    Ordered,
    Relational,
    All,
}

impl SeedTarget {
    pub fn includes(self, kind: EngineKind) -> bool {
        match self {
            SeedTarget::All => true,
            SeedTarget::Ordered => kind == EngineKind::Ordered,
            SeedTarget::Relational => kind == EngineKind::Relational,
        }
    }
}

/// Configuration for a maintenance rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub target: SeedTarget,
    /// Optional word file; the builtin country list is used when omitted.
    #[serde(default)]
    pub words: Option<PathBuf>,
    pub index_path: PathBuf,
    pub db_path: PathBuf,
}

/// Outcome of rebuilding one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub engine: EngineKind,
    pub path: PathBuf,
    /// Distinct canonical words stored.
    pub words: u64,
    /// Stored entries: prefixes plus terminal markers for the ordered
    /// index, rows for the relational table.
    pub entries: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_omits_truncated_flag_when_unset() {
        let response = SearchResponse {
            result: vec!["FRANCE".to_string()],
            duration: 0.5,
            truncated: false,
        };

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value, serde_json::json!({"result": ["FRANCE"], "duration": 0.5}));
    }

    #[test]
    fn error_payloads_use_fixed_messages() {
        let value = serde_json::to_value(ErrorResponse::query_required()).expect("serialize");
        assert_eq!(value["error"], "Query parameter \"q\" is required.");

        let value = serde_json::to_value(FailureResponse::generic()).expect("serialize");
        assert_eq!(value, serde_json::json!({"result": [], "message": "Something went wrong!"}));
    }

    #[test]
    fn seed_target_all_includes_both_engines() {
        assert!(SeedTarget::All.includes(EngineKind::Ordered));
        assert!(SeedTarget::All.includes(EngineKind::Relational));
        assert!(!SeedTarget::Ordered.includes(EngineKind::Relational));
    }
}
