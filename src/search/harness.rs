//! Uniform request/response contract around the prefix engines.
//!
//! `run` turns any engine outcome into one of three payloads:
//!
//! - `Found` – `{result, duration}` with the duration in milliseconds.
//! - `Invalid` – the fixed "query required" client error.
//! - `Failed` – a generic failure with empty results. The underlying
//!   error is logged and never returned to the caller.

use crate::models::{ErrorResponse, FailureResponse, SearchResponse};
use crate::search::engine::{PrefixEngine, QueryError};

/// Payload produced for a single query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(SearchResponse),
    Invalid(ErrorResponse),
    Failed(FailureResponse),
}

impl SearchOutcome {
    /// Masked outcome for failures that happen outside an engine.
    pub fn failed() -> Self {
        SearchOutcome::Failed(FailureResponse::generic())
    }

    /// HTTP-equivalent status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            SearchOutcome::Found(_) => 200,
            SearchOutcome::Invalid(_) => 400,
            SearchOutcome::Failed(_) => 500,
        }
    }
}

/// Run `raw` against `engine`.
///
/// A missing query is treated the same as a blank one.
pub fn run(engine: &dyn PrefixEngine, raw: Option<&str>) -> SearchOutcome {
    let Some(raw) = raw else {
        return SearchOutcome::Invalid(ErrorResponse::query_required());
    };

    match engine.query(raw) {
        Ok(output) => SearchOutcome::Found(SearchResponse {
            result: output.matches,
            duration: output.elapsed.as_secs_f64() * 1000.0,
            truncated: output.truncated,
        }),
        Err(QueryError::Validation(_)) => SearchOutcome::Invalid(ErrorResponse::query_required()),
        Err(QueryError::Engine(err)) => {
            tracing::error!(engine = %engine.kind(), error = %err, "prefix query failed");
            SearchOutcome::failed()
        }
    }
}
