//! Prefix query engines and the benchmark harness.
//!
//! This module hosts the two query strategies and the uniform payload
//! contract used by the CLI and the HTTP server.

pub mod engine;
pub mod harness;
pub mod query;

pub use engine::{
    EngineError, Lookup, OrderedEngine, PrefixEngine, QueryError, QueryOutput, RelationalEngine,
};
pub use harness::SearchOutcome;
pub use query::ValidationError;
