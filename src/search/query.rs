//! Query validation and canonicalization.

use crate::models::QUERY_REQUIRED_MESSAGE;

/// The query was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", QUERY_REQUIRED_MESSAGE)]
pub struct ValidationError;

/// Canonicalize a raw query into the prefix used for lookups.
///
/// The query is upper-cased but otherwise kept as typed: surrounding
/// whitespace is significant for prefixes such as `"UNITED "`. Queries
/// that are blank after trimming are rejected.
pub fn canonical_prefix(raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError);
    }

    Ok(raw.to_uppercase())
}
