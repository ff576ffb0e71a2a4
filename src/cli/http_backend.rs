use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;

use crate::models::{EngineKind, ErrorResponse, FailureResponse, SearchResponse};
use crate::search::SearchOutcome;

/// HTTP client that delegates prefix queries to a running `speedsearch`
/// server.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

impl HttpSearchBackend {
    /// Create a new HTTP backend targeting the given base URL
    /// (e.g. "http://127.0.0.1:7878").
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Execute a query via `GET /api/search/{engine}?q=...`.
    ///
    /// Validation and masked-failure payloads come back as the matching
    /// `SearchOutcome`; any other non-success response is an error.
    pub fn search(&self, engine: EngineKind, query: &str) -> Result<SearchOutcome> {
        let url = self.url_for(&format!("/api/search/{engine}"));
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .with_context(|| format!("failed to send request to {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("failed to read response body from {}", url))?;

        decode_outcome(status.as_u16(), &body)
            .with_context(|| format!("server returned error for {} ({})", url, status))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn decode_outcome(status: u16, body: &str) -> Result<SearchOutcome> {
    let outcome = match status {
        200 => SearchOutcome::Found(
            serde_json::from_str::<SearchResponse>(body)
                .context("failed to decode JSON response from server")?,
        ),
        400 => SearchOutcome::Invalid(
            serde_json::from_str::<ErrorResponse>(body)
                .context("failed to decode error payload from server")?,
        ),
        500 => SearchOutcome::Failed(
            serde_json::from_str::<FailureResponse>(body)
                .context("failed to decode failure payload from server")?,
        ),
        other => bail!("unexpected HTTP status {other}"),
    };
    Ok(outcome)
}
