//! HTTP server mode for `speedsearch`.
//!
//! This module exposes a small HTTP+JSON API over the benchmark harness:
//!
//! - `GET /api/search/{engine}?q=...` – runs a prefix query against the
//!   `ordered` or `relational` engine and returns `{result, duration}`.
//! - `GET /api/health` – simple health check endpoint.
//!
//! Engines are created once at startup, shared across requests, and
//! dropped when the server shuts down. Engine work runs on the blocking
//! thread pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::models::{EngineKind, SearchParams};
use crate::search::harness::{self, SearchOutcome};
use crate::search::{OrderedEngine, PrefixEngine, RelationalEngine};

/// Engines shared by all request handlers.
pub struct AppState {
    pub ordered: OrderedEngine,
    pub relational: RelationalEngine,
}

impl AppState {
    pub fn engine(&self, kind: EngineKind) -> &dyn PrefixEngine {
        match kind {
            EngineKind::Ordered => &self.ordered,
            EngineKind::Relational => &self.relational,
        }
    }
}

/// Simple health-check response payload.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

impl IntoResponse for SearchOutcome {
    fn into_response(self) -> Response {
        match self {
            SearchOutcome::Found(body) => (StatusCode::OK, Json(body)).into_response(),
            SearchOutcome::Invalid(body) => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
            SearchOutcome::Failed(body) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Build the Axum router for the speedsearch HTTP API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/search/:engine", get(search))
        .with_state(state)
}

/// Run the HTTP server bound to the provided socket address until
/// Ctrl-C is received.
///
/// This is used by the CLI `speedsearch serve` subcommand.
pub async fn run(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "speedsearch server listening");
    serve_with_listener(listener, state).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("speedsearch server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn search(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<EngineKind>,
    Query(params): Query<SearchParams>,
) -> SearchOutcome {
    let task = tokio::task::spawn_blocking(move || {
        harness::run(state.engine(kind), params.q.as_deref())
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(engine = %kind, error = %err, "query worker panicked");
            SearchOutcome::failed()
        }
    }
}
