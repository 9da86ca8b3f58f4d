//! REST API over the recommendation engine.
//!
//! Routes:
//! - `GET /api/health`: liveness and catalog size
//! - `GET /api/compensators`: catalog listing
//! - `POST /api/calculate`: manual single-record calculation
//! - `POST /api/analyze-invoices`: aggregated calculation over extraction outcomes

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::recommend::Recommender;

/// Immutable application state shared across all request handlers.
///
/// The recommender holds only configuration, so no locks are needed.
pub struct AppState {
    /// Engine serving every request.
    pub recommender: Recommender,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/compensators", get(handlers::list_compensators))
        .route("/api/calculate", post(handlers::calculate))
        .route("/api/analyze-invoices", post(handlers::analyze_invoices))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
