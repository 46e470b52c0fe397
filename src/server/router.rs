use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{health, providers, streaming};

/// Build the complete axum Router.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::handler))
        .route("/streaming", post(streaming::handler))
        .route("/mcp-server", post(providers::handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
