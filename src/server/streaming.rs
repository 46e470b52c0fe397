use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;

use super::state::AppState;
use crate::session::StreamingRequest;

/// POST /streaming - run one agent session, streamed as NDJSON chunks.
pub async fn handler(
    State(state): State<AppState>,
    Json(request): Json<StreamingRequest>,
) -> impl IntoResponse {
    let body = Body::from_stream(state.driver.stream(request));
    ([(CONTENT_TYPE, "text/event-stream")], body)
}
