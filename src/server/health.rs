use axum::http::StatusCode;

/// GET / - liveness probe.
pub async fn handler() -> StatusCode {
    StatusCode::OK
}
