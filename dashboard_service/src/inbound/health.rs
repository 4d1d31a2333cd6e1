use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde_json::{Value, json};

/// `backend_configured` is false when the service started without backend
/// credentials
pub fn router(backend_configured: bool) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(backend_configured)
}

#[tracing::instrument]
async fn health(State(backend_configured): State<bool>) -> Result<Json<Value>, StatusCode> {
    tracing::debug!("health check requested");

    let response = Json(json!({
        "status": "ok",
        "service": "dashboard_service",
        "backend_configured": backend_configured,
    }));

    Ok(response)
}
