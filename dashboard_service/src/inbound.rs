use anyhow::Context;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::ports::DashboardService;

pub mod axum_router;
pub mod error_response;
pub mod forms;
mod health;
pub mod session_store;
pub mod swagger;

/// Serves the dashboard api on `port` until the server stops
pub async fn serve<T>(service: T, port: u16) -> anyhow::Result<()>
where
    T: DashboardService,
{
    let backend_configured = service.unavailable_reason().is_none();
    let cors = CorsLayer::permissive();

    let app = axum_router::dashboard_router(axum_router::DashboardState::new(service))
        .layer(TraceLayer::new_for_http())
        .merge(health::router(backend_configured))
        .layer(cors)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", swagger::ApiDoc::openapi()));

    let bind_address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind to address {}", bind_address))?;

    tracing::info!(port, backend_configured, "dashboard service is up and running");

    axum::serve(listener, app.into_make_service())
        .await
        .context("error running axum server")
}
