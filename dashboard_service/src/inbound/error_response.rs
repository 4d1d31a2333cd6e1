use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::DashboardError;

/// A plain json error body
#[derive(serde::Serialize, serde::Deserialize, Debug, utoipa::ToSchema)]
pub struct ErrorResponse<'a> {
    /// Message to explain failure
    pub message: &'a str,
}

impl DashboardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Auth(_) | DashboardError::TokenExpired => StatusCode::UNAUTHORIZED,
            DashboardError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::RemoteWrite(_)
            | DashboardError::Fetch(_)
            | DashboardError::PartialWrite { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error=?self, "dashboard request failed");
        }

        (
            status,
            Json(ErrorResponse {
                message: &self.to_string(),
            }),
        )
            .into_response()
    }
}
