//! Domain error types

use models_distrito::{PropertyId, property::SatelliteKind};
use thiserror::Error;

use crate::domain::ports::TokenRejected;

/// Errors surfaced by dashboard operations
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Bad credentials, missing profile, or an unknown or expired session
    #[error("{0}")]
    Auth(String),

    /// The backend rejected the session's access token
    #[error("the session token was rejected by the backend")]
    TokenExpired,

    /// The backend credentials were not configured at startup
    #[error("backend is not configured: {0}")]
    Config(String),

    /// The caller's role does not allow the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The submitted form is invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found or not visible to the caller
    #[error("{0}")]
    NotFound(String),

    /// An insert, update, delete, procedure call or upload failed
    #[error("Remote write failed: {0:#}")]
    RemoteWrite(anyhow::Error),

    /// A read from the backend failed
    #[error("Fetch failed: {0:#}")]
    Fetch(anyhow::Error),

    /// The property root was stored but one of its satellites was not. The root
    /// and the satellites written before it are kept.
    #[error("property {property_id} was created but {satellite} could not be written: {source:#}")]
    PartialWrite {
        property_id: PropertyId,
        satellite: SatelliteKind,
        source: anyhow::Error,
    },
}

impl DashboardError {
    /// A failed read, or [DashboardError::TokenExpired] when an adapter
    /// marked the failure with [TokenRejected]
    pub fn fetch(err: anyhow::Error) -> Self {
        if is_token_rejected(&err) {
            DashboardError::TokenExpired
        } else {
            DashboardError::Fetch(err)
        }
    }

    /// A failed write, or [DashboardError::TokenExpired] when an adapter
    /// marked the failure with [TokenRejected]
    pub fn remote_write(err: anyhow::Error) -> Self {
        if is_token_rejected(&err) {
            DashboardError::TokenExpired
        } else {
            DashboardError::RemoteWrite(err)
        }
    }
}

fn is_token_rejected(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TokenRejected>().is_some()
}

/// Result type for domain operations
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use cool_asserts::assert_matches;

    #[test]
    fn it_recognizes_rejected_tokens_under_context() {
        let err = anyhow::anyhow!("backend responded 401: JWT expired")
            .context("unable to list districts")
            .context(TokenRejected)
            .context("while loading the dashboard");
        assert_matches!(DashboardError::fetch(err), DashboardError::TokenExpired);

        let err: anyhow::Result<()> = Err(anyhow::anyhow!("backend responded 500: boom"));
        let err = err.context("unable to list districts").unwrap_err();
        assert_matches!(DashboardError::remote_write(err), DashboardError::RemoteWrite(_));
    }
}
