use async_trait::async_trait;
use reqwest::{Error, Response};
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request error: {0}")]
    Generic(#[from] anyhow::Error),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded {status_code}: {message}")]
    NetworkError { status_code: u16, message: String },
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unable to parse response from {operation}: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::NetworkError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// true when the backend rejected the access token. The table service
    /// answers 401; storage reports an expired jwt with 400 or 403.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::NetworkError {
                status_code: 401, ..
            } => true,
            ClientError::NetworkError {
                status_code: 400 | 403,
                message,
            } => message.to_ascii_lowercase().contains("jwt expired"),
            _ => false,
        }
    }
}

/// The identity, table and storage services all report errors as a json object,
/// but each uses different keys for the human readable part.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl BackendErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

pub(crate) fn extract_message(body: &str) -> String {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .and_then(BackendErrorBody::into_message)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
pub trait ResponseExt {
    async fn map_client_error(self) -> Result<Response, ClientError>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn map_client_error(self) -> Result<Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status_code = self.status().as_u16();
        let body = self.text().await.unwrap_or_default();
        Err(ClientError::NetworkError {
            status_code,
            message: extract_message(&body),
        })
    }
}

#[async_trait]
impl ResponseExt for Result<Response, Error> {
    async fn map_client_error(self) -> Result<Response, ClientError> {
        match self {
            Ok(response) => response.map_client_error().await,
            Err(e) => Err(ClientError::Transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_prefers_the_backend_message() {
        assert_eq!(
            extract_message(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            extract_message(r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#),
            "Invalid Refresh Token"
        );
        assert_eq!(
            extract_message(r#"{"code":"23505","message":"duplicate key value"}"#),
            "duplicate key value"
        );
    }

    #[test]
    fn it_falls_back_to_the_raw_body() {
        assert_eq!(extract_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn it_recognizes_rejected_tokens() {
        let err = ClientError::NetworkError {
            status_code: 401,
            message: "JWT expired".to_string(),
        };
        assert!(err.is_unauthorized());
        let err = ClientError::NetworkError {
            status_code: 400,
            message: "jwt expired".to_string(),
        };
        assert!(err.is_unauthorized());
        let err = ClientError::NetworkError {
            status_code: 403,
            message: "new row violates row-level security policy".to_string(),
        };
        assert!(!err.is_unauthorized());
        let err = ClientError::NetworkError {
            status_code: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_unauthorized());
    }
}
