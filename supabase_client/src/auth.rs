//! Identity service calls.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    Bearer, SupabaseClient,
    error::{ClientError, ResponseExt},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair issued by the identity service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Result of a sign up. Projects that require email confirmation return the
/// user without a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    Confirmed(AuthSession),
    PendingConfirmation(AuthUser),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSignUp {
    Session(AuthSession),
    User(AuthUser),
}

impl From<RawSignUp> for SignUpOutcome {
    fn from(raw: RawSignUp) -> Self {
        match raw {
            RawSignUp::Session(session) => SignUpOutcome::Confirmed(session),
            RawSignUp::User(user) => SignUpOutcome::PendingConfirmation(user),
        }
    }
}

impl SupabaseClient {
    /// Exchange an email and password for a session
    #[tracing::instrument(skip(self, password), err)]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = self
            .authorize(request, Bearer::Anon)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<AuthSession>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "sign_in_with_password",
                message: e.to_string(),
            })
    }

    /// Exchange a refresh token for a new session
    #[tracing::instrument(skip_all, err)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ClientError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let response = self
            .authorize(request, Bearer::Anon)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<AuthSession>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "refresh_session",
                message: e.to_string(),
            })
    }

    /// Register a new user. Always runs unauthenticated so the caller's own
    /// session is never replaced.
    #[tracing::instrument(skip(self, password, metadata), err)]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, ClientError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/signup"))
            .json(&json!({ "email": email, "password": password, "data": metadata }));

        let response = self
            .authorize(request, Bearer::Anon)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<RawSignUp>()
            .await
            .map(SignUpOutcome::from)
            .map_err(|e| ClientError::Decode {
                operation: "sign_up",
                message: e.to_string(),
            })
    }

    /// Revoke the refresh tokens of the session owning `access_token`
    #[tracing::instrument(skip_all, err)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), ClientError> {
        let request = self.client.post(self.endpoint("auth/v1/logout"));
        self.authorize(request, Bearer::User(access_token))
            .send()
            .await
            .map_client_error()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;

    #[test]
    fn it_reads_a_confirmed_sign_up() {
        let raw: RawSignUp = serde_json::from_value(json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "0b6c5a76-9a5e-4a8c-8d0c-0f3a0e4b9b11", "email": "nuevo@distrito0.cl" },
        }))
        .unwrap();

        assert_matches!(SignUpOutcome::from(raw), SignUpOutcome::Confirmed(session) => {
            assert_eq!(session.access_token, "at");
            assert_eq!(session.user.email.as_deref(), Some("nuevo@distrito0.cl"));
        });
    }

    #[test]
    fn it_reads_a_sign_up_pending_confirmation() {
        let raw: RawSignUp = serde_json::from_value(json!({
            "id": "0b6c5a76-9a5e-4a8c-8d0c-0f3a0e4b9b11",
            "email": "nuevo@distrito0.cl",
            "confirmation_sent_at": "2025-03-01T12:00:00Z",
        }))
        .unwrap();

        assert_matches!(SignUpOutcome::from(raw), SignUpOutcome::PendingConfirmation(user) => {
            assert_eq!(user.id.to_string(), "0b6c5a76-9a5e-4a8c-8d0c-0f3a0e4b9b11");
        });
    }

    #[test]
    fn it_does_not_print_tokens() {
        let session = AuthSession {
            access_token: "secret-access".to_string(),
            refresh_token: "secret-refresh".to_string(),
            expires_in: Some(3600),
            user: AuthUser {
                id: Uuid::nil(),
                email: None,
            },
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
