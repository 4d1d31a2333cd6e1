//! Process local store of signed in sessions and the extractor that resolves
//! the caller's session from its bearer token.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tokio::sync::RwLock;

use crate::domain::{
    error::DashboardError,
    models::{Session, SessionId, Tokens},
    view::ViewState,
};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        self.inner.write().await.insert(session.id, session);
    }

    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Returns `false` when the session no longer exists
    pub async fn set_view(&self, id: SessionId, view: ViewState) -> bool {
        match self.inner.write().await.get_mut(&id) {
            Some(session) => {
                session.view = view;
                true
            }
            None => false,
        }
    }

    /// Returns `false` when the session no longer exists
    pub async fn update_tokens(&self, id: SessionId, tokens: Tokens) -> bool {
        match self.inner.write().await.get_mut(&id) {
            Some(session) => {
                session.tokens = tokens;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: SessionId) -> Option<Session> {
        self.inner.write().await.remove(&id)
    }
}

/// Whether the backend can serve requests at all. Checked before any
/// session lookup.
#[derive(Debug, Clone, Default)]
pub struct BackendStatus {
    unavailable: Option<Arc<str>>,
}

impl BackendStatus {
    pub fn configured() -> Self {
        Self::default()
    }

    pub fn unavailable(reason: &str) -> Self {
        BackendStatus {
            unavailable: Some(Arc::from(reason)),
        }
    }

    pub fn check(&self) -> Result<(), DashboardError> {
        match &self.unavailable {
            Some(reason) => Err(DashboardError::Config(reason.to_string())),
            None => Ok(()),
        }
    }
}

/// The session named by the `Authorization: Bearer <session id>` header
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

fn bearer_session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim()
        .parse()
        .ok()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    SessionStore: FromRef<S>,
    BackendStatus: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DashboardError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        BackendStatus::from_ref(state).check()?;

        let id = bearer_session_id(&parts.headers)
            .ok_or_else(|| DashboardError::Auth("missing session".to_string()))?;

        let store = SessionStore::from_ref(state);
        let session = store
            .get(id)
            .await
            .ok_or_else(|| DashboardError::Auth("unknown or expired session".to_string()))?;

        Ok(CurrentSession(session))
    }
}
