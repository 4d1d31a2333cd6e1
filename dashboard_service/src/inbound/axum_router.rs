use crate::{
    constants::MAX_UPLOAD_BYTES,
    domain::{
        error::DashboardError,
        map::MapView,
        models::{DistrictFields, NewUser, Session, SessionId},
        ports::DashboardService,
        view::{Action, Screen, ViewState},
    },
    inbound::{
        error_response::ErrorResponse,
        forms::FormParts,
        session_store::{BackendStatus, CurrentSession, SessionStore},
    },
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use models_distrito::{
    District, DistrictId, DistrictOption, PropertyId, PropertySummary, UserProfile,
    property::NewProperty, user::ProfileFields,
};
use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc};
use utoipa::ToSchema;
use uuid::Uuid;

pub struct DashboardState<T> {
    service: Arc<T>,
    sessions: SessionStore,
    backend: BackendStatus,
}

impl<T> Clone for DashboardState<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            sessions: self.sessions.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<T> FromRef<DashboardState<T>> for SessionStore {
    fn from_ref(state: &DashboardState<T>) -> Self {
        state.sessions.clone()
    }
}

impl<T> FromRef<DashboardState<T>> for BackendStatus {
    fn from_ref(state: &DashboardState<T>) -> Self {
        state.backend.clone()
    }
}

impl<T> DashboardState<T>
where
    T: DashboardService,
{
    pub fn new(service: T) -> Self {
        let backend = match service.unavailable_reason() {
            Some(reason) => BackendStatus::unavailable(reason),
            None => BackendStatus::configured(),
        };
        DashboardState {
            service: Arc::new(service),
            sessions: SessionStore::new(),
            backend,
        }
    }

    /// Exchanges the refresh token and stores the new pair on the session
    async fn refresh_session(&self, mut session: Session) -> Result<Session, DashboardError> {
        session.tokens = self.service.refresh(&session).await?;
        if !self
            .sessions
            .update_tokens(session.id, session.tokens.clone())
            .await
        {
            return Err(DashboardError::Auth("unknown or expired session".to_string()));
        }
        tracing::debug!(session_id=%session.id, "session tokens refreshed");
        Ok(session)
    }

    /// Runs `op` for the session. When the backend rejected the access token
    /// the session is refreshed and `op` runs once more.
    async fn with_session<R, F, Fut>(&self, session: Session, op: F) -> Result<R, DashboardError>
    where
        F: Fn(Arc<T>, Session) -> Fut,
        Fut: Future<Output = Result<R, DashboardError>>,
    {
        match op(self.service.clone(), session.clone()).await {
            Err(DashboardError::TokenExpired) => {
                let session = self.refresh_session(session).await?;
                op(self.service.clone(), session).await
            }
            res => res,
        }
    }

    /// Signs the session out and forgets it
    async fn end_session(&self, session: &Session) {
        self.service.logout(session).await;
        self.sessions.remove(session.id).await;
        tracing::info!(session_id=%session.id, "session closed");
    }
}

pub fn dashboard_router<T, S>(state: DashboardState<T>) -> Router<S>
where
    T: DashboardService,
    S: Send + Sync,
{
    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/view", get(view_handler))
        .route("/view/actions", post(action_handler))
        .route("/districts", get(list_districts_handler))
        .route("/districts", post(create_district_handler))
        .route("/districts/options", get(district_options_handler))
        .route("/districts/:id", put(update_district_handler))
        .route("/districts/:id", delete(delete_district_handler))
        .route("/map", get(map_handler))
        .route("/properties", get(list_properties_handler))
        .route("/properties", post(create_property_handler))
        .route("/users", get(list_users_handler))
        .route("/users", post(create_user_handler))
        .route("/users/:id", patch(update_user_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for every other request
    pub session_id: SessionId,
    pub profile: UserProfile,
    pub view: ViewState,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    pub action: Action,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedProperty {
    pub id: PropertyId,
}

/// Multipart body of the district form
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct DistrictUpload {
    data: DistrictFields,
    #[schema(value_type = Option<String>, format = Binary)]
    foto: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    poligono_5: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    poligono_10: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    poligono_15: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    poligono_20: Option<Vec<u8>>,
}

/// Multipart body of the property form
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PropertyUpload {
    data: NewProperty,
    #[schema(value_type = Option<String>, format = Binary)]
    adjunto_compraventa: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    copia_publicacion: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    foto_fachada: Option<Vec<u8>>,
}

/// Signs in and opens a session on the dashboard
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    operation_id = "login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 503, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip_all, fields(email = %req.email))]
pub async fn login_handler<T>(
    State(state): State<DashboardState<T>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, DashboardError>
where
    T: DashboardService,
{
    state.backend.check()?;
    let session = state.service.login(&req.email, &req.password).await?;
    let res = LoginResponse {
        session_id: session.id,
        profile: session.profile.clone(),
        view: session.view,
    };
    state.sessions.insert(session).await;
    tracing::info!(session_id=%res.session_id, "session opened");
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    operation_id = "logout",
    responses(
        (status = 204),
        (status = 401, body = ErrorResponse),
    )
)]
pub async fn logout_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> StatusCode
where
    T: DashboardService,
{
    state.end_session(&session).await;
    StatusCode::NO_CONTENT
}

/// Exchanges the session's refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    operation_id = "refresh",
    responses(
        (status = 204),
        (status = 401, body = ErrorResponse),
        (status = 503, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip_all, fields(session_id = %session.id))]
pub async fn refresh_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, DashboardError>
where
    T: DashboardService,
{
    state.refresh_session(session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Renders the screen the session is on
#[utoipa::path(
    get,
    path = "/view",
    tag = "view",
    operation_id = "get_view",
    responses(
        (status = 200, body = Screen),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn view_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Screen>, DashboardError>
where
    T: DashboardService,
{
    let screen = state
        .with_session(session, |service, session| async move {
            service.screen(&session).await
        })
        .await?;
    Ok(Json(screen))
}

/// Applies a sidebar action and renders the resulting screen. Logging out
/// closes the session.
#[utoipa::path(
    post,
    path = "/view/actions",
    tag = "view",
    operation_id = "apply_action",
    request_body = ActionRequest,
    responses(
        (status = 200, body = Screen),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip_all, fields(session_id = %session.id, ?action))]
pub async fn action_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(mut session): CurrentSession,
    Json(ActionRequest { action }): Json<ActionRequest>,
) -> Result<Json<Screen>, DashboardError>
where
    T: DashboardService,
{
    let view = state.service.navigate(&session, action);
    if view == ViewState::Login {
        state.end_session(&session).await;
        return Ok(Json(Screen::Login));
    }

    if !state.sessions.set_view(session.id, view).await {
        return Err(DashboardError::Auth("unknown or expired session".to_string()));
    }
    session.view = view;
    let screen = state
        .with_session(session, |service, session| async move {
            service.screen(&session).await
        })
        .await?;
    Ok(Json(screen))
}

/// Districts visible to the session
#[utoipa::path(
    get,
    path = "/districts",
    tag = "districts",
    operation_id = "list_districts",
    responses(
        (status = 200, body = Vec<District>),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn list_districts_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<District>>, DashboardError>
where
    T: DashboardService,
{
    let res = state
        .with_session(session, |service, session| async move {
            service.list_districts(&session).await
        })
        .await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/districts/options",
    tag = "districts",
    operation_id = "district_options",
    responses(
        (status = 200, body = Vec<DistrictOption>),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn district_options_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<DistrictOption>>, DashboardError>
where
    T: DashboardService,
{
    let res = state
        .with_session(session, |service, session| async move {
            service.district_options(&session).await
        })
        .await?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/districts",
    tag = "districts",
    operation_id = "create_district",
    request_body(content = DistrictUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn create_district_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    multipart: Multipart,
) -> Result<StatusCode, DashboardError>
where
    T: DashboardService,
{
    let form = FormParts::read(multipart).await?.into_district_form()?;
    state
        .with_session(session, |service, session| {
            let form = form.clone();
            async move { service.create_district(&session, form).await }
        })
        .await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    put,
    path = "/districts/{id}",
    tag = "districts",
    operation_id = "update_district",
    params(("id" = i64, Path, description = "District id")),
    request_body(content = DistrictUpload, content_type = "multipart/form-data"),
    responses(
        (status = 204),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn update_district_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<DistrictId>,
    multipart: Multipart,
) -> Result<StatusCode, DashboardError>
where
    T: DashboardService,
{
    let form = FormParts::read(multipart).await?.into_district_form()?;
    state
        .with_session(session, |service, session| {
            let form = form.clone();
            async move { service.update_district(&session, id, form).await }
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/districts/{id}",
    tag = "districts",
    operation_id = "delete_district",
    params(("id" = i64, Path, description = "District id")),
    responses(
        (status = 204),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn delete_district_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<DistrictId>,
) -> Result<StatusCode, DashboardError>
where
    T: DashboardService,
{
    state
        .with_session(session, |service, session| async move {
            service.delete_district(&session, id).await
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Map layers for the districts visible to the session
#[utoipa::path(
    get,
    path = "/map",
    tag = "map",
    operation_id = "get_map",
    responses(
        (status = 200, body = MapView),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn map_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<MapView>, DashboardError>
where
    T: DashboardService,
{
    let res = state
        .with_session(session, |service, session| async move {
            service.map(&session).await
        })
        .await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/properties",
    tag = "properties",
    operation_id = "list_properties",
    responses(
        (status = 200, body = Vec<PropertySummary>),
        (status = 401, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn list_properties_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<PropertySummary>>, DashboardError>
where
    T: DashboardService,
{
    let res = state
        .with_session(session, |service, session| async move {
            service.list_properties(&session).await
        })
        .await?;
    Ok(Json(res))
}

/// Creates a property with its satellite records and documents
#[utoipa::path(
    post,
    path = "/properties",
    tag = "properties",
    operation_id = "create_property",
    request_body(content = PropertyUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, body = CreatedProperty),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn create_property_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedProperty>), DashboardError>
where
    T: DashboardService,
{
    let form = FormParts::read(multipart).await?.into_property_form()?;
    let id = state
        .with_session(session, |service, session| {
            let form = form.clone();
            async move { service.create_property(&session, form).await }
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedProperty { id })))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "list_users",
    responses(
        (status = 200, body = Vec<UserProfile>),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn list_users_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<UserProfile>>, DashboardError>
where
    T: DashboardService,
{
    let res = state
        .with_session(session, |service, session| async move {
            service.list_users(&session).await
        })
        .await?;
    Ok(Json(res))
}

/// Registers a login and its profile. The caller's session is untouched.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "create_user",
    request_body = NewUser,
    responses(
        (status = 201, body = UserProfile),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn create_user_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    Json(user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserProfile>), DashboardError>
where
    T: DashboardService,
{
    let profile = state
        .with_session(session, |service, session| {
            let user = user.clone();
            async move { service.create_user(&session, user).await }
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    operation_id = "update_user",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ProfileFields,
    responses(
        (status = 200, body = UserProfile),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn update_user_handler<T>(
    State(state): State<DashboardState<T>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(fields): Json<ProfileFields>,
) -> Result<Json<UserProfile>, DashboardError>
where
    T: DashboardService,
{
    let profile = state
        .with_session(session, |service, session| {
            let fields = fields.clone();
            async move { service.update_user(&session, id, fields).await }
        })
        .await?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests;
