use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use models_distrito::{
    District, DistrictId, DistrictOption, PolygonUrls, PropertyId, PropertySummary, Role,
    UserProfile, user::ProfileFields,
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::util::ServiceExt;
use uuid::Uuid;

use crate::{
    domain::{
        error::{DashboardError, Result},
        map::MapView,
        models::{DistrictForm, NewUser, PropertyForm, Session, SessionId, Tokens},
        ports::DashboardService,
        view::{self, Action, Screen, ViewData, ViewState},
    },
    inbound::axum_router::{DashboardState, dashboard_router},
    outbound::unconfigured::UnconfiguredService,
};

const BOUNDARY: &str = "distrito0boundary";

#[derive(Default)]
struct StubDashboard {
    refreshes: Arc<AtomicUsize>,
}

fn profile(email: &str, role: Role) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Usuaria".to_string(),
        role,
        assigned_districts: vec![3],
        created_at: None,
    }
}

fn district() -> District {
    District {
        id: 3,
        nombre: "Ñuñoa Centro".to_string(),
        direccion: "Irarrázaval 3000".to_string(),
        comuna: "Ñuñoa".to_string(),
        region: "Metropolitana".to_string(),
        lat: -33.45,
        lon: -70.6,
        isocronas_config: vec!["5 min".to_string()],
        foto_url: None,
        poligonos: PolygonUrls::default(),
    }
}

impl DashboardService for StubDashboard {
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let (role, access_token, refresh_token) = match (email, password) {
            ("admin@distrito0.cl", "secreto") => (Role::SuperAdmin, "access", "refresh"),
            ("visita@distrito0.cl", "secreto") => (Role::FranchiseeViewer, "access", "refresh"),
            ("caducada@distrito0.cl", "secreto") => (Role::FranchiseeViewer, "expired", "stale"),
            ("revocada@distrito0.cl", "secreto") => (Role::FranchiseeViewer, "expired", "revoked"),
            _ => return Err(DashboardError::Auth("invalid email or password".to_string())),
        };
        Ok(Session {
            id: SessionId::new(),
            tokens: Tokens {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
            },
            profile: profile(email, role),
            view: ViewState::Dashboard,
        })
    }

    async fn logout(&self, _session: &Session) {}

    async fn refresh(&self, session: &Session) -> Result<Tokens> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match session.tokens.refresh_token.as_str() {
            "revoked" => Err(DashboardError::Auth("refresh token revoked".to_string())),
            "stale" => Ok(Tokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            }),
            _ => Ok(session.tokens.clone()),
        }
    }

    fn navigate(&self, session: &Session, action: Action) -> ViewState {
        view::transition(session.view, session.profile.role, action)
    }

    async fn screen(&self, session: &Session) -> Result<Screen> {
        Ok(view::render(
            session.view,
            &session.profile,
            ViewData {
                districts: vec![district()],
                ..Default::default()
            },
        ))
    }

    async fn list_users(&self, session: &Session) -> Result<Vec<UserProfile>> {
        Ok(vec![session.profile.clone()])
    }

    async fn create_user(&self, _session: &Session, user: NewUser) -> Result<UserProfile> {
        Ok(profile(&user.email, user.role))
    }

    async fn update_user(
        &self,
        _session: &Session,
        _user_id: Uuid,
        _fields: ProfileFields,
    ) -> Result<UserProfile> {
        Err(DashboardError::NotFound("user not found".to_string()))
    }

    async fn list_districts(&self, session: &Session) -> Result<Vec<District>> {
        if session.access_token() == "expired" {
            return Err(DashboardError::TokenExpired);
        }
        Ok(vec![district()])
    }

    async fn district_options(&self, _session: &Session) -> Result<Vec<DistrictOption>> {
        Ok(vec![])
    }

    async fn create_district(&self, _session: &Session, form: DistrictForm) -> Result<()> {
        form.fields.validate().map_err(DashboardError::Validation)
    }

    async fn update_district(
        &self,
        _session: &Session,
        _id: DistrictId,
        _form: DistrictForm,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete_district(&self, _session: &Session, _id: DistrictId) -> Result<()> {
        Err(DashboardError::RemoteWrite(anyhow::anyhow!("procedure failed")))
    }

    async fn list_properties(&self, _session: &Session) -> Result<Vec<PropertySummary>> {
        Ok(vec![])
    }

    async fn create_property(&self, session: &Session, form: PropertyForm) -> Result<PropertyId> {
        if !session.profile.role.can_create_properties() {
            return Err(DashboardError::PermissionDenied(
                "viewers may not create properties".to_string(),
            ));
        }
        match form.adjunto_compraventa {
            Some(_) => Ok(42),
            None => Ok(41),
        }
    }

    async fn map(&self, _session: &Session) -> Result<MapView> {
        Err(DashboardError::Fetch(anyhow::anyhow!("unreachable")))
    }
}

fn stub_router() -> Router {
    dashboard_router(DashboardState::new(StubDashboard::default()))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes.as_ref()).unwrap()
    };
    (status, json)
}

fn json_request(method: &str, uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(session) = session {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {session}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, session: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {session}"))
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(
    uri: &str,
    session: &str,
    data: Value,
    files: &[(&str, &str, &str)],
) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n"
    );
    for (name, file_name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {session}"))
        .body(Body::from(body))
        .unwrap()
}

async fn login(router: &Router, email: &str) -> String {
    let (status, json) = send(
        router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": email, "password": "secreto" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn it_should_reject_requests_without_a_session() {
    let router = stub_router();
    let request = Request::builder()
        .uri("/districts")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({ "message": "missing session" }));

    let (status, _) = send(&router, get("/districts", &Uuid::new_v4().to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_should_reject_bad_credentials() {
    let router = stub_router();
    let (status, json) = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "admin@distrito0.cl", "password": "otra" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({ "message": "invalid email or password" }));
}

#[tokio::test]
async fn it_should_login_and_render_the_dashboard() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let (status, json) = send(&router, get("/view", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["screen"], "dashboard");
    assert_eq!(json["sidebar"]["badge"], "👑 Super Admin");
    assert_eq!(json["districts"][0]["nombre"], "Ñuñoa Centro");
}

#[tokio::test]
async fn it_should_navigate_and_close_the_session_on_logout() {
    let router = stub_router();
    let session = login(&router, "visita@distrito0.cl").await;

    let (status, json) = send(
        &router,
        json_request(
            "POST",
            "/view/actions",
            Some(&session),
            json!({ "action": "open_properties" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["screen"], "properties");

    let (_, json) = send(&router, get("/view", &session)).await;
    assert_eq!(json["screen"], "properties");

    let (status, json) = send(
        &router,
        json_request(
            "POST",
            "/view/actions",
            Some(&session),
            json!({ "action": "logout" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "screen": "login" }));

    let (status, _) = send(&router, get("/view", &session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_should_close_the_session_on_logout() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let (status, _) = send(
        &router,
        json_request("POST", "/auth/logout", Some(&session), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, get("/districts", &session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_should_create_a_property_from_a_multipart_body() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let (status, json) = send(
        &router,
        multipart_request(
            "/properties",
            &session,
            json!({ "direccion": "Av. Italia 1200", "distrito_id": 3 }),
            &[("adjunto_compraventa", "escritura.pdf", "%PDF-1.4")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json, json!({ "id": 42 }));
}

#[tokio::test]
async fn it_should_forbid_viewers_from_creating_properties() {
    let router = stub_router();
    let session = login(&router, "visita@distrito0.cl").await;

    let (status, json) = send(
        &router,
        multipart_request(
            "/properties",
            &session,
            json!({ "direccion": "Av. Italia 1200", "distrito_id": 3 }),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        json,
        json!({ "message": "Permission denied: viewers may not create properties" })
    );
}

#[tokio::test]
async fn it_should_reject_an_invalid_district_form() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let (status, _) = send(
        &router,
        multipart_request(
            "/districts",
            &session,
            json!({ "nombre": "Sin coordenadas" }),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        multipart_request(
            "/districts",
            &session,
            json!({ "nombre": "Vitacura", "lat": -33.39, "lon": -70.57, "isocronas_config": ["5 min"] }),
            &[("poligono_5", "cinco.geojson", "{}")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn it_should_map_backend_failures_to_bad_gateway() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/districts/3")
        .header(header::AUTHORIZATION, format!("Bearer {session}"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json, json!({ "message": "Remote write failed: procedure failed" }));

    let (status, _) = send(&router, get("/map", &session)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn it_should_answer_not_found_for_unknown_users() {
    let router = stub_router();
    let session = login(&router, "admin@distrito0.cl").await;

    let (status, _) = send(
        &router,
        json_request(
            "PATCH",
            &format!("/users/{}", Uuid::new_v4()),
            Some(&session),
            json!({ "email": "a@b.cl", "full_name": "A", "role": "franchisee_admin" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_should_answer_service_unavailable_when_unconfigured() {
    let router: Router = dashboard_router(DashboardState::new(UnconfiguredService::new(
        "SUPABASE_URL is not set",
    )));

    let (status, json) = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "admin@distrito0.cl", "password": "secreto" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        json,
        json!({ "message": "backend is not configured: SUPABASE_URL is not set" })
    );
}

#[tokio::test]
async fn it_should_answer_service_unavailable_for_data_routes_when_unconfigured() {
    let router: Router = dashboard_router(DashboardState::new(UnconfiguredService::new(
        "SUPABASE_URL is not set",
    )));

    let request = Request::builder()
        .uri("/districts")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        json,
        json!({ "message": "backend is not configured: SUPABASE_URL is not set" })
    );

    let (status, _) = send(&router, get("/view", &Uuid::new_v4().to_string())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn it_should_refresh_an_expired_token_and_retry_once() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let router: Router = dashboard_router(DashboardState::new(StubDashboard {
        refreshes: refreshes.clone(),
    }));
    let session = login(&router, "caducada@distrito0.cl").await;

    let (status, json) = send(&router, get("/districts", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["nombre"], "Ñuñoa Centro");
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    // the refreshed pair was stored on the session
    let (status, _) = send(&router, get("/districts", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn it_should_answer_unauthorized_when_the_refresh_is_rejected() {
    let router = stub_router();
    let session = login(&router, "revocada@distrito0.cl").await;

    let (status, json) = send(&router, get("/districts", &session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json,
        json!({ "message": "refresh token revoked" })
    );
}
