//! Contains the service logic of the dashboard
use models_distrito::{
    District, DistrictId, DistrictOption, PropertyId, PropertySummary, UserProfile,
    user::ProfileFields,
};
use uuid::Uuid;

use crate::domain::{
    error::{DashboardError, Result},
    map::{self, MapView, PolygonDocuments},
    models::{DistrictForm, DistrictScope, NewUser, PropertyForm, Session, SessionId, Tokens},
    ports::{Backend, DashboardService, PolygonSource},
    view::{self, Action, Screen, ViewData, ViewState},
    visibility,
};

mod districts;
mod properties;
mod uploads;
mod users;


/// Implementation of the [DashboardService] on top of a [Backend] and a
/// [PolygonSource]
#[derive(Debug, Clone)]
pub struct DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    backend: B,
    polygons: P,
}

impl<B, P> DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    pub fn new(backend: B, polygons: P) -> Self {
        Self { backend, polygons }
    }

    /// All districts filtered down to the ones the session may see
    async fn visible_districts(&self, session: &Session) -> Result<Vec<District>> {
        let all = self
            .backend
            .list_districts(session.access_token())
            .await
            .map_err(DashboardError::fetch)?;
        Ok(visibility::visible_districts(&session.profile, all))
    }

    async fn load_polygons(&self, districts: &[District]) -> PolygonDocuments {
        let mut documents = PolygonDocuments::new();
        for (district_id, band, url) in map::polygon_requests(districts) {
            match self.polygons.fetch_polygon(url).await {
                Ok(document) => {
                    documents.insert((district_id, band), document);
                }
                Err(e) => {
                    tracing::warn!(error=?e, district_id, minutes = band.minutes(), "unable to load polygon");
                }
            }
        }
        documents
    }
}

fn require_super_admin(session: &Session, what: &str) -> Result<()> {
    if session.profile.role.is_super_admin() {
        Ok(())
    } else {
        Err(DashboardError::PermissionDenied(format!(
            "only super admins may {what}"
        )))
    }
}

impl<B, P> DashboardService for DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    #[tracing::instrument(skip(self, password), err)]
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(DashboardError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let grant = self
            .backend
            .sign_in(email.trim(), password)
            .await
            .map_err(|e| {
                tracing::info!(error=?e, "sign in rejected");
                DashboardError::Auth("invalid email or password".to_string())
            })?;

        let profile = self
            .backend
            .get_profile(&grant.tokens.access_token, grant.user_id)
            .await
            .map_err(DashboardError::fetch)?
            .ok_or_else(|| DashboardError::Auth("user has no profile".to_string()))?;

        Ok(Session {
            id: SessionId::new(),
            tokens: grant.tokens,
            profile,
            view: ViewState::Dashboard,
        })
    }

    #[tracing::instrument(skip_all, fields(session_id = %session.id))]
    async fn logout(&self, session: &Session) {
        if let Err(e) = self.backend.sign_out(session.access_token()).await {
            tracing::warn!(error=?e, "sign out failed, dropping the session anyway");
        }
    }

    #[tracing::instrument(skip_all, fields(session_id = %session.id), err)]
    async fn refresh(&self, session: &Session) -> Result<Tokens> {
        self.backend
            .refresh(&session.tokens.refresh_token)
            .await
            .map(|grant| grant.tokens)
            .map_err(|e| DashboardError::Auth(format!("unable to refresh the session: {e:#}")))
    }

    fn navigate(&self, session: &Session, action: Action) -> ViewState {
        view::transition(session.view, session.profile.role, action)
    }

    #[tracing::instrument(skip_all, fields(view = %session.view), err)]
    async fn screen(&self, session: &Session) -> Result<Screen> {
        let profile = &session.profile;
        let data = match session.view {
            ViewState::Login => ViewData::default(),
            ViewState::Dashboard => ViewData {
                districts: self.visible_districts(session).await?,
                ..Default::default()
            },
            ViewState::AdminUsers if !profile.role.is_super_admin() => ViewData::default(),
            ViewState::AdminUsers => ViewData {
                district_options: self.district_options(session).await?,
                users: self.list_users(session).await?,
                ..Default::default()
            },
            ViewState::Properties => ViewData {
                district_options: self.district_options(session).await?,
                properties: self.list_properties(session).await?,
                ..Default::default()
            },
        };
        Ok(view::render(session.view, profile, data))
    }

    async fn list_users(&self, session: &Session) -> Result<Vec<UserProfile>> {
        self.list_users_impl(session).await
    }

    async fn create_user(&self, session: &Session, user: NewUser) -> Result<UserProfile> {
        self.create_user_impl(session, user).await
    }

    async fn update_user(
        &self,
        session: &Session,
        user_id: Uuid,
        fields: ProfileFields,
    ) -> Result<UserProfile> {
        self.update_user_impl(session, user_id, fields).await
    }

    async fn list_districts(&self, session: &Session) -> Result<Vec<District>> {
        self.visible_districts(session).await
    }

    async fn district_options(&self, session: &Session) -> Result<Vec<DistrictOption>> {
        let visible = self.visible_districts(session).await?;
        Ok(visibility::district_options(&visible))
    }

    async fn create_district(&self, session: &Session, form: DistrictForm) -> Result<()> {
        self.create_district_impl(session, form).await
    }

    async fn update_district(
        &self,
        session: &Session,
        id: DistrictId,
        form: DistrictForm,
    ) -> Result<()> {
        self.update_district_impl(session, id, form).await
    }

    async fn delete_district(&self, session: &Session, id: DistrictId) -> Result<()> {
        self.delete_district_impl(session, id).await
    }

    async fn list_properties(&self, session: &Session) -> Result<Vec<PropertySummary>> {
        self.list_properties_impl(session).await
    }

    async fn create_property(&self, session: &Session, form: PropertyForm) -> Result<PropertyId> {
        self.create_property_impl(session, form).await
    }

    #[tracing::instrument(skip_all, fields(user_id = %session.user_id()), err)]
    async fn map(&self, session: &Session) -> Result<MapView> {
        let districts = self.visible_districts(session).await?;

        let properties = if districts.is_empty() {
            vec![]
        } else {
            let scope = DistrictScope::Only(districts.iter().map(|d| d.id).collect());
            match self
                .backend
                .list_properties(session.access_token(), &scope)
                .await
            {
                Ok(properties) => properties,
                Err(e) => {
                    tracing::warn!(error=?e, "unable to load property markers");
                    vec![]
                }
            }
        };

        let documents = self.load_polygons(&districts).await;
        Ok(map::render_map(&districts, &documents, &properties))
    }
}
