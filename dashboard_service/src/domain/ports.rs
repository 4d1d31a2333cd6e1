use models_distrito::{
    District, DistrictId, DistrictOption, PropertyId, PropertySummary, UserProfile,
    property::{NewPropertyRoot, PropertyWithJoins, Satellite},
    user::ProfileFields,
};
use uuid::Uuid;

use crate::domain::{
    error::DashboardError,
    map::MapView,
    models::{
        AuthGrant, DistrictForm, DistrictRecord, DistrictScope, NewUser, PropertyForm, Session,
        SignUp, Tokens,
    },
    view::{Action, Screen, ViewState},
};

/// Attached as context by adapters when the backend rejected the access
/// token a call was made with
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("the backend rejected the access token")]
pub struct TokenRejected;

/// The identity service
pub trait AuthGateway: Send + Sync + 'static {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = anyhow::Result<AuthGrant>> + Send;

    fn refresh(&self, refresh_token: &str) -> impl Future<Output = anyhow::Result<AuthGrant>> + Send;

    /// Registers a login without touching any existing session
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: &ProfileFields,
    ) -> impl Future<Output = anyhow::Result<SignUp>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Every repository call runs under the row level security context of the
/// given access token.
pub trait ProfileRepository: Send + Sync + 'static {
    fn get_profile(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<UserProfile>>> + Send;

    /// Newest first
    fn list_profiles(
        &self,
        token: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<UserProfile>>> + Send;

    fn insert_profile(
        &self,
        token: &str,
        user_id: Uuid,
        fields: &ProfileFields,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Returns `None` when no row matched
    fn update_profile(
        &self,
        token: &str,
        user_id: Uuid,
        fields: &ProfileFields,
    ) -> impl Future<Output = anyhow::Result<Option<UserProfile>>> + Send;
}

pub trait DistrictRepository: Send + Sync + 'static {
    fn list_districts(
        &self,
        token: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<District>>> + Send;

    fn create_district(
        &self,
        token: &str,
        record: &DistrictRecord,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn update_district(
        &self,
        token: &str,
        id: DistrictId,
        record: &DistrictRecord,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn delete_district(
        &self,
        token: &str,
        id: DistrictId,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

pub trait PropertyRepository: Send + Sync + 'static {
    fn insert_property_root(
        &self,
        token: &str,
        root: &NewPropertyRoot,
    ) -> impl Future<Output = anyhow::Result<PropertyId>> + Send;

    fn insert_satellite(
        &self,
        token: &str,
        property_id: PropertyId,
        satellite: &Satellite,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Properties with their district name, portal price and backoffice type
    fn list_properties(
        &self,
        token: &str,
        scope: &DistrictScope,
    ) -> impl Future<Output = anyhow::Result<Vec<PropertyWithJoins>>> + Send;
}

pub trait ObjectStorage: Send + Sync + 'static {
    /// Stores `bytes` under `path` and returns its public url
    fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: bytes::Bytes,
        content_type: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Everything the dashboard needs from the managed backend
pub trait Backend:
    AuthGateway + ProfileRepository + DistrictRepository + PropertyRepository + ObjectStorage
{
}

impl<T> Backend for T where
    T: AuthGateway + ProfileRepository + DistrictRepository + PropertyRepository + ObjectStorage
{
}

/// Downloads previously uploaded polygon documents
#[cfg_attr(test, mockall::automock)]
pub trait PolygonSource: Send + Sync + 'static {
    fn fetch_polygon(
        &self,
        url: &str,
    ) -> impl Future<Output = anyhow::Result<serde_json::Value>> + Send;
}

pub trait DashboardService: Send + Sync + 'static {
    /// Authenticates and resolves the profile. The returned session starts on
    /// the dashboard.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, DashboardError>> + Send;

    /// Best effort sign out at the identity service
    fn logout(&self, session: &Session) -> impl Future<Output = ()> + Send;

    fn refresh(&self, session: &Session) -> impl Future<Output = Result<Tokens, DashboardError>> + Send;

    /// Applies a navigation action to the session's view state
    fn navigate(&self, session: &Session, action: Action) -> ViewState;

    /// Why the backend cannot serve any request, `None` once it is configured
    fn unavailable_reason(&self) -> Option<&str> {
        None
    }

    fn screen(&self, session: &Session) -> impl Future<Output = Result<Screen, DashboardError>> + Send;

    fn list_users(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<UserProfile>, DashboardError>> + Send;

    fn create_user(
        &self,
        session: &Session,
        user: NewUser,
    ) -> impl Future<Output = Result<UserProfile, DashboardError>> + Send;

    fn update_user(
        &self,
        session: &Session,
        user_id: Uuid,
        fields: ProfileFields,
    ) -> impl Future<Output = Result<UserProfile, DashboardError>> + Send;

    fn list_districts(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<District>, DashboardError>> + Send;

    fn district_options(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<DistrictOption>, DashboardError>> + Send;

    fn create_district(
        &self,
        session: &Session,
        form: DistrictForm,
    ) -> impl Future<Output = Result<(), DashboardError>> + Send;

    fn update_district(
        &self,
        session: &Session,
        id: DistrictId,
        form: DistrictForm,
    ) -> impl Future<Output = Result<(), DashboardError>> + Send;

    fn delete_district(
        &self,
        session: &Session,
        id: DistrictId,
    ) -> impl Future<Output = Result<(), DashboardError>> + Send;

    fn list_properties(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<PropertySummary>, DashboardError>> + Send;

    fn create_property(
        &self,
        session: &Session,
        form: PropertyForm,
    ) -> impl Future<Output = Result<PropertyId, DashboardError>> + Send;

    fn map(&self, session: &Session) -> impl Future<Output = Result<MapView, DashboardError>> + Send;
}
