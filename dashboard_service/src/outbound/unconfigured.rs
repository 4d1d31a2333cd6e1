use models_distrito::{
    District, DistrictId, DistrictOption, PropertyId, PropertySummary, UserProfile,
    user::ProfileFields,
};
use uuid::Uuid;

use crate::domain::{
    error::{DashboardError, Result},
    map::MapView,
    models::{DistrictForm, NewUser, PropertyForm, Session, Tokens},
    ports::DashboardService,
    view::{self, Action, Screen, ViewState},
};

/// Stands in for the dashboard when the backend credentials could not be
/// loaded. Every operation that needs the backend fails with
/// [DashboardError::Config].
#[derive(Debug, Clone)]
pub struct UnconfiguredService {
    reason: String,
}

impl UnconfiguredService {
    pub fn new(reason: impl Into<String>) -> Self {
        UnconfiguredService {
            reason: reason.into(),
        }
    }

    fn err<T>(&self) -> Result<T> {
        Err(DashboardError::Config(self.reason.clone()))
    }
}

impl DashboardService for UnconfiguredService {
    async fn login(&self, _email: &str, _password: &str) -> Result<Session> {
        self.err()
    }

    async fn logout(&self, _session: &Session) {}

    async fn refresh(&self, _session: &Session) -> Result<Tokens> {
        self.err()
    }

    fn navigate(&self, session: &Session, action: Action) -> ViewState {
        view::transition(session.view, session.profile.role, action)
    }

    fn unavailable_reason(&self) -> Option<&str> {
        Some(&self.reason)
    }

    async fn screen(&self, _session: &Session) -> Result<Screen> {
        self.err()
    }

    async fn list_users(&self, _session: &Session) -> Result<Vec<UserProfile>> {
        self.err()
    }

    async fn create_user(&self, _session: &Session, _user: NewUser) -> Result<UserProfile> {
        self.err()
    }

    async fn update_user(
        &self,
        _session: &Session,
        _user_id: Uuid,
        _fields: ProfileFields,
    ) -> Result<UserProfile> {
        self.err()
    }

    async fn list_districts(&self, _session: &Session) -> Result<Vec<District>> {
        self.err()
    }

    async fn district_options(&self, _session: &Session) -> Result<Vec<DistrictOption>> {
        self.err()
    }

    async fn create_district(&self, _session: &Session, _form: DistrictForm) -> Result<()> {
        self.err()
    }

    async fn update_district(
        &self,
        _session: &Session,
        _id: DistrictId,
        _form: DistrictForm,
    ) -> Result<()> {
        self.err()
    }

    async fn delete_district(&self, _session: &Session, _id: DistrictId) -> Result<()> {
        self.err()
    }

    async fn list_properties(&self, _session: &Session) -> Result<Vec<PropertySummary>> {
        self.err()
    }

    async fn create_property(&self, _session: &Session, _form: PropertyForm) -> Result<PropertyId> {
        self.err()
    }

    async fn map(&self, _session: &Session) -> Result<MapView> {
        self.err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;

    #[tokio::test]
    async fn it_reports_the_missing_configuration() {
        let service = UnconfiguredService::new("SUPABASE_URL is not set");
        assert_matches!(
            service.login("admin@distrito0.cl", "secreto").await,
            Err(DashboardError::Config(reason)) => {
                assert_eq!(reason, "SUPABASE_URL is not set");
            }
        );
    }
}
