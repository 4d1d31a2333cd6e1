use models_distrito::{UserProfile, user::ProfileFields};
use uuid::Uuid;

use super::{DashboardServiceImpl, require_super_admin};
use crate::domain::{
    error::{DashboardError, Result},
    models::{NewUser, Session},
    ports::{Backend, PolygonSource},
};

fn validate_profile(fields: &ProfileFields) -> Result<()> {
    if fields.email.trim().is_empty() || fields.full_name.trim().is_empty() {
        return Err(DashboardError::Validation(
            "email and full name are required".to_string(),
        ));
    }
    Ok(())
}

impl<B, P> DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    #[tracing::instrument(skip_all, fields(user_id = %session.user_id()), err)]
    pub(super) async fn list_users_impl(&self, session: &Session) -> Result<Vec<UserProfile>> {
        require_super_admin(session, "list users")?;
        self.backend
            .list_profiles(session.access_token())
            .await
            .map_err(DashboardError::fetch)
    }

    /// Signs the user up without touching the admin's session. The profile is
    /// written with the new user's token when the sign up returned one, and
    /// with the admin's token while the email is pending confirmation.
    #[tracing::instrument(skip_all, fields(user_id = %session.user_id(), email = %user.email), err)]
    pub(super) async fn create_user_impl(
        &self,
        session: &Session,
        user: NewUser,
    ) -> Result<UserProfile> {
        require_super_admin(session, "create users")?;
        if user.password.is_empty() {
            return Err(DashboardError::Validation("password is required".to_string()));
        }
        let fields = user.profile_fields();
        validate_profile(&fields)?;

        let sign_up = self
            .backend
            .sign_up(&fields.email, &user.password, &fields)
            .await
            .map_err(DashboardError::remote_write)?;

        let token = sign_up
            .tokens
            .as_ref()
            .map(|tokens| tokens.access_token.as_str())
            .unwrap_or_else(|| session.access_token());

        self.backend
            .insert_profile(token, sign_up.user_id, &fields)
            .await
            .map_err(DashboardError::remote_write)?;

        Ok(UserProfile {
            id: sign_up.user_id,
            email: fields.email,
            full_name: fields.full_name,
            role: fields.role,
            assigned_districts: fields.assigned_districts,
            created_at: None,
        })
    }

    /// Only the profile row changes, the login email stays as it was
    #[tracing::instrument(skip(self, session, fields), err)]
    pub(super) async fn update_user_impl(
        &self,
        session: &Session,
        user_id: Uuid,
        fields: ProfileFields,
    ) -> Result<UserProfile> {
        require_super_admin(session, "edit users")?;
        validate_profile(&fields)?;

        self.backend
            .update_profile(session.access_token(), user_id, &fields)
            .await
            .map_err(DashboardError::remote_write)?
            .ok_or_else(|| DashboardError::NotFound(format!("user {user_id} not found")))
    }
}
