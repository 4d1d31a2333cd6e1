//! User profiles and the roles that gate the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::district::DistrictId;

/// Application role stored on the profile row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    FranchiseeAdmin,
    FranchiseeEditor,
    FranchiseeViewer,
}

impl Role {
    /// Sees every district regardless of assignment
    pub fn sees_all_districts(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// May create and delete districts and administer users
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// May edit the districts visible to it
    pub fn can_edit_districts(&self) -> bool {
        matches!(
            self,
            Role::SuperAdmin | Role::FranchiseeAdmin | Role::FranchiseeEditor
        )
    }

    /// May register new properties
    pub fn can_create_properties(&self) -> bool {
        !matches!(self, Role::FranchiseeViewer)
    }

    /// Label shown in the sidebar badge
    pub fn badge(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "👑 Super Admin",
            Role::FranchiseeAdmin => "🏢 Admin",
            Role::FranchiseeEditor => "✏️ Editor",
            Role::FranchiseeViewer => "👀 Visita",
        }
    }
}

/// Row of the `user_profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// The backend stores `null` for users that were never assigned.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assigned_districts: Vec<DistrictId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_assigned_to(&self, district_id: DistrictId) -> bool {
        self.assigned_districts.contains(&district_id)
    }
}

/// Editable profile fields, used both for the sign-up insert and the admin edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileFields {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub assigned_districts: Vec<DistrictId>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
