use std::collections::BTreeMap;

use bytes::Bytes;
use models_distrito::{
    DistrictId, IsochroneBand, PolygonUrls, UserProfile, property::NewProperty,
    user::ProfileFields,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::view::ViewState;

/// Handle the client presents on every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

/// Token pair issued by the identity service
#[derive(Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokens").finish_non_exhaustive()
    }
}

/// Result of a successful password or refresh grant
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub user_id: Uuid,
    pub tokens: Tokens,
}

/// Result of a sign up. `tokens` is empty when the backend requires an email
/// confirmation first.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user_id: Uuid,
    pub tokens: Option<Tokens>,
}

/// Everything the service knows about a signed in client.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub tokens: Tokens,
    pub profile: UserProfile,
    pub view: ViewState,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn user_id(&self) -> Uuid {
        self.profile.id
    }
}

/// A file received from the client
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileUpload {
    /// Text after the last `.` of the file name, `bin` when there is none
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "bin",
        }
    }
}

/// Scalar fields of the district form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DistrictFields {
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub comuna: String,
    #[serde(default)]
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub isocronas_config: Vec<String>,
}

impl DistrictFields {
    pub fn band_enabled(&self, band: IsochroneBand) -> bool {
        self.isocronas_config.iter().any(|label| label == band.label())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nombre.trim().is_empty() {
            return Err("nombre is required".to_string());
        }
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err("lat/lon out of range".to_string());
        }
        if let Some(label) = self
            .isocronas_config
            .iter()
            .find(|label| !models_distrito::district::ISOCHRONE_LABELS.contains(&label.as_str()))
        {
            return Err(format!("unknown isochrone label {label}"));
        }
        Ok(())
    }
}

/// The district form with its attachments
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictForm {
    pub fields: DistrictFields,
    pub foto: Option<FileUpload>,
    pub poligonos: BTreeMap<IsochroneBand, FileUpload>,
}

/// A district as handed to the create and update procedures, with the
/// uploaded files already replaced by their public urls
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictRecord {
    pub fields: DistrictFields,
    pub foto_url: Option<String>,
    pub poligonos: PolygonUrls,
}

/// The property form with its documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyForm {
    pub property: NewProperty,
    /// deed of the last sale, stored on the CBR record
    pub adjunto_compraventa: Option<FileUpload>,
    /// copy of the portal listing, stored on the portal record
    pub copia_publicacion: Option<FileUpload>,
    /// façade photo, stored on the backoffice record
    pub foto_fachada: Option<FileUpload>,
}

/// Admin form creating a login plus its profile
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub role: models_distrito::Role,
    #[serde(default)]
    pub assigned_districts: Vec<DistrictId>,
}

impl NewUser {
    pub fn profile_fields(&self) -> ProfileFields {
        ProfileFields {
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            assigned_districts: self.assigned_districts.clone(),
        }
    }
}

/// Which districts a query is restricted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistrictScope {
    All,
    Only(Vec<DistrictId>),
}
