use anyhow::Context;
use bytes::Bytes;
use models_distrito::{
    District, DistrictId, PropertyId, UserProfile,
    property::{NewPropertyRoot, PropertyRoot, PropertyWithJoins, Satellite, SatelliteRow},
    user::ProfileFields,
};
use serde::Serialize;
use serde_json::json;
use supabase_client::{AuthSession, Bearer, ClientError, Query, SignUpOutcome, SupabaseClient};
use uuid::Uuid;

use crate::{
    constants::{procedures, tables},
    domain::{
        models::{AuthGrant, DistrictRecord, DistrictScope, SignUp, Tokens},
        ports::{
            AuthGateway, DistrictRepository, ObjectStorage, ProfileRepository, PropertyRepository,
            TokenRejected,
        },
    },
};

/// Columns of the property listing, joined to the district name, the portal
/// price and the backoffice type
const PROPERTY_LISTING: &str = "
    *,
    distritos(nombre),
    propiedades_portal(precio_publicacion),
    propiedades_backoffice(tipo_propiedad)
";

/// Like [anyhow::Context], but marks failures caused by a rejected access
/// token with [TokenRejected]
trait BackendContext<T> {
    fn backend_context<C>(self, context: C) -> anyhow::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;
}

impl<T> BackendContext<T> for Result<T, ClientError> {
    fn backend_context<C>(self, context: C) -> anyhow::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|err| {
            let rejected = err.is_unauthorized();
            let err = anyhow::Error::new(err).context(context);
            if rejected {
                err.context(TokenRejected)
            } else {
                err
            }
        })
    }
}

/// Every port implemented on top of the managed backend
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    client: SupabaseClient,
}

impl SupabaseBackend {
    pub fn new(client: SupabaseClient) -> Self {
        SupabaseBackend { client }
    }
}

impl From<AuthSession> for AuthGrant {
    fn from(session: AuthSession) -> Self {
        AuthGrant {
            user_id: session.user.id,
            tokens: Tokens {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
            },
        }
    }
}

impl From<SignUpOutcome> for SignUp {
    fn from(outcome: SignUpOutcome) -> Self {
        match outcome {
            SignUpOutcome::Confirmed(session) => {
                let grant = AuthGrant::from(session);
                SignUp {
                    user_id: grant.user_id,
                    tokens: Some(grant.tokens),
                }
            }
            SignUpOutcome::PendingConfirmation(user) => SignUp {
                user_id: user.id,
                tokens: None,
            },
        }
    }
}

impl AuthGateway for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<AuthGrant> {
        let session = self.client.sign_in_with_password(email, password).await?;
        Ok(session.into())
    }

    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<AuthGrant> {
        let session = self.client.refresh_session(refresh_token).await?;
        Ok(session.into())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: &ProfileFields,
    ) -> anyhow::Result<SignUp> {
        let metadata = json!({ "full_name": fields.full_name, "role": fields.role });
        let outcome = self
            .client
            .sign_up(email, password, metadata)
            .await
            .context("sign up failed")?;
        Ok(outcome.into())
    }

    async fn sign_out(&self, access_token: &str) -> anyhow::Result<()> {
        self.client.sign_out(access_token).await?;
        Ok(())
    }
}

/// Insert body of `user_profiles`
#[derive(Serialize)]
struct ProfileRow<'a> {
    id: Uuid,
    #[serde(flatten)]
    fields: &'a ProfileFields,
}

impl ProfileRepository for SupabaseBackend {
    async fn get_profile(&self, token: &str, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let profiles: Vec<UserProfile> = self
            .client
            .select(
                tables::USER_PROFILES,
                &Query::select("*").eq("id", user_id),
                Bearer::User(token),
            )
            .await
            .backend_context("unable to load profile")?;
        Ok(profiles.into_iter().next())
    }

    async fn list_profiles(&self, token: &str) -> anyhow::Result<Vec<UserProfile>> {
        let profiles = self
            .client
            .select(
                tables::USER_PROFILES,
                &Query::select("*").order("created_at", true),
                Bearer::User(token),
            )
            .await
            .backend_context("unable to list profiles")?;
        Ok(profiles)
    }

    async fn insert_profile(
        &self,
        token: &str,
        user_id: Uuid,
        fields: &ProfileFields,
    ) -> anyhow::Result<()> {
        self.client
            .insert_minimal(
                tables::USER_PROFILES,
                &ProfileRow {
                    id: user_id,
                    fields,
                },
                Bearer::User(token),
            )
            .await
            .backend_context("unable to insert profile")?;
        Ok(())
    }

    async fn update_profile(
        &self,
        token: &str,
        user_id: Uuid,
        fields: &ProfileFields,
    ) -> anyhow::Result<Option<UserProfile>> {
        let updated: Vec<UserProfile> = self
            .client
            .update(
                tables::USER_PROFILES,
                &Query::new().eq("id", user_id),
                fields,
                Bearer::User(token),
            )
            .await
            .backend_context("unable to update profile")?;
        Ok(updated.into_iter().next())
    }
}

/// Parameters of the district procedures
#[derive(Debug, Serialize, PartialEq)]
struct DistrictParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    p_id: Option<DistrictId>,
    p_nombre: &'a str,
    p_direccion: &'a str,
    p_comuna: &'a str,
    p_region: &'a str,
    p_lat: f64,
    p_lon: f64,
    p_isocronas: &'a [String],
    p_foto_url: Option<&'a str>,
    p_poligono_url_5: Option<&'a str>,
    p_poligono_url_10: Option<&'a str>,
    p_poligono_url_15: Option<&'a str>,
    p_poligono_url_20: Option<&'a str>,
}

impl<'a> DistrictParams<'a> {
    fn new(id: Option<DistrictId>, record: &'a DistrictRecord) -> Self {
        let fields = &record.fields;
        let poligonos = &record.poligonos;
        DistrictParams {
            p_id: id,
            p_nombre: &fields.nombre,
            p_direccion: &fields.direccion,
            p_comuna: &fields.comuna,
            p_region: &fields.region,
            p_lat: fields.lat,
            p_lon: fields.lon,
            p_isocronas: &fields.isocronas_config,
            p_foto_url: record.foto_url.as_deref(),
            p_poligono_url_5: poligonos.min_5.as_deref(),
            p_poligono_url_10: poligonos.min_10.as_deref(),
            p_poligono_url_15: poligonos.min_15.as_deref(),
            p_poligono_url_20: poligonos.min_20.as_deref(),
        }
    }
}

impl DistrictRepository for SupabaseBackend {
    async fn list_districts(&self, token: &str) -> anyhow::Result<Vec<District>> {
        let districts = self
            .client
            .select(tables::DISTRICTS, &Query::select("*"), Bearer::User(token))
            .await
            .backend_context("unable to list districts")?;
        Ok(districts)
    }

    async fn create_district(&self, token: &str, record: &DistrictRecord) -> anyhow::Result<()> {
        self.client
            .rpc(
                procedures::CREATE_DISTRICT,
                &DistrictParams::new(None, record),
                Bearer::User(token),
            )
            .await
            .backend_context("create_distrito_func failed")?;
        Ok(())
    }

    async fn update_district(
        &self,
        token: &str,
        id: DistrictId,
        record: &DistrictRecord,
    ) -> anyhow::Result<()> {
        self.client
            .rpc(
                procedures::UPDATE_DISTRICT,
                &DistrictParams::new(Some(id), record),
                Bearer::User(token),
            )
            .await
            .backend_context("update_distrito_func failed")?;
        Ok(())
    }

    async fn delete_district(&self, token: &str, id: DistrictId) -> anyhow::Result<()> {
        self.client
            .rpc(
                procedures::DELETE_DISTRICT,
                &json!({ "p_id": id }),
                Bearer::User(token),
            )
            .await
            .backend_context("delete_distrito_func failed")?;
        Ok(())
    }
}

impl PropertyRepository for SupabaseBackend {
    async fn insert_property_root(
        &self,
        token: &str,
        root: &NewPropertyRoot,
    ) -> anyhow::Result<PropertyId> {
        let inserted: Vec<PropertyRoot> = self
            .client
            .insert(tables::PROPERTIES, root, Bearer::User(token))
            .await
            .backend_context("unable to insert property")?;
        inserted
            .first()
            .map(|row| row.id)
            .context("property insert returned no row")
    }

    async fn insert_satellite(
        &self,
        token: &str,
        property_id: PropertyId,
        satellite: &Satellite,
    ) -> anyhow::Result<()> {
        let table = satellite.kind().table();
        self.client
            .insert_minimal(
                table,
                &SatelliteRow {
                    propiedad_id: property_id,
                    record: satellite,
                },
                Bearer::User(token),
            )
            .await
            .backend_context(format!("unable to insert into {table}"))?;
        Ok(())
    }

    async fn list_properties(
        &self,
        token: &str,
        scope: &DistrictScope,
    ) -> anyhow::Result<Vec<PropertyWithJoins>> {
        let query = match scope {
            DistrictScope::All => Query::select(PROPERTY_LISTING),
            DistrictScope::Only(ids) => {
                Query::select(PROPERTY_LISTING).in_("distrito_id", ids.iter())
            }
        };
        let properties = self
            .client
            .select(tables::PROPERTIES, &query, Bearer::User(token))
            .await
            .backend_context("unable to list properties")?;
        Ok(properties)
    }
}

impl ObjectStorage for SupabaseBackend {
    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        self.client
            .upload(bucket, path, bytes, content_type, Bearer::User(token))
            .await
            .backend_context(format!("unable to upload {bucket}/{path}"))?;
        Ok(self.client.public_url(bucket, path))
    }
}
