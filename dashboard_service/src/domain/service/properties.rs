use models_distrito::{PropertyId, PropertySummary};

use super::DashboardServiceImpl;
use crate::{
    constants::buckets,
    domain::{
        error::{DashboardError, Result},
        models::{DistrictScope, FileUpload, PropertyForm, Session},
        ports::{Backend, PolygonSource},
        visibility,
    },
};

impl<B, P> DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    async fn upload_document(
        &self,
        session: &Session,
        file: Option<&FileUpload>,
    ) -> Result<Option<String>> {
        match file {
            Some(file) => self
                .upload_file(session, buckets::PROPERTY_DOCUMENTS, None, file, None)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, fields(user_id = %session.user_id()), err)]
    pub(super) async fn list_properties_impl(
        &self,
        session: &Session,
    ) -> Result<Vec<PropertySummary>> {
        let visible = self.visible_districts(session).await?;
        let scope = visibility::property_scope(&session.profile, &visible);
        if scope == DistrictScope::Only(vec![]) {
            return Ok(vec![]);
        }

        let rows = self
            .backend
            .list_properties(session.access_token(), &scope)
            .await
            .map_err(DashboardError::fetch)?;
        Ok(rows.into_iter().map(PropertySummary::from).collect())
    }

    /// Uploads the documents, inserts the root and then every satellite present
    /// on the form. A failing satellite stops the flow; whatever was written
    /// before it stays.
    #[tracing::instrument(skip_all, fields(user_id = %session.user_id()), err)]
    pub(super) async fn create_property_impl(
        &self,
        session: &Session,
        form: PropertyForm,
    ) -> Result<PropertyId> {
        let profile = &session.profile;
        if !profile.role.can_create_properties() {
            return Err(DashboardError::PermissionDenied(
                "this role may not create properties".to_string(),
            ));
        }

        if let Some(distrito_id) = form.property.root.distrito_id
            && !profile.role.sees_all_districts()
        {
            let visible = self.visible_districts(session).await?;
            if !visible.iter().any(|d| d.id == distrito_id) {
                return Err(DashboardError::PermissionDenied(format!(
                    "district {distrito_id} is not assigned to this user"
                )));
            }
        }

        let PropertyForm {
            mut property,
            adjunto_compraventa,
            copia_publicacion,
            foto_fachada,
        } = form;

        if let Some(url) = self.upload_document(session, adjunto_compraventa.as_ref()).await? {
            property.cbr.get_or_insert_with(Default::default).adjunto_compraventa_url = Some(url);
        }
        if let Some(url) = self.upload_document(session, copia_publicacion.as_ref()).await? {
            property
                .portal
                .get_or_insert_with(Default::default)
                .copia_publicacion_pdf_url = Some(url);
        }
        if let Some(url) = self.upload_document(session, foto_fachada.as_ref()).await? {
            property
                .backoffice
                .get_or_insert_with(Default::default)
                .foto_fachada_url = Some(url);
        }

        let property_id = self
            .backend
            .insert_property_root(session.access_token(), &property.root)
            .await
            .map_err(DashboardError::remote_write)?;
        tracing::info!(property_id, "property root created");

        for satellite in property.satellites() {
            self.backend
                .insert_satellite(session.access_token(), property_id, &satellite)
                .await
                .map_err(|source| DashboardError::PartialWrite {
                    property_id,
                    satellite: satellite.kind(),
                    source,
                })?;
        }

        Ok(property_id)
    }
}
