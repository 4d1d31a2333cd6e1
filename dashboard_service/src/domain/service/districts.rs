use models_distrito::{District, DistrictId, IsochroneBand, PolygonUrls};

use super::{DashboardServiceImpl, require_super_admin};
use crate::{
    constants::{GEOJSON_CONTENT_TYPE, buckets},
    domain::{
        error::{DashboardError, Result},
        models::{DistrictForm, DistrictRecord, Session},
        ports::{Backend, PolygonSource},
    },
};

impl<B, P> DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    /// Uploads the form's files. Files default to the urls of `current`; bands
    /// that are not enabled end up without a url.
    async fn district_record(
        &self,
        session: &Session,
        form: DistrictForm,
        current: Option<&District>,
    ) -> Result<DistrictRecord> {
        form.fields.validate().map_err(DashboardError::Validation)?;

        let foto_url = match &form.foto {
            Some(foto) => Some(
                self.upload_file(session, buckets::DISTRICT_MEDIA, None, foto, None)
                    .await?,
            ),
            None => current.and_then(|d| d.foto_url.clone()),
        };

        let mut poligonos = PolygonUrls::default();
        for band in IsochroneBand::ALL {
            if !form.fields.band_enabled(band) {
                if form.poligonos.contains_key(&band) {
                    tracing::debug!(minutes = band.minutes(), "ignoring polygon of a disabled band");
                }
                continue;
            }
            let url = match form.poligonos.get(&band) {
                Some(file) => Some(
                    self.upload_file(
                        session,
                        buckets::DISTRICT_MEDIA,
                        Some(band),
                        file,
                        Some(GEOJSON_CONTENT_TYPE),
                    )
                    .await?,
                ),
                None => current.and_then(|d| d.poligonos.get(band).map(str::to_string)),
            };
            poligonos.set(band, url);
        }

        Ok(DistrictRecord {
            fields: form.fields,
            foto_url,
            poligonos,
        })
    }

    #[tracing::instrument(skip_all, fields(user_id = %session.user_id(), nombre = %form.fields.nombre), err)]
    pub(super) async fn create_district_impl(
        &self,
        session: &Session,
        form: DistrictForm,
    ) -> Result<()> {
        require_super_admin(session, "create districts")?;
        let record = self.district_record(session, form, None).await?;
        self.backend
            .create_district(session.access_token(), &record)
            .await
            .map_err(DashboardError::remote_write)
    }

    #[tracing::instrument(skip(self, session, form), fields(user_id = %session.user_id()), err)]
    pub(super) async fn update_district_impl(
        &self,
        session: &Session,
        id: DistrictId,
        form: DistrictForm,
    ) -> Result<()> {
        if !session.profile.role.can_edit_districts() {
            return Err(DashboardError::PermissionDenied(
                "this role may not edit districts".to_string(),
            ));
        }

        let visible = self.visible_districts(session).await?;
        let current = visible
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DashboardError::NotFound(format!("district {id} not found")))?;

        let record = self.district_record(session, form, Some(current)).await?;
        self.backend
            .update_district(session.access_token(), id, &record)
            .await
            .map_err(DashboardError::remote_write)
    }

    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id()), err)]
    pub(super) async fn delete_district_impl(&self, session: &Session, id: DistrictId) -> Result<()> {
        require_super_admin(session, "delete districts")?;
        self.backend
            .delete_district(session.access_token(), id)
            .await
            .map_err(DashboardError::remote_write)
    }
}
