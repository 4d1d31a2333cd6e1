use models_distrito::IsochroneBand;
use uuid::Uuid;

use super::DashboardServiceImpl;
use crate::{
    constants::FALLBACK_CONTENT_TYPE,
    domain::{
        error::{DashboardError, Result},
        models::{FileUpload, Session},
        ports::{Backend, PolygonSource},
    },
};

/// `{user_id}/{uuid}.{ext}`, or `{user_id}/{uuid}_{k}min.{ext}` for polygons
pub(crate) fn object_name(user_id: Uuid, band: Option<IsochroneBand>, extension: &str) -> String {
    let id = Uuid::new_v4();
    match band {
        Some(band) => format!("{user_id}/{id}_{}min.{extension}", band.minutes()),
        None => format!("{user_id}/{id}.{extension}"),
    }
}

impl<B, P> DashboardServiceImpl<B, P>
where
    B: Backend,
    P: PolygonSource,
{
    /// Uploads `file` under a fresh name and returns its public url.
    /// `content_type` overrides the one the client sent.
    #[tracing::instrument(skip(self, session, file), fields(file_name = %file.file_name), err)]
    pub(super) async fn upload_file(
        &self,
        session: &Session,
        bucket: &str,
        band: Option<IsochroneBand>,
        file: &FileUpload,
        content_type: Option<&str>,
    ) -> Result<String> {
        let path = object_name(session.user_id(), band, file.extension());
        let content_type = content_type
            .or(file.content_type.as_deref())
            .unwrap_or(FALLBACK_CONTENT_TYPE);

        self.backend
            .upload(
                session.access_token(),
                bucket,
                &path,
                file.bytes.clone(),
                content_type,
            )
            .await
            .map_err(|e| {
                DashboardError::remote_write(e.context(format!("unable to upload {}", file.file_name)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_names_objects_under_the_user() {
        let user_id = Uuid::parse_str("6f1c1d39-2b52-4f0e-9a51-4cfa8d8f64e3").unwrap();

        let photo = object_name(user_id, None, "jpg");
        let (prefix, rest) = photo.split_once('/').unwrap();
        assert_eq!(prefix, user_id.to_string());
        let stem = rest.strip_suffix(".jpg").unwrap();
        assert!(Uuid::parse_str(stem).is_ok());

        let polygon = object_name(user_id, Some(IsochroneBand::Min15), "geojson");
        assert!(polygon.ends_with("_15min.geojson"));
        assert_ne!(object_name(user_id, None, "jpg"), photo);
    }
}
