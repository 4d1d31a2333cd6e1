//! Multipart bodies of the district and property forms. Both carry a `data`
//! part with the json fields plus optional file parts.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use models_distrito::{IsochroneBand, property::NewProperty};
use serde::de::DeserializeOwned;

use crate::domain::{
    error::{DashboardError, Result},
    models::{DistrictFields, DistrictForm, FileUpload, PropertyForm},
};

const DATA_PART: &str = "data";
const FOTO_PART: &str = "foto";
const ADJUNTO_COMPRAVENTA_PART: &str = "adjunto_compraventa";
const COPIA_PUBLICACION_PART: &str = "copia_publicacion";
const FOTO_FACHADA_PART: &str = "foto_fachada";

fn polygon_part(band: IsochroneBand) -> String {
    format!("poligono_{}", band.minutes())
}

/// The parts of a multipart body keyed by field name
#[derive(Debug, Default)]
pub struct FormParts {
    data: Option<Bytes>,
    files: HashMap<String, FileUpload>,
}

impl FormParts {
    /// Reads every part of `multipart`. Empty file parts are dropped.
    #[tracing::instrument(err, skip(multipart))]
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut parts = FormParts::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(invalid_body)?;

            if name == DATA_PART {
                parts.data = Some(bytes);
                continue;
            }

            parts.insert_file(
                name,
                FileUpload {
                    file_name: file_name.unwrap_or_default(),
                    content_type,
                    bytes,
                },
            );
        }
        Ok(parts)
    }

    fn insert_file(&mut self, name: String, file: FileUpload) {
        if !file.bytes.is_empty() {
            self.files.insert(name, file);
        }
    }

    fn data<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| DashboardError::Validation("missing data part".to_string()))?;
        serde_json::from_slice(data)
            .map_err(|e| DashboardError::Validation(format!("invalid data part: {e}")))
    }

    fn take_file(&mut self, name: &str) -> Option<FileUpload> {
        self.files.remove(name)
    }

    pub fn into_district_form(mut self) -> Result<DistrictForm> {
        let fields: DistrictFields = self.data()?;
        let foto = self.take_file(FOTO_PART);
        let poligonos = IsochroneBand::ALL
            .into_iter()
            .filter_map(|band| self.take_file(&polygon_part(band)).map(|file| (band, file)))
            .collect();

        Ok(DistrictForm {
            fields,
            foto,
            poligonos,
        })
    }

    pub fn into_property_form(mut self) -> Result<PropertyForm> {
        let property: NewProperty = self.data()?;
        Ok(PropertyForm {
            property,
            adjunto_compraventa: self.take_file(ADJUNTO_COMPRAVENTA_PART),
            copia_publicacion: self.take_file(COPIA_PUBLICACION_PART),
            foto_fachada: self.take_file(FOTO_FACHADA_PART),
        })
    }
}

fn invalid_body(err: axum::extract::multipart::MultipartError) -> DashboardError {
    DashboardError::Validation(format!("invalid multipart body: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;

    fn file(name: &str, body: &'static [u8]) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            content_type: Some("application/json".to_string()),
            bytes: Bytes::from_static(body),
        }
    }

    fn parts(data: &str) -> FormParts {
        FormParts {
            data: Some(Bytes::copy_from_slice(data.as_bytes())),
            files: HashMap::new(),
        }
    }

    #[test]
    fn it_should_build_a_district_form() {
        let mut parts = parts(
            r#"{"nombre":"Providencia Norte","comuna":"Providencia","lat":-33.42,"lon":-70.61,"isocronas_config":["5 min","20 min"]}"#,
        );
        parts.insert_file("foto".to_string(), file("fachada.jpg", b"jpeg"));
        parts.insert_file("poligono_5".to_string(), file("cinco.geojson", b"{}"));
        parts.insert_file("poligono_20".to_string(), file("veinte.geojson", b"{}"));
        parts.insert_file("poligono_10".to_string(), file("vacio.geojson", b""));

        let form = parts.into_district_form().unwrap();
        assert_eq!(form.fields.nombre, "Providencia Norte");
        assert_eq!(form.fields.direccion, "");
        assert_eq!(form.foto.unwrap().file_name, "fachada.jpg");
        assert_eq!(
            form.poligonos.keys().copied().collect::<Vec<_>>(),
            vec![IsochroneBand::Min5, IsochroneBand::Min20]
        );
    }

    #[test]
    fn it_should_reject_a_form_without_data() {
        let parts = FormParts::default();
        assert_matches!(
            parts.into_district_form(),
            Err(DashboardError::Validation(message)) => {
                assert_eq!(message, "missing data part");
            }
        );
    }

    #[test]
    fn it_should_reject_malformed_data() {
        assert_matches!(
            parts(r#"{"nombre": 5}"#).into_district_form(),
            Err(DashboardError::Validation(_))
        );
    }

    #[test]
    fn it_should_build_a_property_form() {
        let mut parts = parts(
            r#"{"direccion":"Av. Italia 1200","distrito_id":3,"lat":-33.45,"lon":-70.62,"portal":{"precio_publicacion":5400.0}}"#,
        );
        parts.insert_file(
            "adjunto_compraventa".to_string(),
            file("escritura.pdf", b"%PDF"),
        );

        let form = parts.into_property_form().unwrap();
        assert_eq!(form.property.root.direccion.as_deref(), Some("Av. Italia 1200"));
        assert_eq!(form.property.root.distrito_id, Some(3));
        assert!(form.property.portal.is_some());
        assert!(form.property.sii.is_none());
        assert_eq!(form.adjunto_compraventa.unwrap().extension(), "pdf");
        assert!(form.copia_publicacion.is_none());
        assert!(form.foto_fachada.is_none());
    }
}
