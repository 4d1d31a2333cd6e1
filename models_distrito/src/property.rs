//! The property root record, its five satellite records and the read models
//! derived from joined queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use utoipa::ToSchema;

use crate::{district::DistrictId, embedded::Embedded};

pub type PropertyId = i64;

/// Row of the `propiedades` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PropertyRoot {
    pub id: PropertyId,
    pub distrito_id: Option<DistrictId>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub comuna: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Insert body for `propiedades`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewPropertyRoot {
    pub distrito_id: Option<DistrictId>,
    pub direccion: Option<String>,
    pub comuna: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Cadastral data from the tax registry (SII).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SiiRecord {
    pub rol_sii: Option<String>,
    pub detalle_direccion: Option<String>,
    pub sup_sii: Option<f64>,
    pub sup_terreno_sii: Option<f64>,
    pub contribuciones: Option<f64>,
    pub piso_sii: Option<i32>,
    pub ano_construccion: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Moneda {
    Pesos,
    #[serde(rename = "UF")]
    Uf,
}

/// One owner as recorded in the title registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Propietario {
    pub nombre: String,
    pub rut: String,
}

/// Title and ownership history from the real estate registry (CBR).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CbrRecord {
    pub inscripcion_fna: Option<String>,
    pub fecha_ultima_compraventa: Option<NaiveDate>,
    pub moneda_transaccion: Option<Moneda>,
    pub precio_compra: Option<f64>,
    pub tipo_compraventa: Option<String>,
    #[serde(default)]
    pub propietarios: Vec<Propietario>,
    pub adjunto_compraventa_url: Option<String>,
}

/// Historic listing on the public portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PortalRecord {
    pub link_portal_inmobiliario: Option<String>,
    pub copia_publicacion_pdf_url: Option<String>,
    pub descripcion_publicacion: Option<String>,
    pub corredor: Option<String>,
    pub precio_publicacion: Option<f64>,
    pub fecha_publicacion: Option<NaiveDate>,
    pub superficie_util: Option<f64>,
    pub superficie_total: Option<f64>,
    pub tipologia: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
pub enum TipoPropiedad {
    Casa,
    Departamento,
    Terreno,
    Oficina,
}

/// Internal operational metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackofficeRecord {
    pub foto_fachada_url: Option<String>,
    pub distancia_distrito: Option<f64>,
    pub tiempo_caminando: Option<f64>,
    pub tipo_propiedad: Option<TipoPropiedad>,
    pub num_estacionamientos: Option<i32>,
    pub pisos: Option<i32>,
    pub tiene_jardin: Option<bool>,
    pub material_piso: Option<String>,
    pub tiene_piscina: Option<bool>,
}

/// Acquisition pricing for properties sold by the franchise itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaptacionRecord {
    pub descripcion_captacion: Option<String>,
    pub precio_sugerido: Option<f64>,
    pub precio_publicacion_captacion: Option<f64>,
    pub sup_interior: Option<f64>,
    pub sup_terraza: Option<f64>,
    pub sup_total_captacion: Option<f64>,
    pub sup_jardin: Option<f64>,
}

/// Names each satellite table. The order of [SatelliteKind::iter] is the order
/// satellites are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum SatelliteKind {
    Sii,
    Cbr,
    Portal,
    Backoffice,
    Captacion,
}

impl SatelliteKind {
    pub fn table(&self) -> &'static str {
        match self {
            SatelliteKind::Sii => "propiedades_sii",
            SatelliteKind::Cbr => "propiedades_cbr",
            SatelliteKind::Portal => "propiedades_portal",
            SatelliteKind::Backoffice => "propiedades_backoffice",
            SatelliteKind::Captacion => "propiedades_captacion",
        }
    }
}

impl std::fmt::Display for SatelliteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// A satellite record ready to be written for one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Satellite {
    Sii(SiiRecord),
    Cbr(CbrRecord),
    Portal(PortalRecord),
    Backoffice(BackofficeRecord),
    Captacion(CaptacionRecord),
}

impl Satellite {
    pub fn kind(&self) -> SatelliteKind {
        match self {
            Satellite::Sii(_) => SatelliteKind::Sii,
            Satellite::Cbr(_) => SatelliteKind::Cbr,
            Satellite::Portal(_) => SatelliteKind::Portal,
            Satellite::Backoffice(_) => SatelliteKind::Backoffice,
            Satellite::Captacion(_) => SatelliteKind::Captacion,
        }
    }
}

/// Insert body for a satellite table: the record plus its foreign key.
#[derive(Debug, Serialize)]
pub struct SatelliteRow<'a> {
    pub propiedad_id: PropertyId,
    #[serde(flatten)]
    pub record: &'a Satellite,
}

/// Everything the creation form collects. Satellites left as `None` are not written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewProperty {
    #[serde(flatten)]
    pub root: NewPropertyRoot,
    #[serde(default)]
    pub sii: Option<SiiRecord>,
    #[serde(default)]
    pub cbr: Option<CbrRecord>,
    #[serde(default)]
    pub portal: Option<PortalRecord>,
    #[serde(default)]
    pub backoffice: Option<BackofficeRecord>,
    #[serde(default)]
    pub captacion: Option<CaptacionRecord>,
}

impl NewProperty {
    /// The satellites present on the form, in write order
    pub fn satellites(&self) -> Vec<Satellite> {
        [
            self.sii.clone().map(Satellite::Sii),
            self.cbr.clone().map(Satellite::Cbr),
            self.portal.clone().map(Satellite::Portal),
            self.backoffice.clone().map(Satellite::Backoffice),
            self.captacion.clone().map(Satellite::Captacion),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistrictName {
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortalPrice {
    pub precio_publicacion: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackofficeType {
    pub tipo_propiedad: Option<String>,
}

/// A property root with the joins needed by the listing and the map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyWithJoins {
    #[serde(flatten)]
    pub root: PropertyRoot,
    #[serde(default)]
    pub distritos: Embedded<DistrictName>,
    #[serde(default)]
    pub propiedades_portal: Embedded<PortalPrice>,
    #[serde(default)]
    pub propiedades_backoffice: Embedded<BackofficeType>,
}

impl PropertyWithJoins {
    pub fn precio_publicacion(&self) -> Option<f64> {
        self.propiedades_portal
            .as_ref()
            .and_then(|portal| portal.precio_publicacion)
    }

    pub fn tipo_propiedad(&self) -> Option<&str> {
        self.propiedades_backoffice
            .as_ref()
            .and_then(|bo| bo.tipo_propiedad.as_deref())
    }
}

/// Label used when a property has no district.
pub const UNASSIGNED_DISTRICT: &str = "Sin Asignar";

/// One line of the property inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub direccion: Option<String>,
    pub comuna: Option<String>,
    pub distrito: String,
    pub precio_publicacion: Option<f64>,
    pub tipo_propiedad: Option<String>,
}

impl From<PropertyWithJoins> for PropertySummary {
    fn from(row: PropertyWithJoins) -> Self {
        let precio_publicacion = row.precio_publicacion();
        let tipo_propiedad = row.tipo_propiedad().map(str::to_string);
        PropertySummary {
            id: row.root.id,
            direccion: row.root.direccion,
            comuna: row.root.comuna,
            distrito: row
                .distritos
                .into_option()
                .map(|d| d.nombre)
                .unwrap_or_else(|| UNASSIGNED_DISTRICT.to_string()),
            precio_publicacion,
            tipo_propiedad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn it_summarizes_joined_rows() {
        let row: PropertyWithJoins = serde_json::from_value(json!({
            "id": 11,
            "distrito_id": 3,
            "direccion": "Los Leones 220",
            "comuna": "Providencia",
            "lat": -33.42,
            "lon": -70.60,
            "distritos": { "nombre": "Providencia Norte" },
            "propiedades_portal": [{ "precio_publicacion": 8900.0 }],
            "propiedades_backoffice": { "tipo_propiedad": "Departamento" },
        }))
        .unwrap();

        let summary = PropertySummary::from(row);
        assert_eq!(summary.distrito, "Providencia Norte");
        assert_eq!(summary.precio_publicacion, Some(8900.0));
        assert_eq!(summary.tipo_propiedad.as_deref(), Some("Departamento"));
    }

    #[test]
    fn it_marks_properties_without_district() {
        let row: PropertyWithJoins = serde_json::from_value(json!({
            "id": 12,
            "distrito_id": null,
            "distritos": null,
            "propiedades_portal": [],
        }))
        .unwrap();

        let summary = PropertySummary::from(row);
        assert_eq!(summary.distrito, UNASSIGNED_DISTRICT);
        assert_eq!(summary.precio_publicacion, None);
        assert_eq!(summary.tipo_propiedad, None);
    }

    #[test]
    fn it_writes_satellites_with_their_foreign_key() {
        let satellite = Satellite::Backoffice(BackofficeRecord {
            tipo_propiedad: Some(TipoPropiedad::Casa),
            tiene_jardin: Some(true),
            ..Default::default()
        });
        let body = serde_json::to_value(SatelliteRow {
            propiedad_id: 42,
            record: &satellite,
        })
        .unwrap();

        assert_eq!(body["propiedad_id"], json!(42));
        assert_eq!(body["tipo_propiedad"], json!("Casa"));
        assert_eq!(body["tiene_jardin"], json!(true));
        assert_eq!(satellite.kind().table(), "propiedades_backoffice");
    }

    #[test]
    fn it_orders_satellites_for_writing() {
        let form = NewProperty {
            captacion: Some(CaptacionRecord::default()),
            sii: Some(SiiRecord::default()),
            portal: Some(PortalRecord::default()),
            ..Default::default()
        };
        let kinds: Vec<_> = form.satellites().iter().map(Satellite::kind).collect();
        assert_eq!(
            kinds,
            vec![SatelliteKind::Sii, SatelliteKind::Portal, SatelliteKind::Captacion]
        );
        assert_eq!(SatelliteKind::iter().count(), 5);
    }
}
