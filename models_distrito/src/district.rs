//! Districts and their isochrone bands.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type DistrictId = i64;

/// Every label the isochrone selector offers, in display order.
pub const ISOCHRONE_LABELS: [&str; 6] = ["5 min", "10 min", "15 min", "20 min", "25 min", "30 min"];

/// A time band that can carry an uploaded polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum IsochroneBand {
    #[serde(rename = "5")]
    Min5,
    #[serde(rename = "10")]
    Min10,
    #[serde(rename = "15")]
    Min15,
    #[serde(rename = "20")]
    Min20,
}

impl IsochroneBand {
    pub const ALL: [IsochroneBand; 4] = [
        IsochroneBand::Min5,
        IsochroneBand::Min10,
        IsochroneBand::Min15,
        IsochroneBand::Min20,
    ];

    pub fn minutes(&self) -> u8 {
        match self {
            IsochroneBand::Min5 => 5,
            IsochroneBand::Min10 => 10,
            IsochroneBand::Min15 => 15,
            IsochroneBand::Min20 => 20,
        }
    }

    /// The isochrone label that enables this band, e.g. `"5 min"`
    pub fn label(&self) -> &'static str {
        match self {
            IsochroneBand::Min5 => ISOCHRONE_LABELS[0],
            IsochroneBand::Min10 => ISOCHRONE_LABELS[1],
            IsochroneBand::Min15 => ISOCHRONE_LABELS[2],
            IsochroneBand::Min20 => ISOCHRONE_LABELS[3],
        }
    }
}

/// Public URLs of the uploaded polygon documents, one per band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolygonUrls {
    #[serde(default, rename = "poligono_url_5")]
    pub min_5: Option<String>,
    #[serde(default, rename = "poligono_url_10")]
    pub min_10: Option<String>,
    #[serde(default, rename = "poligono_url_15")]
    pub min_15: Option<String>,
    #[serde(default, rename = "poligono_url_20")]
    pub min_20: Option<String>,
}

impl PolygonUrls {
    pub fn get(&self, band: IsochroneBand) -> Option<&str> {
        match band {
            IsochroneBand::Min5 => self.min_5.as_deref(),
            IsochroneBand::Min10 => self.min_10.as_deref(),
            IsochroneBand::Min15 => self.min_15.as_deref(),
            IsochroneBand::Min20 => self.min_20.as_deref(),
        }
    }

    pub fn set(&mut self, band: IsochroneBand, url: Option<String>) {
        let slot = match band {
            IsochroneBand::Min5 => &mut self.min_5,
            IsochroneBand::Min10 => &mut self.min_10,
            IsochroneBand::Min15 => &mut self.min_15,
            IsochroneBand::Min20 => &mut self.min_20,
        };
        *slot = url;
    }
}

/// Row of the `distritos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct District {
    pub id: DistrictId,
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub comuna: String,
    #[serde(default)]
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, deserialize_with = "labels_or_empty")]
    pub isocronas_config: Vec<String>,
    #[serde(default)]
    pub foto_url: Option<String>,
    #[serde(flatten)]
    pub poligonos: PolygonUrls,
}

impl District {
    pub fn band_enabled(&self, band: IsochroneBand) -> bool {
        self.isocronas_config.iter().any(|label| label == band.label())
    }
}

/// `(id, nombre)` pair used by selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DistrictOption {
    pub id: DistrictId,
    pub nombre: String,
}

fn labels_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_reads_district_rows() {
        let district: District = serde_json::from_value(json!({
            "id": 3,
            "nombre": "Providencia Norte",
            "direccion": "Av. Providencia 1234",
            "comuna": "Providencia",
            "region": "Metropolitana",
            "lat": -33.4263,
            "lon": -70.6170,
            "isocronas_config": ["5 min", "15 min"],
            "foto_url": null,
            "poligono_url_5": "https://cdn.example/5.json",
            "poligono_url_10": null,
            "poligono_url_15": "https://cdn.example/15.json",
            "poligono_url_20": null,
            "created_at": "2025-03-01T12:00:00Z",
        }))
        .unwrap();

        assert!(district.band_enabled(IsochroneBand::Min5));
        assert!(!district.band_enabled(IsochroneBand::Min10));
        assert_eq!(
            district.poligonos.get(IsochroneBand::Min15),
            Some("https://cdn.example/15.json")
        );
        assert_eq!(district.poligonos.get(IsochroneBand::Min20), None);
    }

    #[test]
    fn it_treats_null_isochrones_as_empty() {
        let district: District = serde_json::from_value(json!({
            "id": 1,
            "nombre": "Centro",
            "lat": 0.0,
            "lon": 0.0,
            "isocronas_config": null,
        }))
        .unwrap();
        assert!(district.isocronas_config.is_empty());
        assert_eq!(district.poligonos, PolygonUrls::default());
    }

    #[test]
    fn it_maps_bands_to_labels() {
        assert_eq!(IsochroneBand::Min20.label(), "20 min");
        assert_eq!(IsochroneBand::Min10.minutes(), 10);
    }
}
