//! Pure derivation of the district map from district rows, property rows and the
//! polygon documents that could be fetched.

use std::collections::BTreeMap;

use models_distrito::{District, DistrictId, IsochroneBand, property::PropertyWithJoins};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::constants::map::{
    DEFAULT_CENTER, DISTRICTS_ZOOM, EMPTY_ZOOM, HYBRID_TILES, POLYGON_FILL_OPACITY, POLYGON_WEIGHT,
    STREETS_TILES,
};

const DEFAULT_PROPERTY_TYPE: &str = "Propiedad";
const MISSING_ADDRESS: &str = "Sin dirección";

/// Bands are drawn largest first so the smaller ones stay on top
pub const RENDER_ORDER: [IsochroneBand; 4] = [
    IsochroneBand::Min20,
    IsochroneBand::Min15,
    IsochroneBand::Min10,
    IsochroneBand::Min5,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TileLayer {
    pub name: String,
    pub tiles: String,
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarkerIcon {
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Marker {
    pub position: LatLon,
    pub tooltip: String,
    /// html fragment shown when the marker is clicked
    pub popup: String,
    pub icon: MarkerIcon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolygonStyle {
    pub color: String,
    pub fill_color: String,
    pub weight: u8,
    pub fill_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolygonOverlay {
    pub district_id: DistrictId,
    pub band: IsochroneBand,
    /// layer name, e.g. `Providencia (15m)`
    pub name: String,
    pub style: PolygonStyle,
    /// GeoJSON without Point features
    #[schema(value_type = Object)]
    pub geojson: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DistrictTableRow {
    pub nombre: String,
    pub comuna: String,
    pub region: String,
}

/// Everything a client needs to draw the district map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub tile_layers: Vec<TileLayer>,
    pub district_markers: Vec<Marker>,
    pub polygons: Vec<PolygonOverlay>,
    pub property_markers: Vec<Marker>,
    pub districts: Vec<DistrictTableRow>,
}

/// Fetched polygon documents keyed by district and band
pub type PolygonDocuments = BTreeMap<(DistrictId, IsochroneBand), Value>;

pub fn band_color(band: IsochroneBand) -> &'static str {
    match band {
        IsochroneBand::Min5 => "#4CAF50",
        IsochroneBand::Min10 => "#FFC107",
        IsochroneBand::Min15 => "#FF9800",
        IsochroneBand::Min20 => "#F44336",
    }
}

/// Polygon documents worth fetching: the band is enabled and has a url. In
/// render order.
pub fn polygon_requests(districts: &[District]) -> Vec<(DistrictId, IsochroneBand, &str)> {
    districts
        .iter()
        .flat_map(|district| {
            RENDER_ORDER.into_iter().filter_map(move |band| {
                let url = district.poligonos.get(band)?;
                district
                    .band_enabled(band)
                    .then_some((district.id, band, url))
            })
        })
        .collect()
}

/// Drops every feature whose geometry is a Point, i.e. the isochrone origin
pub fn strip_point_features(mut document: Value) -> Value {
    if let Some(features) = document.get_mut("features").and_then(Value::as_array_mut) {
        features.retain(|feature| {
            feature
                .get("geometry")
                .and_then(|g| g.get("type"))
                .and_then(Value::as_str)
                != Some("Point")
        });
    }
    document
}

/// `UF 12,345`, halves round to the even integer
pub fn format_uf(value: f64) -> String {
    let rounded = value.round_ties_even() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("UF {sign}{grouped}")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn tile_layers() -> Vec<TileLayer> {
    vec![
        TileLayer {
            name: "Calles".to_string(),
            tiles: STREETS_TILES.to_string(),
            attribution: None,
        },
        TileLayer {
            name: "Híbrido".to_string(),
            tiles: HYBRID_TILES.to_string(),
            attribution: Some("Google".to_string()),
        },
    ]
}

fn district_marker(district: &District) -> Marker {
    let mut popup = format!(
        "<b>{}</b><br><small>{}</small>",
        escape_html(&district.nombre),
        escape_html(&district.direccion)
    );
    if let Some(foto) = non_empty(district.foto_url.as_deref()) {
        popup.push_str(&format!(
            "<br><img src='{}' style='width:100%'>",
            escape_html(foto)
        ));
    }
    Marker {
        position: LatLon {
            lat: district.lat,
            lon: district.lon,
        },
        tooltip: district.nombre.clone(),
        popup,
        icon: MarkerIcon {
            color: "purple".to_string(),
            icon: "info-sign".to_string(),
        },
    }
}

fn property_marker(property: &PropertyWithJoins) -> Option<Marker> {
    let lat = property.root.lat.filter(|v| *v != 0.0)?;
    let lon = property.root.lon.filter(|v| *v != 0.0)?;

    let tipo = non_empty(property.tipo_propiedad()).unwrap_or(DEFAULT_PROPERTY_TYPE);
    let direccion = non_empty(property.root.direccion.as_deref()).unwrap_or(MISSING_ADDRESS);
    let mut popup = format!("<b>{}</b><br>{}", escape_html(tipo), escape_html(direccion));
    if let Some(precio) = property.precio_publicacion().filter(|p| *p != 0.0) {
        popup.push_str("<br>");
        popup.push_str(&format_uf(precio));
    }

    Some(Marker {
        position: LatLon { lat, lon },
        tooltip: tipo.to_string(),
        popup,
        icon: MarkerIcon {
            color: "blue".to_string(),
            icon: "home".to_string(),
        },
    })
}

fn overlay(district: &District, band: IsochroneBand, document: &Value) -> PolygonOverlay {
    let color = band_color(band).to_string();
    PolygonOverlay {
        district_id: district.id,
        band,
        name: format!("{} ({}m)", district.nombre, band.minutes()),
        style: PolygonStyle {
            color: color.clone(),
            fill_color: color,
            weight: POLYGON_WEIGHT,
            fill_opacity: POLYGON_FILL_OPACITY,
        },
        geojson: strip_point_features(document.clone()),
    }
}

/// Builds the map for the given visible districts. Polygons missing from
/// `documents` are left out.
pub fn render_map(
    districts: &[District],
    documents: &PolygonDocuments,
    properties: &[PropertyWithJoins],
) -> MapView {
    if districts.is_empty() {
        return MapView {
            center: LatLon {
                lat: DEFAULT_CENTER.0,
                lon: DEFAULT_CENTER.1,
            },
            zoom: EMPTY_ZOOM,
            tile_layers: tile_layers(),
            district_markers: vec![],
            polygons: vec![],
            property_markers: vec![],
            districts: vec![],
        };
    }

    let count = districts.len() as f64;
    let center = LatLon {
        lat: districts.iter().map(|d| d.lat).sum::<f64>() / count,
        lon: districts.iter().map(|d| d.lon).sum::<f64>() / count,
    };

    let polygons = districts
        .iter()
        .flat_map(|district| {
            RENDER_ORDER.into_iter().filter_map(move |band| {
                if !district.band_enabled(band) || district.poligonos.get(band).is_none() {
                    return None;
                }
                documents
                    .get(&(district.id, band))
                    .map(|document| overlay(district, band, document))
            })
        })
        .collect();

    MapView {
        center,
        zoom: DISTRICTS_ZOOM,
        tile_layers: tile_layers(),
        district_markers: districts.iter().map(district_marker).collect(),
        polygons,
        property_markers: properties.iter().filter_map(property_marker).collect(),
        districts: districts
            .iter()
            .map(|d| DistrictTableRow {
                nombre: d.nombre.clone(),
                comuna: d.comuna.clone(),
                region: d.region.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models_distrito::PolygonUrls;
    use serde_json::json;

    fn district(id: DistrictId, labels: &[&str], urls: PolygonUrls) -> District {
        District {
            id,
            nombre: format!("Distrito {id}"),
            direccion: "Av. Siempre Viva 742".to_string(),
            comuna: "Providencia".to_string(),
            region: "Metropolitana".to_string(),
            lat: -33.0 - id as f64,
            lon: -70.0,
            isocronas_config: labels.iter().map(|l| l.to_string()).collect(),
            foto_url: None,
            poligonos: urls,
        }
    }

    fn all_urls() -> PolygonUrls {
        PolygonUrls {
            min_5: Some("https://cdn.example/5.json".to_string()),
            min_10: Some("https://cdn.example/10.json".to_string()),
            min_15: Some("https://cdn.example/15.json".to_string()),
            min_20: Some("https://cdn.example/20.json".to_string()),
        }
    }

    fn isochrone() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-70.6, -33.4] } },
                { "type": "Feature", "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } },
                { "type": "Feature", "geometry": { "type": "MultiPolygon", "coordinates": [] } },
            ]
        })
    }

    fn property(value: Value) -> PropertyWithJoins {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn it_centers_on_santiago_without_districts() {
        let view = render_map(&[], &PolygonDocuments::new(), &[]);
        assert_eq!(view.center, LatLon { lat: -33.4372, lon: -70.6342 });
        assert_eq!(view.zoom, 11);
        assert_eq!(view.tile_layers.len(), 2);
        assert!(view.district_markers.is_empty());
    }

    #[test]
    fn it_centers_on_the_mean_of_the_districts() {
        let districts = vec![
            district(1, &[], PolygonUrls::default()),
            district(3, &[], PolygonUrls::default()),
        ];
        let view = render_map(&districts, &PolygonDocuments::new(), &[]);
        assert_eq!(view.center, LatLon { lat: -35.0, lon: -70.0 });
        assert_eq!(view.zoom, 12);
        assert_eq!(view.district_markers.len(), 2);
        assert_eq!(view.districts[0].comuna, "Providencia");
        assert_eq!(view.tile_layers[0].name, "Calles");
        assert_eq!(view.tile_layers[1].name, "Híbrido");
    }

    #[test]
    fn it_only_requests_enabled_bands_with_urls() {
        let districts = vec![
            district(1, &["5 min", "20 min", "30 min"], all_urls()),
            district(
                2,
                &["10 min"],
                PolygonUrls {
                    min_5: Some("https://cdn.example/other.json".to_string()),
                    ..Default::default()
                },
            ),
        ];
        let requests = polygon_requests(&districts);
        assert_eq!(
            requests,
            vec![
                (1, IsochroneBand::Min20, "https://cdn.example/20.json"),
                (1, IsochroneBand::Min5, "https://cdn.example/5.json"),
            ]
        );
    }

    #[test]
    fn it_removes_every_point_feature() {
        let districts = vec![district(1, &["5 min", "10 min", "15 min", "20 min"], all_urls())];
        let documents: PolygonDocuments = IsochroneBand::ALL
            .into_iter()
            .map(|band| ((1, band), isochrone()))
            .collect();

        let view = render_map(&districts, &documents, &[]);
        assert_eq!(view.polygons.len(), 4);
        for overlay in &view.polygons {
            let features = overlay.geojson["features"].as_array().unwrap();
            assert_eq!(features.len(), 2);
            assert!(features.iter().all(|f| f["geometry"]["type"] != "Point"));
        }
    }

    #[test]
    fn it_draws_bands_largest_first_with_their_colors() {
        let districts = vec![district(1, &["5 min", "15 min", "20 min"], all_urls())];
        let documents: PolygonDocuments = IsochroneBand::ALL
            .into_iter()
            .map(|band| ((1, band), isochrone()))
            .collect();

        let view = render_map(&districts, &documents, &[]);
        let drawn: Vec<_> = view
            .polygons
            .iter()
            .map(|p| (p.band, p.style.fill_color.as_str()))
            .collect();
        assert_eq!(
            drawn,
            vec![
                (IsochroneBand::Min20, "#F44336"),
                (IsochroneBand::Min15, "#FF9800"),
                (IsochroneBand::Min5, "#4CAF50"),
            ]
        );
        assert_eq!(view.polygons[0].name, "Distrito 1 (20m)");
        assert_eq!(view.polygons[0].style.weight, 1);
        assert_eq!(view.polygons[0].style.fill_opacity, 0.3);
    }

    #[test]
    fn it_omits_polygons_that_could_not_be_fetched() {
        let districts = vec![district(1, &["5 min", "10 min"], all_urls())];
        let documents: PolygonDocuments = [((1, IsochroneBand::Min10), isochrone())].into();

        let view = render_map(&districts, &documents, &[]);
        assert_eq!(view.polygons.len(), 1);
        assert_eq!(view.polygons[0].band, IsochroneBand::Min10);
    }

    #[test]
    fn it_builds_property_popups() {
        let districts = vec![district(1, &[], PolygonUrls::default())];
        let properties = vec![
            property(json!({
                "id": 1, "distrito_id": 1, "direccion": "Los Leones 220", "lat": -33.42, "lon": -70.6,
                "propiedades_backoffice": [{ "tipo_propiedad": "Casa" }],
                "propiedades_portal": { "precio_publicacion": 12345.4 },
            })),
            property(json!({
                "id": 2, "distrito_id": 1, "direccion": null, "lat": -33.43, "lon": -70.61,
                "propiedades_portal": [{ "precio_publicacion": 0.0 }],
            })),
            property(json!({ "id": 3, "distrito_id": 1, "lat": 0.0, "lon": -70.6 })),
            property(json!({ "id": 4, "distrito_id": 1, "lat": null, "lon": null })),
        ];

        let view = render_map(&districts, &PolygonDocuments::new(), &properties);
        assert_eq!(view.property_markers.len(), 2);
        assert_eq!(
            view.property_markers[0].popup,
            "<b>Casa</b><br>Los Leones 220<br>UF 12,345"
        );
        assert_eq!(view.property_markers[0].tooltip, "Casa");
        assert_eq!(
            view.property_markers[1].popup,
            "<b>Propiedad</b><br>Sin dirección"
        );
    }

    #[test]
    fn it_escapes_district_popups() {
        let mut d = district(1, &[], PolygonUrls::default());
        d.nombre = "<script>".to_string();
        d.foto_url = Some("https://cdn.example/foto.png".to_string());
        let view = render_map(&[d], &PolygonDocuments::new(), &[]);
        let popup = &view.district_markers[0].popup;
        assert!(popup.starts_with("<b>&lt;script&gt;</b>"));
        assert!(popup.ends_with("<img src='https://cdn.example/foto.png' style='width:100%'>"));
    }

    #[test]
    fn it_formats_uf_prices() {
        assert_eq!(format_uf(12345.0), "UF 12,345");
        assert_eq!(format_uf(999.6), "UF 1,000");
        assert_eq!(format_uf(1234567.0), "UF 1,234,567");
        assert_eq!(format_uf(12.0), "UF 12");
        assert_eq!(format_uf(12.5), "UF 12");
        assert_eq!(format_uf(13.5), "UF 14");
        assert_eq!(format_uf(2500.5), "UF 2,500");
    }
}
