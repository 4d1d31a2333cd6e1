/// Storage buckets
pub mod buckets {
    /// District photos and isochrone polygon documents
    pub const DISTRICT_MEDIA: &str = "distrito_fotos";
    /// Property deeds, listing copies and façade photos
    pub const PROPERTY_DOCUMENTS: &str = "propiedades_docs";
}

/// Stored procedures that own every district write
pub mod procedures {
    pub const CREATE_DISTRICT: &str = "create_distrito_func";
    pub const UPDATE_DISTRICT: &str = "update_distrito_func";
    pub const DELETE_DISTRICT: &str = "delete_distrito_func";
}

pub mod tables {
    pub const USER_PROFILES: &str = "user_profiles";
    pub const DISTRICTS: &str = "distritos";
    pub const PROPERTIES: &str = "propiedades";
}

/// Map defaults
pub mod map {
    /// Santiago, used when no district is visible
    pub const DEFAULT_CENTER: (f64, f64) = (-33.4372, -70.6342);
    pub const EMPTY_ZOOM: u8 = 11;
    pub const DISTRICTS_ZOOM: u8 = 12;

    pub const STREETS_TILES: &str = "OpenStreetMap";
    pub const HYBRID_TILES: &str = "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}";

    pub const POLYGON_WEIGHT: u8 = 1;
    pub const POLYGON_FILL_OPACITY: f64 = 0.3;
}

/// content type used for polygon uploads
pub const GEOJSON_CONTENT_TYPE: &str = "application/json";
/// content type used when the client did not send one
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Largest multipart body the district and property forms accept
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
