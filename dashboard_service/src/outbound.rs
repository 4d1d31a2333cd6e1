pub mod http_polygons;
pub mod supabase_backend;
pub mod unconfigured;
