use anyhow::Context;
use supabase_client::SupabaseClient;

use crate::domain::ports::PolygonSource;

/// Fetches polygon documents from their public urls
#[derive(Debug, Clone)]
pub struct HttpPolygonSource {
    client: SupabaseClient,
}

impl HttpPolygonSource {
    pub fn new(client: SupabaseClient) -> Self {
        HttpPolygonSource { client }
    }
}

impl PolygonSource for HttpPolygonSource {
    async fn fetch_polygon(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        self.client
            .fetch_json(url)
            .await
            .with_context(|| format!("unable to fetch polygon {url}"))
    }
}
