use anyhow::Context;
use dashboard_service::{
    config::{BackendSettings, Config, ConfigError},
    domain::service::DashboardServiceImpl,
    inbound,
    outbound::{
        http_polygons::HttpPolygonSource, supabase_backend::SupabaseBackend,
        unconfigured::UnconfiguredService,
    },
};
use distrito_entrypoint::{Entrypoint, tree_indent_from_env};
use supabase_client::SupabaseClient;

fn connect(config: &Config) -> Result<SupabaseClient, ConfigError> {
    let settings = BackendSettings::load(config)?;
    let client = SupabaseClient::new(&settings.url, &settings.key)?;
    tracing::info!(url = %settings.url, "initialized supabase client");
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let entrypoint = Entrypoint::default()
        .tree_tracing(tree_indent_from_env())
        .init();

    // Parse our configuration from the environment.
    let config = Config::from_env(entrypoint.environment())
        .context("expected to be able to generate config")?;

    tracing::info!(environment = ?config.environment, port = config.port, "initialized config");

    match connect(&config) {
        Ok(client) => {
            let service = DashboardServiceImpl::new(
                SupabaseBackend::new(client.clone()),
                HttpPolygonSource::new(client),
            );
            inbound::serve(service, config.port).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "backend is not configured, data routes will answer 503");
            inbound::serve(UnconfiguredService::new(err.to_string()), config.port).await
        }
    }
}
