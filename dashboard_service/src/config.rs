use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

pub use distrito_entrypoint::Environment;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SECRETS_PATH: &str = ".secrets/secrets.toml";

/// Configuration parameters for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The environment we are in
    pub environment: Environment,
    /// The port to listen for HTTP requests on.
    pub port: u16,
    /// Local secret file holding the backend credentials
    pub secrets_path: PathBuf,
}

impl Config {
    /// Reads the remaining settings for a process initialized for `environment`
    pub fn from_env(environment: Environment) -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port, got {port}"))?,
            Err(_) => DEFAULT_PORT,
        };
        let secrets_path = std::env::var("SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH));

        Ok(Config {
            environment,
            port,
            secrets_path,
        })
    }
}

/// Reasons the backend credentials could not be loaded. The service still
/// starts, but every data operation answers with this error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("backend credentials missing: set SUPABASE_URL and SUPABASE_KEY or provide {0}")]
    MissingCredentials(PathBuf),
    #[error("unable to read {path}: {source}")]
    UnreadableSecrets {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid secrets file {path}: {source}")]
    InvalidSecrets {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid backend url: {0}")]
    InvalidBackend(#[from] supabase_client::ClientError),
}

/// Url and key of the managed backend.
#[derive(Clone, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct SecretsFile {
    supabase: Option<BackendSettings>,
}

impl BackendSettings {
    /// `SUPABASE_URL`/`SUPABASE_KEY` win over the secrets file
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        let url = std::env::var("SUPABASE_URL").ok();
        let key = std::env::var("SUPABASE_KEY").ok();
        Self::from_sources(url, key, &config.secrets_path)
    }

    pub fn from_sources(
        url: Option<String>,
        key: Option<String>,
        secrets_path: &Path,
    ) -> Result<Self, ConfigError> {
        if let (Some(url), Some(key)) = (url, key)
            && !url.is_empty()
            && !key.is_empty()
        {
            return Ok(BackendSettings { url, key });
        }

        let raw = match std::fs::read_to_string(secrets_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingCredentials(secrets_path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::UnreadableSecrets {
                    path: secrets_path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&raw, secrets_path)
    }

    /// Parse a secrets file with a `[supabase]` table
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: SecretsFile = toml::from_str(raw).map_err(|source| ConfigError::InvalidSecrets {
            path: path.to_path_buf(),
            source,
        })?;
        file.supabase
            .filter(|s| !s.url.is_empty() && !s.key.is_empty())
            .ok_or_else(|| ConfigError::MissingCredentials(path.to_path_buf()))
    }
}
