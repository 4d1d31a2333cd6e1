//! Typed view of the `ENVIRONMENT` variable

use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Name of the variable the [Environment] is read from
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// The deployment the process is running in
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production deployment
    Production,
    /// Shared development deployment
    Develop,
    /// A developer machine
    Local,
}

/// Errors produced while reading the [Environment]
#[derive(Debug, Error)]
pub enum EnvironmentErr {
    /// the variable could not be read
    #[error("unable to read {ENVIRONMENT_VAR}: {0}")]
    Var(#[from] std::env::VarError),
    /// the variable held a value we do not recognize
    #[error("{0}")]
    InvalidValue(#[from] UnknownValue),
}

impl Environment {
    /// Read the [Environment] from the process environment
    pub fn new_from_env() -> Result<Self, EnvironmentErr> {
        let raw = std::env::var(ENVIRONMENT_VAR)?;
        Ok(Self::from_str(raw.trim())?)
    }

    /// Read the [Environment], falling back to [Environment::Production] when it is
    /// missing or invalid
    pub fn new_or_prod() -> Self {
        Self::new_from_env().unwrap_or(Environment::Production)
    }

    /// true when running on a developer machine
    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "prod"),
            Environment::Develop => write!(f, "dev"),
            Environment::Local => write!(f, "local"),
        }
    }
}

/// A value which is not a known [Environment]
#[derive(Debug, Error)]
#[error("Could not convert {0} into an environment value")]
pub struct UnknownValue(String);

impl FromStr for Environment {
    type Err = UnknownValue;

    fn from_str(environment: &str) -> Result<Self, UnknownValue> {
        match environment {
            "prod" | "production" => Ok(Environment::Production),
            "dev" | "develop" => Ok(Environment::Develop),
            "local" => Ok(Environment::Local),
            s => Err(UnknownValue(s.to_string())),
        }
    }
}
