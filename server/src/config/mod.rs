use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("No token verification key configured (set AUTH_JWT_SECRET or AUTH_JWT_PUBLIC_KEY_PATH)")]
    MissingAuthKey,

    #[error("Failed to read key file {path:?}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid verification key")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Key material used to check identity-provider signatures.
#[derive(Debug, Clone)]
pub enum AuthKey {
    Secret(String),
    PublicKeyPath(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub key: Option<AuthKey>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Without one the server keeps events in memory.
    pub database_url: Option<String>,
    pub port: u16,
    pub production: bool,
    pub cors_allowed_origins: Option<String>,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: value.clone(),
            })?,
            None => {
                tracing::info!("PORT not set, using default: {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let key = match (var("AUTH_JWT_SECRET"), var("AUTH_JWT_PUBLIC_KEY_PATH")) {
            (Some(secret), _) => Some(AuthKey::Secret(secret)),
            (None, Some(path)) => Some(AuthKey::PublicKeyPath(PathBuf::from(path))),
            (None, None) => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            port,
            production: var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
            auth: AuthConfig {
                key,
                issuer: var("AUTH_ISSUER"),
                audience: var("AUTH_AUDIENCE"),
            },
        })
    }
}
