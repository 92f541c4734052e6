use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/molly.json";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown STORE_BACKEND '{0}' (expected local, sheet or supabase)")]
    UnknownBackend(String),

    #[error("{0} must be set for the {1} backend")]
    Missing(&'static str, &'static str),

    #[error("PORT must be a port number, got '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Local { data_path: PathBuf },
    Sheet { url: String },
    Supabase { url: String, key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub backend: BackendConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let required = |key: &'static str, backend: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key, backend))
        };

        let backend_name = lookup("STORE_BACKEND").unwrap_or_else(|| "local".to_string());
        let backend = match backend_name.trim().to_ascii_lowercase().as_str() {
            "local" => BackendConfig::Local {
                data_path: resolve_data_path(&lookup),
            },
            "sheet" => BackendConfig::Sheet {
                url: required("SHEET_URL", "sheet")?,
            },
            "supabase" => BackendConfig::Supabase {
                url: required("SUPABASE_URL", "supabase")?,
                key: required("SUPABASE_KEY", "supabase")?,
            },
            _ => return Err(ConfigError::UnknownBackend(backend_name)),
        };

        Ok(Self { port, backend })
    }
}

pub fn resolve_data_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = lookup("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_DATA_PATH)
}
