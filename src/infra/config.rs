use std::{fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub images: ImageStorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("{other} is not a supported store backend")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Object storage holding medicine images. Deletion is skipped when `url` is unset.
#[derive(Debug, Clone)]
pub struct ImageStorageConfig {
    pub url: Option<String>,
    pub bucket: String,
    pub service_key: Option<String>,
    /// Upper bound on a single storage request.
    pub timeout: Duration,
}

/// Loads the configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Loads the configuration through an arbitrary key lookup.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let store: StoreBackend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;

    let url = match (lookup("DATABASE_URL"), store) {
        (Some(url), _) => url,
        (None, StoreBackend::Memory) => String::new(),
        (None, StoreBackend::Postgres) => bail!("DATABASE_URL must be set for the postgres store"),
    };

    Ok(AppConfig {
        server: ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PORT", 3000)?,
        },
        store,
        database: DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        },
        images: ImageStorageConfig {
            url: lookup("IMAGE_STORAGE_URL").map(|url| url.trim_end_matches('/').to_string()),
            bucket: lookup("IMAGE_STORAGE_BUCKET").unwrap_or_else(|| "medicine-images".into()),
            service_key: lookup("IMAGE_STORAGE_KEY"),
            timeout: Duration::from_secs(parse_or(&lookup, "IMAGE_STORAGE_TIMEOUT_SECS", 10)?),
        },
    })
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Postgres => f.write_str("postgres"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}
