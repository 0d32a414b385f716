//! Centralized configuration (environment variables + defaults).

use anyhow::{bail, Context};
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Required for the postgres backend.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", v))?,
            None => {
                info!("PORT not set, using default: {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let storage = match var("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => StorageBackend::Postgres,
        };

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be a u32, got '{}'", v))?
                .max(1),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let database_url = var("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set");
        }

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            storage,
            database_url,
            max_connections,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_for_memory_backend() {
        let cfg = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(load(&[]).is_err());
        let cfg = load(&[("DATABASE_URL", "postgres://localhost/app"), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "mongo")]).is_err());
        assert!(load(&[
            ("STORAGE_BACKEND", "memory"),
            ("DATABASE_MAX_CONNECTIONS", "-1")
        ])
        .is_err());
    }
}
