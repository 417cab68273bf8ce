use anyhow::Context;

use crate::core::shared::utils::redact_database_url;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub crm: CrmConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
}

#[derive(Clone, Debug)]
pub struct CrmConfig {
    /// Rows per page for list endpoints when the caller does not ask for a size.
    pub page_size: i64,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &redact_database_url(&self.url))
            .field("pool_max_size", &self.pool_max_size)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source, env-var style.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;
        let pool_max_size = parse_or(&lookup, "DB_POOL_MAX_SIZE", 10u32)?;
        let page_size = parse_or(&lookup, "CRM_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;

        if pool_max_size == 0 {
            anyhow::bail!("DB_POOL_MAX_SIZE must be at least 1");
        }
        if page_size < 1 {
            anyhow::bail!("CRM_PAGE_SIZE must be at least 1");
        }

        Ok(AppConfig {
            server: ServerConfig { host, port },
            database: DatabaseConfig { url, pool_max_size },
            crm: CrmConfig { page_size },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/crm")]))
                .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.pool_max_size, 10);
        assert_eq!(config.crm.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "9000"),
            ("DB_POOL_MAX_SIZE", "4"),
            ("CRM_PAGE_SIZE", "25"),
        ]))
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.pool_max_size, 4);
        assert_eq!(config.crm.page_size, 25);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(AppConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("SERVER_PORT", "eighty"),
        ]));
        assert!(result.is_err());

        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("CRM_PAGE_SIZE", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://crm:hunter2@db/crm",
        )]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
