use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::errors::{ServiceError, ServiceResult};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://surveillance.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub max_connections: u32,
    pub query_timeout: Duration,
    pub cors_allowed_origin: Option<String>,
    pub apply_schema: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_connections: 5,
            query_timeout: Duration::from_millis(5000),
            cors_allowed_origin: None,
            apply_schema: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, honouring a local `.env` file.
    pub fn from_env() -> ServiceResult<Self> {
        if dotenv::dotenv().is_err() {
            log::debug!("No .env file found, using process environment only");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_ms: u64 = try_load(&lookup, "QUERY_TIMEOUT_MS", "5000")?;
        if timeout_ms == 0 {
            return Err(ServiceError::Configuration(
                "QUERY_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let max_connections: u32 = try_load(&lookup, "DB_MAX_CONNECTIONS", "5")?;
        if max_connections == 0 {
            return Err(ServiceError::Configuration(
                "DB_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            max_connections,
            query_timeout: Duration::from_millis(timeout_ms),
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN").filter(|origin| !origin.trim().is_empty()),
            apply_schema: try_load(&lookup, "APPLY_SCHEMA", "false")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> ServiceResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| ServiceError::Configuration(format!("Invalid {key} value '{raw}': {e}")))
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
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.query_timeout, Duration::from_millis(5000));
        assert!(config.cors_allowed_origin.is_none());
        assert!(!config.apply_schema);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("QUERY_TIMEOUT_MS", "250"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("CORS_ALLOWED_ORIGIN", "https://dashboard.example.org"),
            ("APPLY_SCHEMA", "true"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.query_timeout, Duration::from_millis(250));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.cors_allowed_origin.as_deref(), Some("https://dashboard.example.org"));
        assert!(config.apply_schema);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = AppConfig::from_lookup(lookup_from(&[("QUERY_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("QUERY_TIMEOUT_MS"));

        let err = AppConfig::from_lookup(lookup_from(&[("DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
