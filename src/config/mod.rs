use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{RestfulError, Result};

/// Default cap on buffered request bodies (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Seeded from the process environment.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse the value under `key`; a present but malformed value is an error.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| RestfulError::Config {
                    key: key.to_string(),
                    value,
                }),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(RestfulError::Config {
                    key: key.to_string(),
                    value,
                }),
            },
        }
    }
}

/// Settings of the HTTP server hosting an [`Api`](crate::Api).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub auto_reload: bool,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            auto_reload: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `DEBUG`, `AUTO_RELOAD` and `BODY_LIMIT`, keeping defaults for absent keys.
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: config.get("HOST").unwrap_or(defaults.host),
            port: config.get_parsed("PORT")?.unwrap_or(defaults.port),
            debug: config.get_bool("DEBUG")?.unwrap_or(defaults.debug),
            auto_reload: config.get_bool("AUTO_RELOAD")?.unwrap_or(defaults.auto_reload),
            body_limit: config
                .get_parsed("BODY_LIMIT")?
                .unwrap_or(defaults.body_limit),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_keys_absent() {
        let config = ServerConfig::from_config(&ConfigService::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_values_are_parsed() {
        let service = ConfigService::default();
        service.set("HOST", "127.0.0.1");
        service.set("PORT", " 9090 ");
        service.set("DEBUG", "yes");
        service.set("AUTO_RELOAD", "0");
        service.set("BODY_LIMIT", "1024");

        let config = ServerConfig::from_config(&service).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert!(config.debug);
        assert!(!config.auto_reload);
        assert_eq!(config.body_limit, 1024);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let service = ConfigService::default();
        service.set("PORT", "eighty");
        assert!(matches!(
            ServerConfig::from_config(&service),
            Err(RestfulError::Config { key, .. }) if key == "PORT"
        ));

        let service = ConfigService::default();
        service.set("DEBUG", "maybe");
        assert!(ServerConfig::from_config(&service).is_err());
    }
}
