use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

use crate::error::{Result, ScopixError};
use crate::server::DEFAULT_BODY_LIMIT;

/// Prefix of environment variables read by [`ConfigService::from_env`].
pub const ENV_PREFIX: &str = "SCOPIX_";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `SCOPIX_*` variable, keyed without the prefix and lowercased
    /// (`SCOPIX_LOG_LEVEL` becomes `log_level`).
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                service.set(&stripped.to_lowercase(), &value);
            }
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse `key` if present
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| {
                    ScopixError::config(format!("invalid value {raw:?} for {key}: {e}"))
                })
            })
            .transpose()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `scopix=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit: DEFAULT_BODY_LIMIT,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `host`, `port`, `body_limit`, `log_level` and `log_format`, keeping
    /// defaults for anything unset.
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: config.get("host").unwrap_or(defaults.host),
            port: config.get_parsed("port")?.unwrap_or(defaults.port),
            body_limit: config
                .get_parsed("body_limit")?
                .unwrap_or(defaults.body_limit),
            logging: LoggingConfig {
                level: config.get("log_level").unwrap_or(defaults.logging.level),
                format: config
                    .get_parsed("log_format")?
                    .unwrap_or(defaults.logging.format),
            },
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
