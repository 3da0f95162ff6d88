//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use itemsearch_search::{DEFAULT_SCAN_SIZE, ElasticsearchConfig, IndexSettings, RefreshPolicy};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub engine: ElasticsearchConfig,
    pub index: IndexSettings,
    /// Page size used when a finder returns every match.
    pub scan_size: u32,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("ITEMSEARCH_BIND") {
            Some(v) => parse("ITEMSEARCH_BIND", &v)?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let defaults = ElasticsearchConfig::default();
        let timeout = match get("ELASTICSEARCH_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse("ELASTICSEARCH_TIMEOUT_MS", &v)?),
            None => defaults.timeout,
        };
        let refresh = match get("ELASTICSEARCH_REFRESH") {
            Some(v) => v
                .parse::<RefreshPolicy>()
                .map_err(|message| ConfigError::Invalid {
                    var: "ELASTICSEARCH_REFRESH",
                    message,
                })?,
            None => defaults.refresh,
        };
        let engine = ElasticsearchConfig {
            url: get("ELASTICSEARCH_URL").unwrap_or(defaults.url),
            username: get("ELASTICSEARCH_USERNAME"),
            password: get("ELASTICSEARCH_PASSWORD"),
            timeout,
            refresh,
        };

        let mut index = IndexSettings::default();
        if let Some(analyzer) = get("ITEMSEARCH_TITLE_ANALYZER") {
            index.text_analyzer = analyzer.trim().to_string();
        }

        let scan_size = match get("ITEMSEARCH_SCAN_SIZE") {
            Some(v) => parse("ITEMSEARCH_SCAN_SIZE", &v)?,
            None => DEFAULT_SCAN_SIZE,
        };
        if scan_size == 0 {
            return Err(ConfigError::Invalid {
                var: "ITEMSEARCH_SCAN_SIZE",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            engine,
            index,
            scan_size,
        })
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        message: e.to_string(),
    })
}
