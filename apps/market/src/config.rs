//! Market configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                  | Default            |
//! |---------------------------|--------------------|
//! | `MARKET_DATABASE_PATH`    | `./market.db`      |
//! | `MARKET_MAX_CONNECTIONS`  | `5`                |
//! | `MARKET_LISTING_LIMIT`    | `50`               |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use course_core::DEFAULT_LISTING_LIMIT;
use course_db::DbConfig;

/// Market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,

    /// Upper bound (and default) for listing page sizes
    pub listing_limit: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            database_path: PathBuf::from("./market.db"),
            max_connections: 5,
            listing_limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

impl MarketConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            database_path: lookup("MARKET_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "MARKET_MAX_CONNECTIONS", defaults.max_connections)?,

            listing_limit: parse_or(&lookup, "MARKET_LISTING_LIMIT", defaults.listing_limit)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("MARKET_MAX_CONNECTIONS".to_string()));
        }

        if config.listing_limit == 0 {
            return Err(ConfigError::InvalidValue("MARKET_LISTING_LIMIT".to_string()));
        }

        Ok(config)
    }

    /// Database pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    /// Clamps a requested page size to `1..=listing_limit`.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.listing_limit)
            .clamp(1, self.listing_limit)
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MarketConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MarketConfig::default());
        assert_eq!(config.listing_limit, 50);
    }

    #[test]
    fn test_overrides() {
        let config = MarketConfig::from_lookup(lookup(&[
            ("MARKET_DATABASE_PATH", "/srv/market.db"),
            ("MARKET_MAX_CONNECTIONS", "12"),
            ("MARKET_LISTING_LIMIT", "20"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/srv/market.db"));
        assert_eq!(config.db_config().max_connections, 12);
        assert_eq!(config.listing_limit, 20);
    }

    #[test]
    fn test_invalid_values() {
        assert!(MarketConfig::from_lookup(lookup(&[("MARKET_MAX_CONNECTIONS", "many")])).is_err());
        assert!(MarketConfig::from_lookup(lookup(&[("MARKET_LISTING_LIMIT", "0")])).is_err());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = MarketConfig::default();
        assert_eq!(config.page_size(None), 50);
        assert_eq!(config.page_size(Some(10)), 10);
        assert_eq!(config.page_size(Some(500)), 50);
        assert_eq!(config.page_size(Some(0)), 1);
    }
}
