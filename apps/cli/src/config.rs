//! # CLI Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The `--db` flag overrides `BIZDESK_DB_PATH`.
//!
//! | Variable                        | Default        |
//! |---------------------------------|----------------|
//! | `BIZDESK_DB_PATH`               | `./bizdesk.db` |
//! | `BIZDESK_MAX_CONNECTIONS`       | `5`            |
//! | `BIZDESK_NUMBER_RETRIES`        | `5`            |
//! | `BIZDESK_AUTO_NUMBER_PROPOSALS` | `false`        |
//! | `BIZDESK_CURRENCY_SYMBOL`       | `$`            |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use bizdesk_core::Money;
use bizdesk_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Command line configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Extra attempts after a document number collision
    pub number_retries: u32,

    /// Give proposals created without a number a `PRP-YYYYMM-NNNN` one
    pub auto_number_proposals: bool,

    /// Prefix for amounts in human-readable summaries
    pub currency_symbol: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from("./bizdesk.db"),
            max_connections: 5,
            number_retries: 5,
            auto_number_proposals: false,
            currency_symbol: "$".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            db_path: lookup("BIZDESK_DB_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            max_connections: parse_var(&lookup, "BIZDESK_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),

            number_retries: parse_var(&lookup, "BIZDESK_NUMBER_RETRIES")?
                .unwrap_or(defaults.number_retries),

            auto_number_proposals: parse_var(&lookup, "BIZDESK_AUTO_NUMBER_PROPOSALS")?
                .unwrap_or(defaults.auto_number_proposals),

            currency_symbol: lookup("BIZDESK_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "BIZDESK_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Database configuration for this CLI run.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.db_path.clone())
            .max_connections(self.max_connections)
            .numbering_retries(self.number_retries)
            .auto_number_proposals(self.auto_number_proposals)
    }

    /// Formats an amount for display, e.g. `$140.40`.
    pub fn format_currency(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, Money::zero() - amount)
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
