//! Worker configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or the `DB_*` parts - same as the API
//! - `LOW_STOCK_THRESHOLD` - Available units at or below which a product is
//!   reported (default: 5)
//! - `ENVIRONMENT` - `production` switches logs to JSON
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE` - Error tracking

use bazaar_api::config::{ConfigError, database_url_from_env};
use secrecy::SecretString;

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: SecretString,
    pub low_stock_threshold: i32,
    pub is_production: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
}

impl WorkerConfig {
    /// Load configuration from environment variables (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database settings are missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = database_url_from_env()?;

        Ok(Self {
            database_url,
            low_stock_threshold: parse_threshold(optional("LOW_STOCK_THRESHOLD").as_deref())?,
            is_production: optional("ENVIRONMENT").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: optional("SENTRY_SAMPLE_RATE")
                .map(|v| {
                    v.parse::<f32>().map_err(|e| {
                        ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
                    })
                })
                .transpose()?
                .unwrap_or(1.0),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_threshold(raw: Option<&str>) -> Result<i32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LOW_STOCK_THRESHOLD);
    };
    let invalid = |msg: String| ConfigError::InvalidEnvVar("LOW_STOCK_THRESHOLD".to_string(), msg);

    let threshold = raw.trim().parse::<i32>().map_err(|e| invalid(e.to_string()))?;
    if threshold < 0 {
        return Err(invalid("must not be negative".to_string()));
    }
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_default() {
        assert_eq!(parse_threshold(None).ok(), Some(5));
    }

    #[test]
    fn test_threshold_parse() {
        assert_eq!(parse_threshold(Some(" 12 ")).ok(), Some(12));
        assert_eq!(parse_threshold(Some("0")).ok(), Some(0));
    }

    #[test]
    fn test_threshold_rejects_bad_values() {
        assert!(parse_threshold(Some("-1")).is_err());
        assert!(parse_threshold(Some("five")).is_err());
    }
}
