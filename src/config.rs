use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::service::gameapi::{
    endpoint::Platform,
    rate_limit::{DEFAULT_RETRY_AFTER_MISSING, DEFAULT_RETRY_AFTER_UNPARSABLE},
    worker::MAX_ATTEMPTS,
};

/// Riot's own backoffs can exceed half a minute, so callers wait generously.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STORAGE_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct RiotClientConfig {
    pub api_key: String,
    /// Platform identifier such as `euw1` or `na1`.
    pub region: String,
    /// Data Dragon version, or `latest`.
    pub version: String,
    pub call_timeout: Duration,
    pub http_timeout: Duration,
    pub max_attempts: u32,
    /// Fraction (0..=1) by which rate limit waits are randomly spread.
    pub jitter: f64,
    pub retry_after_unparsable: Duration,
    pub retry_after_missing: Duration,
    pub storage_dir: PathBuf,
}

impl RiotClientConfig {
    pub fn new(api_key: impl Into<String>, region: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            region: region.into(),
            version: version.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            max_attempts: MAX_ATTEMPTS,
            jitter: 0.0,
            retry_after_unparsable: DEFAULT_RETRY_AFTER_UNPARSABLE,
            retry_after_missing: DEFAULT_RETRY_AFTER_MISSING,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }

    /// Checks the required fields and resolves the region.
    pub fn validate(&self) -> Result<Platform, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingVersion);
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidJitter(self.jitter));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }

        self.region.parse::<Platform>().map_err(ConfigError::UnknownRegion)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing Riot API key")]
    MissingApiKey,
    #[error("missing region")]
    MissingRegion,
    #[error("missing API version")]
    MissingVersion,
    #[error("{0}")]
    UnknownRegion(String),
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("jitter must be between 0 and 1, got {0}")]
    InvalidJitter(f64),
    #[error("at least one attempt per request is required")]
    InvalidMaxAttempts,
}
