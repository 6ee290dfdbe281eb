//! Client configuration

use std::{env, time::Duration};

/// Default interval between automatic status refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default transport timeout for billing calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings of the subscription client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Petsit API, e.g. `https://api.petsit.app`
    pub api_base_url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables (and `.env` when present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("PETSIT_API_URL").map_err(|_| ConfigError::Missing("PETSIT_API_URL"))?;
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid("PETSIT_API_URL must be an http(s) URL"));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            refresh_interval: secs_var("SUBSCRIPTION_REFRESH_SECS", DEFAULT_REFRESH_INTERVAL)?,
            request_timeout: secs_var("BILLING_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?,
        })
    }
}

fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("{0} must be a positive number of seconds")]
    InvalidNumber(&'static str),
}
