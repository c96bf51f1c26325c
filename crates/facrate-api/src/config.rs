//! Startup configuration for the remote data store.
//!
//! Both values come from the environment and are required. A missing or
//! malformed value is fatal: the caller reports it and exits before the
//! terminal is switched into raw mode.

use thiserror::Error;
use url::Url;

/// Endpoint of the hosted data store, e.g. `https://xyz.supabase.co`
pub const URL_VAR: &str = "SUPABASE_URL";
/// Access key sent with every request
pub const KEY_VAR: &str = "SUPABASE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing Supabase URL or Key: {var} is not set")]
    Missing { var: &'static str },

    #[error("Invalid SUPABASE_URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub api_key: String,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (blank values count as unset).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing { var })
        };

        let raw_url = require(URL_VAR)?;
        let api_key = require(KEY_VAR)?;

        Ok(Self {
            endpoint: parse_endpoint(&raw_url)?,
            api_key,
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        value: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    // Url::join treats the last segment as a file unless the path ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
