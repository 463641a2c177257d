//! Client configuration parsed from environment variables.

use std::collections::HashMap;
use std::env::VarError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const ENV_VARS: [&str; 4] =
    ["FOLIO_BASE_URL", "FOLIO_SESSION_TOKEN", "FOLIO_REQUEST_TIMEOUT_SECS", "FOLIO_CONNECT_TIMEOUT_SECS"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{0} is not valid unicode")]
    NotUnicode(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolioConfig {
    /// Origin of the portfolio backend, without a trailing slash.
    pub base_url: String,
    pub session_token: Option<String>,
    pub timeouts: Timeouts,
}

impl FolioConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `FOLIO_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `FOLIO_SESSION_TOKEN`: auth cookie value; unauthenticated when absent
    /// - `FOLIO_REQUEST_TIMEOUT_SECS`: default 60
    /// - `FOLIO_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed base URL or timeout, or a
    /// variable that is not valid unicode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for key in ENV_VARS {
            match std::env::var(key) {
                Ok(value) => {
                    vars.insert(key, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) => return Err(ConfigError::NotUnicode(key)),
            }
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Same as [`FolioConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed base URL or timeout.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&lookup("FOLIO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))?;
        let session_token = lookup("FOLIO_SESSION_TOKEN").filter(|t| !t.trim().is_empty());
        let timeouts = Timeouts {
            request_secs: parse_secs("FOLIO_REQUEST_TIMEOUT_SECS", lookup("FOLIO_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs("FOLIO_CONNECT_TIMEOUT_SECS", lookup("FOLIO_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(Self { base_url, session_token, timeouts })
    }

    /// Apply command-line overrides on top of the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the overriding URL is malformed.
    pub fn with_overrides(mut self, base_url: Option<String>, session_token: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = base_url {
            self.base_url = normalize_base_url(&url)?;
        }
        if session_token.is_some() {
            self.session_token = session_token;
        }
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_string()))
    }
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
