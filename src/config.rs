// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! When neither `GATEWAY_URL` nor `RELAYER_URL` is set the server runs in
//! offline mode against in-memory collaborators.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Base URL of the contract gateway (None = offline)
    pub gateway_url: Option<String>,
    /// Base URL of the FHE relayer (None = offline)
    pub relayer_url: Option<String>,
    /// Interval between transaction receipt polls
    pub confirmation_poll: Duration,
    /// Receipt polls before a transaction is reported as unconfirmed
    pub confirmation_max_attempts: u32,
    /// How long a success status stays visible
    pub status_success_ttl: Duration,
    /// How long an error status stays visible
    pub status_error_ttl: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            gateway_url: None,
            relayer_url: None,
            confirmation_poll: Duration::from_millis(1000),
            confirmation_max_attempts: 60,
            status_success_ttl: Duration::from_millis(2000),
            status_error_ttl: Duration::from_millis(3000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gateway_url = optional_url("GATEWAY_URL");
        let relayer_url = optional_url("RELAYER_URL");

        // Half-configured deployments would silently mix real and fake collaborators.
        match (&gateway_url, &relayer_url) {
            (Some(_), None) => return Err(ConfigError::Missing("RELAYER_URL")),
            (None, Some(_)) => return Err(ConfigError::Missing("GATEWAY_URL")),
            _ => {}
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 8080)?,
            gateway_url,
            relayer_url,
            confirmation_poll: Duration::from_millis(parse_var("CONFIRMATION_POLL_MS", 1000)?),
            confirmation_max_attempts: parse_var("CONFIRMATION_MAX_ATTEMPTS", 60)?,
            status_success_ttl: Duration::from_millis(parse_var("STATUS_SUCCESS_MS", 2000)?),
            status_error_ttl: Duration::from_millis(parse_var("STATUS_ERROR_MS", 3000)?),
        })
    }

    /// True when no external collaborators are configured.
    pub fn is_offline(&self) -> bool {
        self.gateway_url.is_none() && self.relayer_url.is_none()
    }
}

fn optional_url(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GATEWAY_URL", "http://gateway.local/");
        env::set_var("RELAYER_URL", "http://relayer.local");
        env::set_var("STATUS_SUCCESS_MS", "1500");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gateway_url.as_deref(), Some("http://gateway.local"));
        assert_eq!(config.relayer_url.as_deref(), Some("http://relayer.local"));
        assert_eq!(config.status_success_ttl, Duration::from_millis(1500));
        assert_eq!(config.status_error_ttl, Duration::from_millis(3000));
        assert!(!config.is_offline());

        env::remove_var("GATEWAY_URL");
        env::remove_var("RELAYER_URL");
        env::remove_var("STATUS_SUCCESS_MS");
    }

    #[test]
    fn test_default_is_offline() {
        assert!(Config::default().is_offline());
    }
}
