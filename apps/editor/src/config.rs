use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub remote_api_url: String,
    /// Bearer token issued by the auth service for the signed-in user.
    pub api_token: String,
    pub autosave_debounce_ms: u64,
    pub gateway_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            remote_api_url: std::env::var("REMOTE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            api_token: require_env("API_TOKEN")?,
            autosave_debounce_ms: parse_env("AUTOSAVE_DEBOUNCE_MS", 1500)?,
            gateway_timeout_secs: parse_env("GATEWAY_TIMEOUT_SECS", 30)?,
            port: parse_env("PORT", 8081)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
