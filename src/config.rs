// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GitHub OAuth client ID (public)
    pub github_client_id: String,
    /// Externally visible base URL of this service, used for the OAuth callback
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Path to the setup scheme (task catalog) JSON file
    pub setup_file: String,
    /// GitHub REST API base URL
    pub github_api_url: String,
    /// GitHub OAuth base URL (authorize and access_token live below it)
    pub github_oauth_url: String,
    /// Capacity of the per-connection job event channel
    pub event_buffer: usize,
    /// Cancel the backing job when its client disconnects
    pub cancel_jobs_on_disconnect: bool,

    // --- Secrets ---
    /// GitHub OAuth client secret
    pub github_client_secret: String,
    /// Signing key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
}

const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_SETUP_FILE: &str = "data/setup.json";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_OAUTH_URL: &str = "https://github.com/login/oauth";
const DEFAULT_EVENT_BUFFER: usize = 64;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let event_buffer = match env::var("EVENT_BUFFER") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid("EVENT_BUFFER", raw)),
            },
            Err(_) => DEFAULT_EVENT_BUFFER,
        };

        Ok(Self {
            github_client_id: env::var("GITHUB_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GITHUB_CLIENT_ID"))?,
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            setup_file: env::var("SETUP_FILE").unwrap_or_else(|_| DEFAULT_SETUP_FILE.to_string()),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
            github_oauth_url: env::var("GITHUB_OAUTH_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_OAUTH_URL.to_string()),
            event_buffer,
            cancel_jobs_on_disconnect: env::var("CANCEL_JOBS_ON_DISCONNECT")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            github_client_secret: env::var("GITHUB_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GITHUB_CLIENT_SECRET"))?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            github_client_id: "test_client_id".to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            port: 8080,
            setup_file: DEFAULT_SETUP_FILE.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_oauth_url: DEFAULT_GITHUB_OAUTH_URL.to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            cancel_jobs_on_disconnect: false,
            github_client_secret: "test_secret".to_string(),
            session_signing_key: b"test_session_key_32_bytes_min!!!".to_vec(),
        }
    }

    /// OAuth redirect URI registered with GitHub.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.public_url)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GITHUB_CLIENT_ID", "test_id");
        env::set_var("GITHUB_CLIENT_SECRET", " test_secret \n");
        env::set_var("SESSION_SIGNING_KEY", "test_session_key_32_bytes_min!!!");
        env::set_var("PUBLIC_URL", "https://onboarding.example.com/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.github_client_id, "test_id");
        assert_eq!(config.github_client_secret, "test_secret");
        assert_eq!(config.public_url, "https://onboarding.example.com");
        assert_eq!(
            config.callback_url(),
            "https://onboarding.example.com/auth/callback"
        );
        assert!(config.secure_cookies());
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_default_is_not_secure() {
        let config = Config::test_default();
        assert!(!config.secure_cookies());
        assert_eq!(config.callback_url(), "http://localhost:8080/auth/callback");
    }
}
