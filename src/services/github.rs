// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub API client.
//!
//! Handles:
//! - OAuth authorize URL construction and code-for-token exchange
//! - Resolving the authenticated user's login
//! - Issue creation for generated onboarding projects

use crate::config::Config;
use crate::error::AppError;
use crate::services::oauth::OAuthProvider;
use async_trait::async_trait;
use serde::Deserialize;

const USER_AGENT: &str = concat!("onboarding/", env!("CARGO_PKG_VERSION"));

/// Scopes requested on the authorize redirect.
const OAUTH_SCOPE: &str = "repo";

/// GitHub API client.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl GithubClient {
    /// Create a new GitHub client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String, callback_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: "https://api.github.com".to_string(),
            oauth_url: "https://github.com/login/oauth".to_string(),
            client_id,
            client_secret,
            callback_url,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.github_client_id.clone(),
            config.github_client_secret.clone(),
            config.callback_url(),
        )
        .with_base_urls(&config.github_api_url, &config.github_oauth_url)
    }

    /// Point the client at different API and OAuth hosts.
    pub fn with_base_urls(mut self, api_url: &str, oauth_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_url.trim_end_matches('/').to_string();
        self
    }

    /// Exchange an authorization code for an access token.
    ///
    /// GitHub answers some failures (bad or reused code) with a 200 and an
    /// `error` field, so both shapes are checked.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/access_token", self.oauth_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchangeFailed(format!("Token request failed: {}", e)))?;

        let body: TokenResponse = self
            .check_response_json(response)
            .await
            .map_err(|e| AppError::TokenExchangeFailed(e.to_string()))?;

        match body {
            TokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(AppError::TokenExchangeFailed(format!(
                "{}: {}",
                error.unwrap_or_else(|| "missing_token".to_string()),
                error_description.unwrap_or_default()
            ))),
        }
    }

    /// Get the authenticated user's profile.
    pub async fn get_user(&self, access_token: &str) -> Result<GithubUser, AppError> {
        let response = self
            .http
            .get(format!("{}/user", self.api_url))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Open an issue in `repository` (`owner/name`).
    pub async fn create_issue(
        &self,
        access_token: &str,
        repository: &str,
        title: &str,
        body: &str,
    ) -> Result<GithubIssue, AppError> {
        let url = format!("{}/repos/{}/issues", self.api_url, repository);

        let payload = serde_json::json!({
            "title": title,
            "body": body,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::Provider("Bad credentials".to_string()));
            }

            if status.as_u16() == 403 || status.as_u16() == 429 {
                tracing::warn!(status = status.as_u16(), "GitHub rate limit or forbidden");
            }

            return Err(AppError::Provider(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl OAuthProvider for GithubClient {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&scope={}&state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        GithubClient::exchange_code(self, code).await
    }

    async fn fetch_username(&self, access_token: &str) -> Result<String, AppError> {
        Ok(self.get_user(access_token).await?.login)
    }
}

/// Access token response from the OAuth endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Authenticated user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

/// Created issue.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubIssue {
    pub number: u64,
    pub html_url: String,
}
