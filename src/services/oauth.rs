// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization-code handshake.
//!
//! Three steps: redirect with a fresh CSRF nonce, verify the nonce on the
//! callback, exchange the code for a token. Authorization codes are single
//! use, so nothing here retries.

use crate::db::SessionRegistry;
use crate::error::AppError;
use crate::models::{AuthEnv, User};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Number of random bytes in a state nonce.
const STATE_NONCE_BYTES: usize = 32;

/// The provider side of the handshake.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorization URL the browser is redirected to.
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, AppError>;

    /// Display name of the account owning `access_token`.
    async fn fetch_username(&self, access_token: &str) -> Result<String, AppError>;
}

/// Result of starting a login.
#[derive(Debug, Clone)]
pub struct AuthStart {
    /// User now bound to the session (possibly just created)
    pub user_id: u64,
    pub redirect_url: String,
}

/// Drives the OAuth dance against a provider, storing state on users in
/// the registry.
#[derive(Clone)]
pub struct OAuthHandshake {
    provider: Arc<dyn OAuthProvider>,
    registry: SessionRegistry,
    rng: SystemRandom,
}

impl OAuthHandshake {
    pub fn new(provider: Arc<dyn OAuthProvider>, registry: SessionRegistry) -> Self {
        Self {
            provider,
            registry,
            rng: SystemRandom::new(),
        }
    }

    /// Start (or restart) a login for the session's user.
    ///
    /// Creates the user when the session has none. Any earlier nonce is
    /// replaced, which invalidates an in-flight flow for this user.
    pub fn begin_auth(&self, session_user_id: Option<u64>) -> Result<AuthStart, AppError> {
        let state = self.generate_state()?;
        let redirect_url = self.provider.authorize_url(&state);

        let bound = session_user_id.and_then(|id| {
            self.registry.update_user(id, |user| {
                user.auth_env = Some(AuthEnv::new(state.clone()));
                user.id
            })
        });

        let user_id = match bound {
            Some(id) => id,
            None => {
                let mut user = self.registry.new_user();
                user.auth_env = Some(AuthEnv::new(state));
                self.registry.save_user(&user);
                user.id
            }
        };

        tracing::info!(user_id, "Starting OAuth flow, redirecting to GitHub");

        Ok(AuthStart {
            user_id,
            redirect_url,
        })
    }

    /// Verify the callback and complete the login.
    ///
    /// The token and username are committed only if the nonce is still the
    /// one verified here; a login restarted during the exchange wins.
    /// Returns the updated user on success.
    pub async fn handle_callback(
        &self,
        session_user_id: Option<u64>,
        state: &str,
        code: &str,
    ) -> Result<User, AppError> {
        let Some(user) = session_user_id.and_then(|id| self.registry.get_user(id)) else {
            tracing::error!("Invalid OAuth callback: no user bound to session");
            return Err(AppError::NoSession);
        };
        let user_id = user.id;

        let Some(auth) = user.auth_env.as_ref() else {
            tracing::error!(user_id, "Invalid OAuth callback: no login in progress");
            return Err(AppError::NoSession);
        };

        if !state_matches(auth, state) {
            tracing::error!(
                target: "security",
                user_id,
                "OAuth state mismatch on callback, rejecting"
            );
            return Err(AppError::StateMismatch);
        }

        tracing::info!(user_id, "Exchanging authorization code for token");

        let access_token = self.provider.exchange_code(code).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "Could not get access token");
            exchange_failure(e)
        })?;

        let username = self
            .provider
            .fetch_username(&access_token)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Could not resolve GitHub user");
                exchange_failure(e)
            })?;

        let committed = self.registry.update_user(user_id, |user| {
            match user.auth_env.as_mut() {
                Some(auth) if state_matches(auth, state) => {
                    auth.access_token = Some(access_token);
                    user.username = username;
                    Some(user.clone())
                }
                _ => None,
            }
        });

        match committed {
            Some(Some(user)) => {
                tracing::info!(
                    user_id,
                    username = %user.username,
                    "Successfully authenticated GitHub user"
                );
                Ok(user)
            }
            Some(None) => {
                tracing::error!(
                    target: "security",
                    user_id,
                    "Login restarted during token exchange, discarding token"
                );
                Err(AppError::StateMismatch)
            }
            None => Err(AppError::NoSession),
        }
    }

    fn generate_state(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; STATE_NONCE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Constant-time comparison of the callback state with the stored nonce.
fn state_matches(auth: &AuthEnv, state: &str) -> bool {
    bool::from(auth.state.as_bytes().ct_eq(state.as_bytes()))
}

/// Collapse any provider failure into `TokenExchangeFailed`.
fn exchange_failure(err: AppError) -> AppError {
    match err {
        AppError::TokenExchangeFailed(_) => err,
        other => AppError::TokenExchangeFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider;

    #[async_trait]
    impl OAuthProvider for StaticProvider {
        fn authorize_url(&self, state: &str) -> String {
            format!("https://provider.test/authorize?state={state}")
        }

        async fn exchange_code(&self, _code: &str) -> Result<String, AppError> {
            Ok("token".to_string())
        }

        async fn fetch_username(&self, _access_token: &str) -> Result<String, AppError> {
            Ok("octocat".to_string())
        }
    }

    fn handshake() -> (OAuthHandshake, SessionRegistry) {
        let registry = SessionRegistry::new();
        (
            OAuthHandshake::new(Arc::new(StaticProvider), registry.clone()),
            registry,
        )
    }

    #[test]
    fn test_state_nonce_is_url_safe_and_fresh() {
        let (handshake, _) = handshake();
        let a = handshake.generate_state().unwrap();
        let b = handshake.generate_state().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, unpadded base64
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn test_begin_auth_reuses_bound_user() {
        let (handshake, registry) = handshake();
        let first = handshake.begin_auth(None).unwrap();
        let second = handshake.begin_auth(Some(first.user_id)).unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_begin_auth_with_stale_id_creates_user() {
        let (handshake, registry) = handshake();
        let start = handshake.begin_auth(Some(999)).unwrap();

        assert_ne!(start.user_id, 999);
        assert!(registry.get_user(start.user_id).is_some());
    }

    #[tokio::test]
    async fn test_callback_stores_token_and_username() {
        let (handshake, registry) = handshake();
        let start = handshake.begin_auth(None).unwrap();
        let state = registry
            .get_user(start.user_id)
            .and_then(|u| u.auth_env)
            .map(|a| a.state)
            .unwrap();

        let user = handshake
            .handle_callback(Some(start.user_id), &state, "code")
            .await
            .unwrap();

        assert_eq!(user.username, "octocat");
        assert_eq!(user.access_token(), Some("token"));
        assert!(registry.get_user(start.user_id).unwrap().is_authenticated());
    }
}
