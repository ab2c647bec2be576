// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User aggregate held by the session registry.

use serde::Serialize;

/// An onboarding user, addressed by session id.
#[derive(Debug, Clone, Default)]
pub struct User {
    /// Session-scoped identifier, assigned on the first visit to `/auth`
    pub id: u64,
    /// GitHub login, empty until the OAuth callback succeeds
    pub username: String,
    /// OAuth state for the current login attempt
    pub auth_env: Option<AuthEnv>,
    /// Tracks chosen on the workload form, in catalog order
    pub tracks: Vec<String>,
    /// Tracks offered on the last `/tracks` render
    pub available_tracks: Vec<String>,
}

impl User {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Access token from a completed code exchange, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.auth_env
            .as_ref()
            .and_then(|auth| auth.access_token.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Per-login OAuth state. Replaced wholesale on every `begin_auth`.
#[derive(Debug, Clone)]
pub struct AuthEnv {
    /// CSRF nonce sent to the provider and expected back on the callback
    pub state: String,
    /// Set once by a successful code exchange
    pub access_token: Option<String>,
}

impl AuthEnv {
    pub fn new(state: String) -> Self {
        Self {
            state,
            access_token: None,
        }
    }
}

/// Public view of a user, returned by the track and workload routes.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub available_tracks: Vec<String>,
    pub tracks: Vec<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            available_tracks: user.available_tracks.clone(),
            tracks: user.tracks.clone(),
        }
    }
}
