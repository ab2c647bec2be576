// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie handling.
//!
//! The cookie carries an HS256 JWT whose subject is the user's session id.
//! It is opaque to the client and maps to a user in the registry.

use crate::config::Config;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "onboarding_session";

/// Session lifetime (7 days).
const SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (session user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Session user id extracted from a valid cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    pub user_id: u64,
}

/// Create a session token for `user_id`.
pub fn create_session_token(user_id: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode a session token, returning the user id if it is valid.
pub fn verify_session_token(token: &str, signing_key: &[u8]) -> Option<u64> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    token_data.claims.sub.parse().ok()
}

/// User id named by the request's session cookie, if present and valid.
pub fn session_user_id(jar: &CookieJar, signing_key: &[u8]) -> Option<u64> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| verify_session_token(cookie.value(), signing_key))
}

/// Build the session cookie for `user_id`.
pub fn session_cookie(user_id: u64, config: &Config) -> anyhow::Result<Cookie<'static>> {
    let token = create_session_token(user_id, &config.session_signing_key)?;

    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build())
}

/// Middleware that requires a session bound to a known user.
///
/// Requests without one are sent back to the start page, mirroring how the
/// OAuth routes report `NoSession`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = session_user_id(&jar, &state.config.session_signing_key)
        .filter(|id| state.registry.get_user(*id).is_some());

    let Some(user_id) = user_id else {
        tracing::warn!(path = %request.uri().path(), "User not set up correctly");
        return Redirect::to("/?error=invalid_session").into_response();
    };

    request.extensions_mut().insert(SessionUser { user_id });
    next.run(request).await
}
