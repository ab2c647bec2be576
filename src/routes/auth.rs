// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::session::{session_cookie, session_user_id};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", get(auth_start))
        .route("/auth/callback", get(auth_callback))
}

/// Start OAuth flow - redirect to GitHub authorization.
///
/// Binds a fresh user to the session if it has none.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let session_user = session_user_id(&jar, &state.config.session_signing_key);
    let start = state.oauth.begin_auth(session_user)?;

    let jar = if session_user == Some(start.user_id) {
        jar
    } else {
        jar.add(session_cookie(start.user_id, &state.config)?)
    };

    Ok((jar, Redirect::temporary(&start.redirect_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code for a token, record the user.
///
/// Every failure lands back on the start page with an error code.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from GitHub");
        return Redirect::to("/?error=provider_denied");
    }

    let session_user = session_user_id(&jar, &state.config.session_signing_key);

    match state
        .oauth
        .handle_callback(session_user, &params.state, &params.code)
        .await
    {
        Ok(_) => Redirect::to("/tracks"),
        Err(e) => {
            let code = e.redirect_code().unwrap_or_else(|| {
                tracing::error!(error = %e, "Unexpected OAuth callback failure");
                "internal_error"
            });
            Redirect::to(&format!("/?error={}", code))
        }
    }
}
