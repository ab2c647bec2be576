// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod tracks;
pub mod workload;

use crate::error::REDIRECT_CODES;
use crate::middleware::session::{require_session, session_user_id};
use crate::AppState;
use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Semantic version of this build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version response, used as a readiness check.
async fn version() -> Json<&'static str> {
    Json(VERSION)
}

#[derive(Deserialize)]
pub struct StartPageParams {
    #[serde(default)]
    error: Option<String>,
}

/// Start page body.
#[derive(Debug, Serialize)]
pub struct StartPage {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Error code from a failed step; unknown codes are dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<StartPageParams>,
) -> Json<StartPage> {
    let user = session_user_id(&jar, &state.config.session_signing_key)
        .and_then(|id| state.registry.get_user(id));

    let authenticated = user.as_ref().is_some_and(|u| u.is_authenticated());
    Json(StartPage {
        authenticated,
        username: user
            .filter(|_| authenticated)
            .map(|u| u.username),
        error: params
            .error
            .filter(|code| REDIRECT_CODES.contains(&code.as_str())),
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/version", get(version))
        .merge(auth::routes());

    // Routes that need a user bound to the session
    let session_routes = tracks::routes()
        .merge(workload::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
