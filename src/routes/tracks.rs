// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track selection routes.

use axum::{
    extract::{Extension, Form, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::SessionUser;
use crate::models::UserView;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracks", get(list_tracks))
        .route("/workload", post(select_tracks))
}

/// Offer the tracks derived from the task catalog.
async fn list_tracks(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<UserView>> {
    let available = state.setup.available_tracks();

    let view = state
        .registry
        .update_user(session.user_id, |user| {
            user.available_tracks = available;
            UserView::from(&*user)
        })
        .ok_or(AppError::NoSession)?;

    Ok(Json(view))
}

/// Record the tracks ticked on the form.
///
/// Form keys are track names; any non-empty value selects the track.
/// Unknown names are ignored and the result keeps catalog order.
async fn select_tracks(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<UserView>> {
    let available = state.setup.available_tracks();
    let chosen: Vec<String> = available
        .iter()
        .filter(|track| form.get(*track).is_some_and(|v| !v.is_empty()))
        .cloned()
        .collect();

    tracing::info!(user_id = session.user_id, tracks = ?chosen, "Tracks selected");

    let view = state
        .registry
        .update_user(session.user_id, |user| {
            user.available_tracks = available;
            user.tracks = chosen;
            UserView::from(&*user)
        })
        .ok_or(AppError::NoSession)?;

    Ok(Json(view))
}
