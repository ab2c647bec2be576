// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No user is bound to the request's session.
    #[error("No session bound to request")]
    NoSession,

    /// The OAuth `state` parameter did not match the stored nonce.
    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The client connection went away during the event bridge.
    #[error("Transport closed: {0}")]
    TransportClosed(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("GitHub API error: {0}")]
    Provider(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error code carried back to the start page when an OAuth step fails.
    ///
    /// Only the handshake errors have one; everything else is rendered as a
    /// JSON error body.
    pub fn redirect_code(&self) -> Option<&'static str> {
        match self {
            AppError::NoSession => Some("invalid_session"),
            AppError::StateMismatch => Some("invalid_state"),
            AppError::TokenExchangeFailed(_) => Some("token_exchange_failed"),
            _ => None,
        }
    }
}

/// Codes the start page will echo back from `?error=`.
pub const REDIRECT_CODES: &[&str] = &[
    "invalid_session",
    "invalid_state",
    "token_exchange_failed",
    "provider_denied",
    "internal_error",
];

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NoSession => (StatusCode::UNAUTHORIZED, "no_session", None),
            AppError::StateMismatch => (StatusCode::FORBIDDEN, "invalid_state", None),
            // Provider detail stays in the logs, not in the response.
            AppError::TokenExchangeFailed(msg) => {
                tracing::warn!(error = %msg, "Token exchange failed");
                (StatusCode::BAD_GATEWAY, "token_exchange_failed", None)
            }
            AppError::TransportClosed(msg) => {
                tracing::debug!(error = %msg, "Transport closed");
                (StatusCode::BAD_REQUEST, "transport_closed", None)
            }
            AppError::PreconditionViolation(msg) => (
                StatusCode::PRECONDITION_FAILED,
                "precondition_failed",
                Some(msg.clone()),
            ),
            AppError::Provider(msg) => {
                tracing::warn!(error = %msg, "GitHub API error");
                (StatusCode::BAD_GATEWAY, "github_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
