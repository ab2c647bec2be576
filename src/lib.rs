// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Technical onboarding service
//!
//! Logs a user in through GitHub OAuth, lets them choose onboarding tracks,
//! and streams the progress of the provisioning job run on their behalf over
//! a WebSocket.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::SessionRegistry;
use models::SetupScheme;
use services::{EventBridge, JobEventSource, OAuthHandshake, OAuthProvider};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub registry: SessionRegistry,
    pub setup: Arc<SetupScheme>,
    pub oauth: OAuthHandshake,
    pub bridge: EventBridge,
}

impl AppState {
    /// Wire the handshake and bridge around their external collaborators.
    pub fn new(
        config: Config,
        setup: SetupScheme,
        provider: Arc<dyn OAuthProvider>,
        jobs: Arc<dyn JobEventSource>,
    ) -> Self {
        let registry = SessionRegistry::new();
        let setup = Arc::new(setup);
        let oauth = OAuthHandshake::new(provider, registry.clone());
        let bridge = EventBridge::new(jobs, setup.clone(), config.event_buffer)
            .cancel_on_disconnect(config.cancel_jobs_on_disconnect);

        Self {
            config,
            registry,
            setup,
            oauth,
            bridge,
        }
    }
}
