// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding API Server
//!
//! Logs users in through GitHub, records the onboarding tracks they choose,
//! and streams provisioning progress over a WebSocket.

use onboarding::{
    config::Config,
    models::SetupScheme,
    services::{GenerateProject, GithubClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        version = onboarding::routes::VERSION,
        "Starting onboarding API"
    );

    // Load the task catalog
    tracing::info!(path = %config.setup_file, "Loading setup scheme");
    let setup =
        SetupScheme::load_from_file(&config.setup_file).expect("Failed to load setup scheme");
    tracing::info!(
        tasks = setup.tasks.len(),
        tracks = setup.available_tracks().len(),
        repository = %setup.repository,
        "Setup scheme loaded"
    );

    let github = GithubClient::from_config(&config);
    let jobs = Arc::new(GenerateProject::new(github.clone()));

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        setup,
        Arc::new(github),
        jobs,
    ));

    // Build router
    let app = onboarding::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboarding=debug".parse().unwrap())
                .add_directive("security=info".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
