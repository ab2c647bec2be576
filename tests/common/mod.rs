// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use onboarding::config::Config;
use onboarding::error::AppError;
use onboarding::models::{Event, SetupScheme};
use onboarding::routes::create_router;
use onboarding::services::{JobEventSource, JobRequest, OAuthProvider};
use onboarding::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// OAuth provider double that counts calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeProvider {
    pub exchange_calls: AtomicUsize,
    pub fail_exchange: bool,
    pub fail_username: bool,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://github.test/login/oauth/authorize?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange {
            return Err(AppError::TokenExchangeFailed("bad_verification_code".to_string()));
        }
        Ok(format!("token-for-{}", code))
    }

    async fn fetch_username(&self, _access_token: &str) -> Result<String, AppError> {
        if self.fail_username {
            return Err(AppError::Provider("HTTP 500".to_string()));
        }
        Ok("octocat".to_string())
    }
}

/// Job double that emits a fixed script of events, then finishes.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedJob {
    pub script: Vec<Event>,
    pub runs: AtomicUsize,
    pub requests: Mutex<Vec<JobRequest>>,
}

#[allow(dead_code)]
impl ScriptedJob {
    pub fn new(script: Vec<Event>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobEventSource for ScriptedJob {
    async fn run(&self, request: JobRequest, events: mpsc::Sender<Event>) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        for event in &self.script {
            if events.send(event.clone()).await.is_err() {
                return;
            }
        }
    }
}

/// Small catalog with three tracks.
#[allow(dead_code)]
pub fn test_setup() -> SetupScheme {
    SetupScheme::from_json(
        r#"{
            "project": "Test onboarding",
            "repository": "acme/onboarding",
            "tasks": [
                {"title": "Install Docker", "tags": ["basics", "containers"]},
                {"title": "Deploy to Kubernetes", "tags": ["kubernetes"]}
            ]
        }"#,
    )
    .expect("valid test setup")
}

/// Create a test app with offline fakes.
/// Returns the router, the shared state and the provider double.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<FakeProvider>) {
    create_test_app_with(FakeProvider::default(), Arc::new(ScriptedJob::default()))
}

#[allow(dead_code)]
pub fn create_test_app_with(
    provider: FakeProvider,
    job: Arc<ScriptedJob>,
) -> (axum::Router, Arc<AppState>, Arc<FakeProvider>) {
    let provider = Arc::new(provider);
    let state = Arc::new(AppState::new(
        Config::test_default(),
        test_setup(),
        provider.clone(),
        job,
    ));

    (create_router(state.clone()), state, provider)
}

/// Pull `name=value` for a cookie out of a response's Set-Cookie headers.
#[allow(dead_code)]
pub fn cookie_pair(response: &axum::response::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{name}=")))
        .and_then(|value| value.split(';').next())
        .map(|pair| pair.to_string())
}
