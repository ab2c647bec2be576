// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub client and project generation tests against a mock GitHub.

use onboarding::error::AppError;
use onboarding::models::{Event, EventKind};
use onboarding::services::{GenerateProject, GithubClient, JobEventSource, JobRequest, OAuthProvider};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::test_setup;

fn client_for(server: &MockServer) -> GithubClient {
    GithubClient::new(
        "client".to_string(),
        "secret".to_string(),
        "http://localhost:8080/auth/callback".to_string(),
    )
    .with_base_urls(&server.uri(), &format!("{}/login/oauth", server.uri()))
}

fn job_request(tracks: &[&str], cancel: CancellationToken) -> JobRequest {
    JobRequest {
        user_id: 1,
        username: "octocat".to_string(),
        setup: Arc::new(test_setup()),
        access_token: "gho_token".to_string(),
        tracks: tracks.iter().map(|t| t.to_string()).collect(),
        cancel,
    }
}

async fn run_job(job: &GenerateProject, request: JobRequest) -> Vec<Event> {
    let (tx, mut rx) = mpsc::channel(16);
    job.run(request, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_exchange_code_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("code=good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "gho_fresh",
            "token_type": "bearer",
            "scope": "repo"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server).exchange_code("good").await.unwrap();
    assert_eq!(token, "gho_fresh");
}

#[tokio::test]
async fn test_exchange_error_body_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).exchange_code("stale").await.unwrap_err();
    match err {
        AppError::TokenExchangeFailed(msg) => assert!(msg.contains("bad_verification_code")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_exchange_http_error_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).exchange_code("good").await.unwrap_err();
    assert!(matches!(err, AppError::TokenExchangeFailed(_)));
}

#[tokio::test]
async fn test_fetch_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "login": "octocat",
            "name": "The Octocat"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.fetch_username("gho_token").await.unwrap(), "octocat");
}

#[tokio::test]
async fn test_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server).get_user("revoked").await.unwrap_err();
    assert!(matches!(err, AppError::Provider(msg) if msg == "Bad credentials"));
}

#[tokio::test]
async fn test_generate_project_reports_each_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/onboarding/issues"))
        .and(body_string_contains("Install Docker"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 7,
            "html_url": "https://github.com/acme/onboarding/issues/7"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/onboarding/issues"))
        .and(body_string_contains("Deploy to Kubernetes"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let job = GenerateProject::new(client_for(&server));
    let events = run_job(
        &job,
        job_request(&["basics", "kubernetes"], CancellationToken::new()),
    )
    .await;

    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Started,
            EventKind::TaskCreated,
            EventKind::TaskFailed,
            EventKind::Finished
        ]
    );
    assert_eq!(events[1].task.as_deref(), Some("Install Docker"));
    assert!(events[1].message.contains("#7"));
    assert_eq!(events[2].task.as_deref(), Some("Deploy to Kubernetes"));
    assert_eq!(events[3].message, "Created 1 of 2 task(s)");
}

#[tokio::test]
async fn test_generate_project_without_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let job = GenerateProject::new(client_for(&server));
    let events = run_job(&job, job_request(&[], CancellationToken::new())).await;

    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Started, EventKind::Finished]);
}

#[tokio::test]
async fn test_cancelled_job_stops_early() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let job = GenerateProject::new(client_for(&server));
    let events = run_job(&job, job_request(&["basics"], cancel)).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Started);
}
