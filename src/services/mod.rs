// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bridge;
pub mod github;
pub mod jobs;
pub mod oauth;

pub use bridge::{BridgeOutcome, BridgeSession, EventBridge};
pub use github::GithubClient;
pub use jobs::{GenerateProject, JobEventSource, JobRequest};
pub use oauth::{AuthStart, OAuthHandshake, OAuthProvider};
