// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provisioning jobs and the event contract they follow.
//!
//! A job reports progress by sending [`Event`]s into the sender it is given.
//! Returning from `run` drops that sender, which is how the consumer learns
//! the job has finished.

use crate::models::{Event, EventKind, SetupScheme};
use crate::services::github::GithubClient;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything a job needs to run for one user.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub user_id: u64,
    pub username: String,
    pub setup: Arc<SetupScheme>,
    pub access_token: String,
    /// Chosen tracks; may be empty
    pub tracks: Vec<String>,
    /// Triggered when the consumer wants the job to stop early
    pub cancel: CancellationToken,
}

/// Producer of job progress events.
#[async_trait]
pub trait JobEventSource: Send + Sync {
    /// Run the job to completion, emitting events into `events`.
    ///
    /// A failed send means nobody is listening anymore; implementations may
    /// keep going or stop.
    async fn run(&self, request: JobRequest, events: mpsc::Sender<Event>);
}

/// Default job: opens one GitHub issue per catalog task on the chosen tracks.
#[derive(Clone)]
pub struct GenerateProject {
    github: GithubClient,
}

impl GenerateProject {
    pub fn new(github: GithubClient) -> Self {
        Self { github }
    }
}

#[async_trait]
impl JobEventSource for GenerateProject {
    async fn run(&self, request: JobRequest, events: mpsc::Sender<Event>) {
        let tasks: Vec<_> = request.setup.tasks_for_tracks(&request.tracks).collect();
        let repository = request.setup.repository.as_str();

        tracing::info!(
            user_id = request.user_id,
            tracks = ?request.tracks,
            task_count = tasks.len(),
            repository,
            "Generating onboarding project"
        );

        // Sends are best effort: the job outlives its consumer unless cancelled.
        let _ = events
            .send(Event::new(
                EventKind::Started,
                format!(
                    "Creating {} task(s) in {} for {}",
                    tasks.len(),
                    repository,
                    request.username
                ),
            ))
            .await;

        let mut created = 0usize;
        for task in &tasks {
            if request.cancel.is_cancelled() {
                tracing::info!(user_id = request.user_id, created, "Job cancelled");
                return;
            }

            let result = tokio::select! {
                _ = request.cancel.cancelled() => {
                    tracing::info!(user_id = request.user_id, created, "Job cancelled");
                    return;
                }
                result = self.github.create_issue(
                    &request.access_token,
                    repository,
                    &task.title,
                    &task.description,
                ) => result,
            };

            let event = match result {
                Ok(issue) => {
                    created += 1;
                    Event::for_task(
                        EventKind::TaskCreated,
                        &task.title,
                        format!("Created issue #{} ({})", issue.number, issue.html_url),
                    )
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = request.user_id,
                        task = %task.title,
                        error = %e,
                        "Failed to create issue"
                    );
                    Event::for_task(EventKind::TaskFailed, &task.title, e.to_string())
                }
            };
            let _ = events.send(event).await;
        }

        tracing::info!(user_id = request.user_id, created, "Onboarding project generated");

        let _ = events
            .send(Event::new(
                EventKind::Finished,
                format!("Created {} of {} task(s)", created, tasks.len()),
            ))
            .await;
    }
}
