// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job progress events, sent to the client as JSON text frames.

use serde::{Deserialize, Serialize};

/// Kind of progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    TaskCreated,
    TaskFailed,
    Finished,
}

/// One progress update from a running job.
///
/// Events carry no sequence number; stream order is the only ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    /// Task title, for per-task events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// RFC 3339 creation time
    pub timestamp: String,
}

impl Event {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            task: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn for_task(kind: EventKind, task: &str, message: impl Into<String>) -> Self {
        Self {
            task: Some(task.to_string()),
            ..Self::new(kind, message)
        }
    }
}
