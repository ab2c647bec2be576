// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Setup scheme: the catalog of onboarding tasks and the tracks they belong to.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Catalog loaded at startup and shared by all jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupScheme {
    /// Display name of the onboarding project
    #[serde(default)]
    pub project: String,
    /// Target repository for generated issues, as `owner/name`
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub tasks: Vec<SetupTask>,
}

/// A single onboarding task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Track names this task belongs to
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SetupScheme {
    /// Load the scheme from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Distinct task tags in first-seen order.
    pub fn available_tracks(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tasks
            .iter()
            .flat_map(|task| task.tags.iter())
            .filter(|tag| seen.insert(tag.as_str()))
            .cloned()
            .collect()
    }

    /// Tasks tagged with at least one of `tracks`.
    pub fn tasks_for_tracks<'a>(&'a self, tracks: &'a [String]) -> impl Iterator<Item = &'a SetupTask> {
        self.tasks
            .iter()
            .filter(move |task| task.tags.iter().any(|tag| tracks.contains(tag)))
    }
}
