// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process session registry mapping session ids to users.
//!
//! State lives for the life of the process only; restarting the server
//! logs everybody out.

use crate::models::User;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared user store, cheap to clone.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    users: Arc<DashMap<u64, User>>,
    next_id: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Snapshot of the user bound to `id`.
    pub fn get_user(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    /// Allocate a fresh id and register an empty user under it.
    pub fn new_user(&self) -> User {
        // Ids start at 1 so a zero never names a real session.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User::new(id);
        self.users.insert(id, user.clone());
        tracing::debug!(user_id = id, "Registered new session user");
        user
    }

    /// Write a (possibly modified) snapshot back.
    pub fn save_user(&self, user: &User) {
        self.users.insert(user.id, user.clone());
    }

    /// Mutate a user in place. Returns `None` if the id is unknown.
    pub fn update_user<R>(&self, id: u64, f: impl FnOnce(&mut User) -> R) -> Option<R> {
        self.users.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
