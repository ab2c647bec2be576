// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod event;
pub mod setup;
pub mod user;

pub use event::{Event, EventKind};
pub use setup::{SetupScheme, SetupTask};
pub use user::{AuthEnv, User, UserView};
