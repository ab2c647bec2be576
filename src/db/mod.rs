// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session storage.

pub mod registry;

pub use registry::SessionRegistry;
