// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging and lifecycle reporting.
//!
//! Lifecycle events are advisory: they describe what the engine did, and the
//! absence of a sink never affects correctness. Log output goes through
//! message types implementing [`messages::StructuredLog`] so that field names
//! stay consistent across the codebase.

pub mod messages;
mod reporter;

pub use reporter::{BuildEvent, LogReporter, NullReporter, Reporter};
