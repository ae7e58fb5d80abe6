// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for builder lifecycle events.
//!
//! Struct-based messages with a `Display` implementation keep log strings out
//! of the engine code and give every event a consistent set of structured
//! fields.

use std::fmt::{Display, Formatter};

/// Emit a message through the tracing subscriber with structured fields.
pub trait StructuredLog {
    fn log(&self);
}

/// A builder's run is starting.
pub struct BuildStarted<'a> {
    pub builder: &'a str,
    pub sources: &'a [String],
    pub targets: &'a [String],
}

impl Display for BuildStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting build '{}': sources=[{}] targets=[{}]",
            self.builder,
            self.sources.join(", "),
            self.targets.join(", ")
        )
    }
}

impl StructuredLog for BuildStarted<'_> {
    fn log(&self) {
        tracing::info!(
            builder = self.builder,
            sources = ?self.sources,
            targets = ?self.targets,
            "{}", self
        );
    }
}

/// One commit was applied to a builder's targets.
pub struct TargetsUpdated<'a> {
    pub builder: &'a str,
    pub items: usize,
}

impl Display for TargetsUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Build '{}' committed {} items to targets",
            self.builder, self.items
        )
    }
}

impl StructuredLog for TargetsUpdated<'_> {
    fn log(&self) {
        tracing::info!(builder = self.builder, items = self.items, "{}", self);
    }
}

/// A builder's run finished, successfully or not.
pub struct BuildEnded<'a> {
    pub builder: &'a str,
    pub errors: usize,
    pub warnings: usize,
}

impl Display for BuildEnded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Build '{}' ended: {} errors, {} warnings",
            self.builder, self.errors, self.warnings
        )
    }
}

impl StructuredLog for BuildEnded<'_> {
    fn log(&self) {
        if self.errors > 0 {
            tracing::error!(
                builder = self.builder,
                errors = self.errors,
                warnings = self.warnings,
                "{}", self
            );
        } else {
            tracing::info!(
                builder = self.builder,
                errors = self.errors,
                warnings = self.warnings,
                "{}", self
            );
        }
    }
}
