// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::{BuildEnded, BuildStarted, StructuredLog, TargetsUpdated};

/// Lifecycle events emitted around each builder's run.
///
/// `Update` is emitted once per commit. Events carry enough context for an
/// external reporting sink to reconstruct the run without querying the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Started {
        builder: String,
        sources: Vec<String>,
        targets: Vec<String>,
    },
    Update {
        builder: String,
        items: usize,
    },
    Ended {
        builder: String,
        errors: usize,
        warnings: usize,
    },
}

/// Sink for lifecycle events.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &BuildEvent);
}

/// Reporter that forwards events to the tracing subscriber.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Started {
                builder,
                sources,
                targets,
            } => BuildStarted {
                builder,
                sources,
                targets,
            }
            .log(),
            BuildEvent::Update { builder, items } => TargetsUpdated {
                builder,
                items: *items,
            }
            .log(),
            BuildEvent::Ended {
                builder,
                errors,
                warnings,
            } => BuildEnded {
                builder,
                errors: *errors,
                warnings: *warnings,
            }
            .log(),
        }
    }
}

/// Discards all events.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &BuildEvent) {}
}
