// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use thiserror::Error;

use super::{CommitError, SourceError, TransformError};

/// How a run treats per-item transform failures.
///
/// The policy is fixed for the whole run and applied identically by every
/// processor strategy; failing behavior is never mixed within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Exclude the failing item from its batch's commit and record a warning.
    #[default]
    SkipFailed,
    /// Fail the builder without committing the affected batch.
    AbortChunk,
}

/// Errors that can occur while executing builders.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The dependency graph contains a cycle. Fatal configuration error,
    /// detected before any builder executes.
    #[error("dependency cycle detected among builders: {}", remaining.join(", "))]
    CycleDetected { remaining: Vec<String> },

    /// A builder's item enumeration failed.
    #[error("builder '{builder}': {source}")]
    EnumerationFailed {
        builder: String,
        source: SourceError,
    },

    /// A builder's target write failed.
    #[error("builder '{builder}': {source}")]
    CommitFailed {
        builder: String,
        source: CommitError,
    },

    /// A transform failure aborted the current batch under
    /// [`ErrorPolicy::AbortChunk`]. Nothing from that batch was committed.
    #[error("builder '{builder}': batch aborted: {source}")]
    ChunkAborted {
        builder: String,
        source: TransformError,
    },

    /// Invariant violation inside the engine itself.
    #[error("internal error: {message}")]
    Internal { message: String },
}
