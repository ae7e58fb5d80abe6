// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised across the builder capability contract.

use thiserror::Error;

/// Failure of a single item's transform.
///
/// Contained at the task boundary: parallel processors capture it as a value
/// and deliver it to the consumer side, so one bad item can never terminate a
/// worker pool or the flush path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The transform rejected the item.
    #[error("transform failed: {0}")]
    Failed(String),

    /// The transform panicked inside a worker. The panic is converted to a
    /// value at the pool boundary.
    #[error("transform worker panicked: {0}")]
    Panicked(String),
}

/// Failure while enumerating a builder's source items. Fatal to that
/// builder's run.
#[derive(Debug, Clone, Error)]
#[error("source enumeration failed: {message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure writing a batch to a target collection.
///
/// Not retried by the engine: the builder's run fails and dependent builders
/// are skipped, since their sources may be inconsistent.
#[derive(Debug, Clone, Error)]
#[error("target update failed: {message}")]
pub struct CommitError {
    pub message: String,
}

impl CommitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
