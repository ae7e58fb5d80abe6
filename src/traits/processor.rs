// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::observability::Reporter;
use crate::traits::builder::Builder;

/// Outcome of driving one builder to completion.
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    /// Items delivered to commits.
    pub items: usize,
    /// Number of commit calls made.
    pub commits: usize,
    /// Per-item transform failures recorded under
    /// [`crate::errors::ErrorPolicy::SkipFailed`].
    pub warnings: Vec<String>,
}

/// An execution strategy for one builder's item pipeline.
///
/// Implementations are interchangeable behind this trait; the runner stays
/// oblivious to which strategy is in use. All strategies share the same
/// guarantees: every enumerated item is transformed exactly once, every
/// result (or captured error) reaches exactly one commit decision, and
/// commits for one builder never interleave.
#[async_trait]
pub trait BuildProcessor: Send + Sync {
    /// Drive the builder over all of its chunks.
    async fn process(
        &self,
        builder: Arc<dyn Builder>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<BuildReport, ExecutionError>;
}
