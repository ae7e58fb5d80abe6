// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod gate;
pub mod pipeline;
pub mod serial;
pub mod worker_pool;
#[cfg(test)]
pub mod integration_tests;

pub use factory::ProcessorFactory;
pub use gate::{BackpressureGate, GateLease};
pub use pipeline::PipelineProcessor;
pub use serial::SerialProcessor;
pub use worker_pool::WorkerPoolProcessor;

use crate::errors::ExecutionError;
use crate::observability::{BuildEvent, Reporter};
use crate::traits::{BuildReport, Builder, Item};

/// Swap out the accumulated batch and commit it, emitting one `Update` event.
///
/// Single call site per consumer keeps the single-writer discipline visible:
/// commits for one builder never interleave because only one actor ever
/// reaches this function during a run.
pub(crate) async fn commit_batch(
    builder: &dyn Builder,
    reporter: &dyn Reporter,
    batch: &mut Vec<Item>,
    report: &mut BuildReport,
) -> Result<(), ExecutionError> {
    let staged = std::mem::take(batch);
    let count = staged.len();
    builder
        .update_targets(staged)
        .await
        .map_err(|source| ExecutionError::CommitFailed {
            builder: builder.name().to_string(),
            source,
        })?;
    report.items += count;
    report.commits += 1;
    reporter.report(&BuildEvent::Update {
        builder: builder.name().to_string(),
        items: count,
    });
    Ok(())
}
