// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded worker-pool processor with a dedicated flush consumer.
//!
//! This strategy splits one builder's run into three cooperating roles:
//!
//! 1. **Submission loop** (producer): pulls items off the builder's
//!    enumeration, acquires one task permit per item, and spawns a worker
//!    task for the transform. Permit acquisition is the backpressure point:
//!    when `num_workers * in_flight_multiplier` tasks are outstanding the
//!    producer suspends until a worker completes.
//! 2. **Workers**: each task first claims one of `num_workers` worker slots,
//!    then runs `process_item` on the blocking pool (transforms are CPU-bound
//!    and share no mutable state), converts any panic into a
//!    [`TransformError`] value, delivers the outcome to the flush channel,
//!    and releases its slot and permit. Submitted tasks beyond the worker
//!    count wait for a slot, so at most `num_workers` transforms execute in
//!    parallel. A failing item never terminates the pool.
//! 3. **Flush task** (single consumer): receives outcomes in completion
//!    order, accumulates a batch, and calls `update_targets` every
//!    `chunk_size` items. Being the only actor that commits, it enforces a
//!    single-writer discipline on the builder's targets; commits never
//!    interleave.
//!
//! The shared buffer-plus-condition-variable shape this replaces is modeled
//! as a bounded mpsc channel: workers send, the flush task drains. Dropping
//! the last sender is the completion signal, after which the flush task
//! commits any remainder and returns its report, so teardown is always
//! reachable. When the flush side fails first it cancels a token the
//! submission loop watches, which stops new submissions while in-flight
//! workers drain harmlessly into a closed channel.
//!
//! Guarantees: every enumerated item is transformed exactly once; every
//! outcome reaches exactly one commit decision; at most
//! `num_workers * in_flight_multiplier` submitted-but-unacknowledged tasks
//! exist at any instant; at most `num_workers` transforms run concurrently.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::engine::commit_batch;
use crate::errors::{ErrorPolicy, ExecutionError, TransformError};
use crate::observability::Reporter;
use crate::traits::{BuildProcessor, BuildReport, Builder, Item};

/// Outcome of one worker task, delivered to the flush consumer.
type TaskOutcome = Result<Item, TransformError>;

pub struct WorkerPoolProcessor {
    num_workers: usize,
    in_flight_multiplier: usize,
    error_policy: ErrorPolicy,
}

impl WorkerPoolProcessor {
    /// Create a worker-pool processor. Worker count and multiplier are
    /// clamped to a minimum of 1.
    pub fn new(num_workers: usize, in_flight_multiplier: usize, error_policy: ErrorPolicy) -> Self {
        Self {
            num_workers: num_workers.max(1),
            in_flight_multiplier: in_flight_multiplier.max(1),
            error_policy,
        }
    }

    /// Maximum number of submitted-but-unacknowledged tasks.
    fn capacity(&self) -> usize {
        self.num_workers * self.in_flight_multiplier
    }
}

#[async_trait]
impl BuildProcessor for WorkerPoolProcessor {
    async fn process(
        &self,
        builder: Arc<dyn Builder>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<BuildReport, ExecutionError> {
        let chunk_size = builder.chunk_size().max(1);
        let capacity = self.capacity();

        let mut items = builder
            .get_items()
            .await
            .map_err(|source| ExecutionError::EnumerationFailed {
                builder: builder.name().to_string(),
                source,
            })?;

        let task_count = Arc::new(Semaphore::new(capacity));
        let worker_slots = Arc::new(Semaphore::new(self.num_workers));
        let (outcome_tx, outcome_rx) = mpsc::channel::<TaskOutcome>(capacity);
        let cancel = CancellationToken::new();

        let flush = tokio::spawn(flush_loop(
            outcome_rx,
            builder.clone(),
            reporter,
            chunk_size,
            self.error_policy,
            cancel.clone(),
        ));

        while let Some(item) = items.next().await {
            // Acquiring a task permit is the backpressure point; the token
            // short-circuits the wait when the flush side has already failed.
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = task_count.clone().acquire_owned() => {
                    permit.map_err(|_| ExecutionError::Internal {
                        message: "task semaphore closed while submitting".into(),
                    })?
                }
            };

            let worker_builder = builder.clone();
            let slots = worker_slots.clone();
            let tx = outcome_tx.clone();
            tokio::spawn(async move {
                // The slot is held across the blocking call, bounding
                // concurrent transforms to the worker count.
                let outcome = match slots.acquire_owned().await {
                    Ok(slot) => {
                        let result =
                            match task::spawn_blocking(move || worker_builder.process_item(item))
                                .await
                            {
                                Ok(result) => result,
                                Err(join) => Err(TransformError::Panicked(join.to_string())),
                            };
                        drop(slot);
                        result
                    }
                    Err(_) => Err(TransformError::Failed(
                        "worker slot semaphore closed".to_string(),
                    )),
                };
                // A closed receiver means the flush side already failed; the
                // outcome is dropped along with the rest of the run.
                let _ = tx.send(outcome).await;
                drop(permit);
            });
        }

        // Submission exhausted: dropping the last producer-side sender is the
        // signal for the flush task to drain and commit the remainder.
        drop(outcome_tx);

        match flush.await {
            Ok(result) => result,
            Err(join) => Err(ExecutionError::Internal {
                message: format!("flush task panicked: {join}"),
            }),
        }
    }
}

/// Single consumer draining worker outcomes and batching commits.
async fn flush_loop(
    outcomes: mpsc::Receiver<TaskOutcome>,
    builder: Arc<dyn Builder>,
    reporter: Arc<dyn Reporter>,
    chunk_size: usize,
    error_policy: ErrorPolicy,
    cancel: CancellationToken,
) -> Result<BuildReport, ExecutionError> {
    let result = drain(outcomes, &*builder, &*reporter, chunk_size, error_policy).await;
    if result.is_err() {
        // Stop the submission loop; workers already in flight drain into the
        // closed channel.
        cancel.cancel();
    }
    result
}

async fn drain(
    mut outcomes: mpsc::Receiver<TaskOutcome>,
    builder: &dyn Builder,
    reporter: &dyn Reporter,
    chunk_size: usize,
    error_policy: ErrorPolicy,
) -> Result<BuildReport, ExecutionError> {
    let mut batch = Vec::with_capacity(chunk_size);
    let mut report = BuildReport::default();

    while let Some(outcome) = outcomes.recv().await {
        match outcome {
            Ok(item) => batch.push(item),
            Err(err) => match error_policy {
                ErrorPolicy::SkipFailed => {
                    tracing::warn!(builder = builder.name(), %err, "skipping failed item");
                    report.warnings.push(err.to_string());
                }
                ErrorPolicy::AbortChunk => {
                    return Err(ExecutionError::ChunkAborted {
                        builder: builder.name().to_string(),
                        source: err,
                    });
                }
            },
        }
        if batch.len() >= chunk_size {
            commit_batch(builder, reporter, &mut batch, &mut report).await?;
        }
    }

    // Final drain: the producer side is gone and all workers have delivered.
    if !batch.is_empty() {
        commit_batch(builder, reporter, &mut batch, &mut report).await?;
    }

    Ok(report)
}
