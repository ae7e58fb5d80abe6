// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cooperative backpressure pipeline processor.
//!
//! An alternative implementation of the same processor contract as the
//! worker-pool strategy, using a single coordinating flow instead of a
//! dedicated flush task. The flow interleaves three suspension points:
//!
//! * **Gate acquisition**: the [`BackpressureGate`] bounds unreleased
//!   in-flight items; the producer may not pull the next item from the
//!   enumeration until the consumer has freed capacity.
//! * **Result availability**: completed transforms are collected from a
//!   [`FuturesUnordered`] in completion order, not submission order, so one
//!   slow item never holds back its siblings.
//! * **Worker dispatch**: at most `num_workers` transforms are dispatched at
//!   once; the producer pulls the next item only when a worker slot is free
//!   in addition to a gate lease. Each transform runs through
//!   `spawn_blocking`; panics and errors come back as [`TransformError`]
//!   values (isolated dispatch), never across the pool boundary.
//!
//! Each result is folded into the current batch and its gate lease dropped
//! at that moment, which is what ultimately lets the producer advance: the
//! consumer regulates the producer, rather than the producer self-throttling.
//! Full batches are committed in-line by the coordinating flow itself, so the
//! single-writer discipline holds here too.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::task;

use crate::engine::commit_batch;
use crate::engine::gate::{BackpressureGate, GateLease};
use crate::errors::{ErrorPolicy, ExecutionError, TransformError};
use crate::observability::Reporter;
use crate::traits::{BuildProcessor, BuildReport, Builder, Item};

pub struct PipelineProcessor {
    num_workers: usize,
    in_flight_multiplier: usize,
    error_policy: ErrorPolicy,
}

impl PipelineProcessor {
    /// Create a pipeline processor. Worker count and multiplier are clamped
    /// to a minimum of 1.
    pub fn new(num_workers: usize, in_flight_multiplier: usize, error_policy: ErrorPolicy) -> Self {
        Self {
            num_workers: num_workers.max(1),
            in_flight_multiplier: in_flight_multiplier.max(1),
            error_policy,
        }
    }
}

/// Transforms dispatched but not yet collected. One entry per occupied
/// worker slot.
type InFlight = FuturesUnordered<BoxFuture<'static, (GateLease, Result<Item, TransformError>)>>;

/// Run one transform on the blocking pool, returning the outcome paired with
/// the item's gate lease. Panics are captured as values.
fn dispatch(
    builder: Arc<dyn Builder>,
    item: Item,
    lease: GateLease,
) -> BoxFuture<'static, (GateLease, Result<Item, TransformError>)> {
    async move {
        let outcome = match task::spawn_blocking(move || builder.process_item(item)).await {
            Ok(result) => result,
            Err(join) => Err(TransformError::Panicked(join.to_string())),
        };
        (lease, outcome)
    }
    .boxed()
}

#[async_trait]
impl BuildProcessor for PipelineProcessor {
    async fn process(
        &self,
        builder: Arc<dyn Builder>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<BuildReport, ExecutionError> {
        let chunk_size = builder.chunk_size().max(1);
        let gate = BackpressureGate::new(self.num_workers * self.in_flight_multiplier);

        let mut items = builder
            .get_items()
            .await
            .map_err(|source| ExecutionError::EnumerationFailed {
                builder: builder.name().to_string(),
                source,
            })?;

        let mut in_flight = InFlight::new();
        let mut batch: Vec<Item> = Vec::with_capacity(chunk_size);
        let mut report = BuildReport::default();
        let mut exhausted = false;

        while !exhausted || !in_flight.is_empty() {
            tokio::select! {
                biased;
                Some((lease, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    match outcome {
                        Ok(item) => batch.push(item),
                        Err(err) => match self.error_policy {
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
                    // Consumed into the batch: free one unit of gate capacity.
                    drop(lease);
                    if batch.len() >= chunk_size {
                        commit_batch(&*builder, &*reporter, &mut batch, &mut report).await?;
                    }
                }
                lease = gate.acquire(), if !exhausted && in_flight.len() < self.num_workers => {
                    let lease = lease?;
                    match items.next().await {
                        Some(item) => in_flight.push(dispatch(builder.clone(), item, lease)),
                        None => {
                            drop(lease);
                            exhausted = true;
                        }
                    }
                }
            }
        }

        if !batch.is_empty() {
            commit_batch(&*builder, &*reporter, &mut batch, &mut report).await?;
        }

        Ok(report)
    }
}
