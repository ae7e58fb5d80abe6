// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Integration tests driving the parallel processors end to end.

use serde_json::json;
use std::sync::Arc;

use crate::backends::memory::{MapBuilder, MemoryStore};
use crate::backends::stub::StubBuilder;
use crate::config::{ExecutionOptions, Strategy};
use crate::engine::{PipelineProcessor, WorkerPoolProcessor};
use crate::errors::{ErrorPolicy, ExecutionError};
use crate::observability::NullReporter;
use crate::runner::Runner;
use crate::traits::{BuildProcessor, BuildReport, Builder, Item};

async fn run(
    processor: &dyn BuildProcessor,
    builder: Arc<StubBuilder>,
) -> Result<BuildReport, ExecutionError> {
    processor.process(builder, Arc::new(NullReporter)).await
}

fn sorted_values(commits: &[Vec<Item>]) -> Vec<i64> {
    let mut values: Vec<i64> = commits
        .iter()
        .flatten()
        .map(|item| item.as_i64().unwrap())
        .collect();
    values.sort_unstable();
    values
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_reference_scenario() {
    let builder = Arc::new(StubBuilder::numbers("reference", 10, 10));
    let processor = WorkerPoolProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 10);
    assert_eq!(report.commits, 1);
    assert!(report.warnings.is_empty());
    let commits = builder.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(sorted_values(&commits), (10..20).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_bounds_concurrent_transforms_to_worker_count() {
    // In-flight capacity is 2 * 4 = 8, but only 2 transforms may run at once.
    let builder = (0..16).fold(StubBuilder::numbers("bounded", 16, 10), |b, v| {
        b.with_delay_for(v, 10)
    });
    let builder = Arc::new(builder);
    let processor = WorkerPoolProcessor::new(2, 4, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 16);
    assert!(
        builder.max_concurrent() <= 2,
        "observed {} concurrent transforms with 2 workers",
        builder.max_concurrent()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_skips_failed_items_and_records_warnings() {
    let builder = Arc::new(StubBuilder::numbers("skips", 25, 10).with_failing_values(&[3, 7]));
    let processor = WorkerPoolProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 23);
    assert_eq!(report.warnings.len(), 2);
    let expected: Vec<i64> = (10..35).filter(|v| *v != 13 && *v != 17).collect();
    assert_eq!(sorted_values(&builder.commits()), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_abort_policy_commits_nothing_from_failed_batch() {
    // Chunk larger than the item count so the failure lands before any commit.
    let builder = Arc::new(StubBuilder::numbers("aborts", 25, 100).with_failing_values(&[5]));
    let processor = WorkerPoolProcessor::new(4, 2, ErrorPolicy::AbortChunk);

    let result = run(&processor, Arc::clone(&builder)).await;

    assert!(matches!(result, Err(ExecutionError::ChunkAborted { .. })));
    assert!(builder.commits().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_isolates_transform_panics() {
    let builder = Arc::new(StubBuilder::numbers("panics", 10, 10).with_panicking_values(&[4]));
    let processor = WorkerPoolProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 9);
    assert_eq!(report.warnings.len(), 1);
    let expected: Vec<i64> = (10..20).filter(|v| *v != 14).collect();
    assert_eq!(sorted_values(&builder.commits()), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_commit_failure_fails_the_build() {
    let builder = Arc::new(StubBuilder::numbers("badsink", 10, 5).with_failing_commit());
    let processor = WorkerPoolProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let result = run(&processor, builder).await;

    assert!(matches!(result, Err(ExecutionError::CommitFailed { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_reference_scenario() {
    let builder = Arc::new(StubBuilder::numbers("reference", 10, 10));
    let processor = PipelineProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 10);
    assert_eq!(report.commits, 1);
    let commits = builder.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(sorted_values(&commits), (10..20).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_consumes_results_in_completion_order() {
    // Item 0 is far slower than its siblings; the first commit must fill up
    // from faster items instead of waiting for it.
    let builder = Arc::new(StubBuilder::numbers("unordered", 6, 3).with_delay_for(0, 200));
    let processor = PipelineProcessor::new(2, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 6);
    let commits = builder.commits();
    assert!(commits.len() >= 2);
    assert!(!commits[0].contains(&json!(10)));
    assert_eq!(sorted_values(&commits), (10..16).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_bounds_concurrent_transforms_to_worker_count() {
    // Gate capacity is 2 * 4 = 8, but only 2 transforms may run at once.
    let builder = (0..16).fold(StubBuilder::numbers("bounded", 16, 10), |b, v| {
        b.with_delay_for(v, 10)
    });
    let builder = Arc::new(builder);
    let processor = PipelineProcessor::new(2, 4, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 16);
    assert!(
        builder.max_concurrent() <= 2,
        "observed {} concurrent transforms with 2 workers",
        builder.max_concurrent()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_abort_policy_commits_nothing_from_failed_batch() {
    let builder = Arc::new(StubBuilder::numbers("aborts", 25, 100).with_failing_values(&[5]));
    let processor = PipelineProcessor::new(4, 2, ErrorPolicy::AbortChunk);

    let result = run(&processor, Arc::clone(&builder)).await;

    assert!(matches!(result, Err(ExecutionError::ChunkAborted { .. })));
    assert!(builder.commits().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_isolates_transform_panics() {
    let builder = Arc::new(StubBuilder::numbers("panics", 10, 10).with_panicking_values(&[4]));
    let processor = PipelineProcessor::new(4, 2, ErrorPolicy::SkipFailed);

    let report = run(&processor, Arc::clone(&builder)).await.unwrap();

    assert_eq!(report.items, 9);
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn strategies_agree_on_observable_outcomes() {
    let scenario = || Arc::new(StubBuilder::numbers("either", 25, 10).with_failing_values(&[3]));

    let pool_builder = scenario();
    let pool = WorkerPoolProcessor::new(4, 2, ErrorPolicy::SkipFailed);
    let pool_report = run(&pool, Arc::clone(&pool_builder)).await.unwrap();

    let pipe_builder = scenario();
    let pipe = PipelineProcessor::new(4, 2, ErrorPolicy::SkipFailed);
    let pipe_report = run(&pipe, Arc::clone(&pipe_builder)).await.unwrap();

    assert_eq!(pool_report.items, pipe_report.items);
    assert_eq!(pool_report.warnings.len(), pipe_report.warnings.len());
    assert_eq!(
        sorted_values(&pool_builder.commits()),
        sorted_values(&pipe_builder.commits())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn map_builders_chain_through_the_store() {
    let store = MemoryStore::new();
    store
        .update(
            "raw",
            (0..10).map(|i| json!({"key": i, "value": i})).collect(),
        )
        .await;

    let builders: Vec<Arc<dyn Builder>> = vec![
        Arc::new(MapBuilder::new("enrich", "mid", "final", 4, 100, store.clone())),
        Arc::new(MapBuilder::new("normalize", "raw", "mid", 4, 10, store.clone())),
    ];
    let options = ExecutionOptions {
        strategy: Strategy::WorkerPool,
        num_workers: Some(4),
        in_flight_multiplier: 2,
        error_policy: ErrorPolicy::SkipFailed,
    };

    let report = Runner::new(builders, options)
        .with_reporter(Arc::new(NullReporter))
        .run()
        .await
        .unwrap();

    assert!(!report.failed());
    let finals = store.query("final").await;
    assert_eq!(finals.len(), 10);
    for doc in finals {
        let key = doc["key"].as_i64().unwrap();
        assert_eq!(doc["value"].as_i64().unwrap(), key + 110);
    }
}
