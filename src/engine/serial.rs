// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use crate::engine::commit_batch;
use crate::errors::{ErrorPolicy, ExecutionError};
use crate::observability::Reporter;
use crate::traits::{BuildProcessor, BuildReport, Builder};

/// Processor with no internal parallelism.
///
/// Slices the item enumeration into `chunk_size` chunks, transforms each item
/// synchronously in enumeration order, and makes exactly one commit per
/// chunk. Selected whenever the effective worker count is 0 or 1.
pub struct SerialProcessor {
    error_policy: ErrorPolicy,
}

impl SerialProcessor {
    pub fn new(error_policy: ErrorPolicy) -> Self {
        Self { error_policy }
    }
}

#[async_trait]
impl BuildProcessor for SerialProcessor {
    async fn process(
        &self,
        builder: Arc<dyn Builder>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<BuildReport, ExecutionError> {
        let chunk_size = builder.chunk_size().max(1);
        let items = builder
            .get_items()
            .await
            .map_err(|source| ExecutionError::EnumerationFailed {
                builder: builder.name().to_string(),
                source,
            })?;

        let mut chunks = items.chunks(chunk_size);
        let mut report = BuildReport::default();

        while let Some(chunk) = chunks.next().await {
            let mut batch = Vec::with_capacity(chunk.len());
            for item in chunk {
                match builder.process_item(item) {
                    Ok(processed) => batch.push(processed),
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
            }
            if batch.is_empty() {
                continue;
            }
            commit_batch(&*builder, &*reporter, &mut batch, &mut report).await?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubBuilder;
    use crate::observability::NullReporter;
    use serde_json::json;

    #[tokio::test]
    async fn one_commit_per_chunk_in_enumeration_order() {
        let builder = Arc::new(StubBuilder::numbers("serial", 25, 10));
        let processor = SerialProcessor::new(ErrorPolicy::SkipFailed);

        let report = processor
            .process(builder.clone(), Arc::new(NullReporter))
            .await
            .unwrap();

        assert_eq!(builder.processed_count(), 25);
        assert_eq!(report.items, 25);
        assert_eq!(report.commits, 3);

        let commits = builder.commits();
        assert_eq!(
            commits.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![10, 10, 5]
        );
        // Enumeration order is preserved end to end.
        let flattened: Vec<_> = commits.into_iter().flatten().collect();
        let expected: Vec<_> = (10..35).map(|v| json!(v)).collect();
        assert_eq!(flattened, expected);
    }

    #[tokio::test]
    async fn single_chunk_reference_scenario() {
        let builder = Arc::new(StubBuilder::numbers("reference", 10, 10));
        let processor = SerialProcessor::new(ErrorPolicy::SkipFailed);

        let report = processor
            .process(builder.clone(), Arc::new(NullReporter))
            .await
            .unwrap();

        assert_eq!(builder.processed_count(), 10);
        assert_eq!(report.commits, 1);
        let commits = builder.commits();
        assert_eq!(commits.len(), 1);
        let expected: Vec<_> = (10..20).map(|v| json!(v)).collect();
        assert_eq!(commits[0], expected);
    }

    #[tokio::test]
    async fn abort_policy_commits_nothing_from_failed_chunk() {
        let builder = Arc::new(
            StubBuilder::numbers("aborting", 10, 10).with_failing_values(&[3]),
        );
        let processor = SerialProcessor::new(ErrorPolicy::AbortChunk);

        let result = processor
            .process(builder.clone(), Arc::new(NullReporter))
            .await;

        assert!(matches!(
            result,
            Err(ExecutionError::ChunkAborted { .. })
        ));
        assert!(builder.commits().is_empty());
    }

    #[tokio::test]
    async fn skip_policy_excludes_failed_items_and_warns() {
        let builder = Arc::new(
            StubBuilder::numbers("skipping", 10, 10).with_failing_values(&[3, 7]),
        );
        let processor = SerialProcessor::new(ErrorPolicy::SkipFailed);

        let report = processor
            .process(builder.clone(), Arc::new(NullReporter))
            .await
            .unwrap();

        assert_eq!(report.items, 8);
        assert_eq!(report.warnings.len(), 2);
        let commits = builder.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].len(), 8);
    }

    #[tokio::test]
    async fn enumeration_failure_is_fatal() {
        let builder = Arc::new(StubBuilder::numbers("bad-source", 5, 10).with_failing_source());
        let processor = SerialProcessor::new(ErrorPolicy::SkipFailed);

        let result = processor.process(builder, Arc::new(NullReporter)).await;

        assert!(matches!(
            result,
            Err(ExecutionError::EnumerationFailed { .. })
        ));
    }
}
