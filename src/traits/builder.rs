// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::{CommitError, SourceError, TransformError};

/// A single document moved through the engine.
pub type Item = serde_json::Value;

/// Lazy, possibly large, non-restartable enumeration of a builder's items.
pub type ItemStream = BoxStream<'static, Item>;

/// A unit of work that derives documents in target collections from documents
/// in source collections.
///
/// The engine consumes builders only through this contract; what the
/// transform does and where the collections live are the builder's business.
/// Source/target overlap between builders is what the dependency graph is
/// computed from.
#[async_trait]
pub trait Builder: Send + Sync {
    fn name(&self) -> &str;

    /// Collections this builder reads from.
    fn sources(&self) -> &[String];

    /// Collections this builder writes to.
    fn targets(&self) -> &[String];

    /// Maximum number of processed items per commit. Must be at least 1;
    /// configuration validation rejects 0.
    fn chunk_size(&self) -> usize;

    /// Enumerate the items to process.
    async fn get_items(&self) -> Result<ItemStream, SourceError>;

    /// Transform one item.
    ///
    /// Must be safe to invoke concurrently on disjoint items with no shared
    /// mutable state across invocations; parallel processors run it on the
    /// blocking pool.
    fn process_item(&self, item: Item) -> Result<Item, TransformError>;

    /// Commit a batch of processed items to the target collections.
    ///
    /// Must be idempotent: calling it again with overlapping content must not
    /// corrupt the targets.
    async fn update_targets(&self, batch: Vec<Item>) -> Result<(), CommitError>;
}
