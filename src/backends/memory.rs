// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory document store and the map builder that runs against it.
//!
//! Collections are keyed maps of JSON documents. Commits upsert by document
//! key, so re-running a builder over the same inputs converges on the same
//! target state instead of duplicating documents.

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{BuilderConfig, BuilderRegistry};
use crate::errors::{CommitError, ConfigError, SourceError, TransformError};
use crate::traits::{Builder, Item, ItemStream};

/// Shared collection of named document collections. Cloning is cheap and
/// every clone sees the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, BTreeMap<String, Item>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert documents into a collection, keyed by each document's `key`
    /// field (or the whole document when no `key` field is present).
    pub async fn update(&self, collection: &str, docs: Vec<Item>) {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();
        for doc in docs {
            entries.insert(doc_key(&doc), doc);
        }
    }

    /// All documents in a collection, in key order.
    pub async fn query(&self, collection: &str) -> Vec<Item> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, BTreeMap::len)
    }
}

fn doc_key(doc: &Item) -> String {
    match doc.get("key") {
        Some(key) => key.to_string(),
        None => doc.to_string(),
    }
}

/// Builder that reads every document from one collection, adds a fixed
/// increment to its `value` field, and commits the result to another.
pub struct MapBuilder {
    name: String,
    sources: Vec<String>,
    targets: Vec<String>,
    chunk_size: usize,
    increment: i64,
    store: MemoryStore,
}

impl MapBuilder {
    pub fn new(
        name: &str,
        source: &str,
        target: &str,
        chunk_size: usize,
        increment: i64,
        store: MemoryStore,
    ) -> Self {
        Self {
            name: name.to_string(),
            sources: vec![source.to_string()],
            targets: vec![target.to_string()],
            chunk_size,
            increment,
            store,
        }
    }
}

#[async_trait]
impl Builder for MapBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn targets(&self) -> &[String] {
        &self.targets
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn get_items(&self) -> Result<ItemStream, SourceError> {
        let docs = self.store.query(&self.sources[0]).await;
        Ok(stream::iter(docs).boxed())
    }

    fn process_item(&self, item: Item) -> Result<Item, TransformError> {
        let value = item.get("value").and_then(Item::as_i64).ok_or_else(|| {
            TransformError::Failed(format!("document missing numeric 'value' field: {item}"))
        })?;
        let mut doc = item;
        doc["value"] = json!(value + self.increment);
        Ok(doc)
    }

    async fn update_targets(&self, batch: Vec<Item>) -> Result<(), CommitError> {
        self.store.update(&self.targets[0], batch).await;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MapParams {
    increment: i64,
}

impl Default for MapParams {
    fn default() -> Self {
        Self { increment: 1 }
    }
}

/// Register the `map` builder kind against a shared store.
pub fn register_map_builder(registry: &mut BuilderRegistry, store: MemoryStore) {
    registry.register("map", move |cfg: &BuilderConfig| {
        let params = parse_params(cfg)?;
        let source = single_collection(cfg, &cfg.sources, "source")?;
        let target = single_collection(cfg, &cfg.targets, "target")?;
        Ok(Arc::new(MapBuilder::new(
            &cfg.name,
            &source,
            &target,
            cfg.chunk_size,
            params.increment,
            store.clone(),
        )) as Arc<dyn Builder>)
    });
}

fn parse_params(cfg: &BuilderConfig) -> Result<MapParams, ConfigError> {
    if cfg.params.is_null() {
        return Ok(MapParams::default());
    }
    serde_yaml::from_value(cfg.params.clone()).map_err(|err| ConfigError::InvalidBuilder {
        builder: cfg.name.clone(),
        message: err.to_string(),
    })
}

fn single_collection(
    cfg: &BuilderConfig,
    declared: &[String],
    role: &str,
) -> Result<String, ConfigError> {
    match declared {
        [collection] => Ok(collection.clone()),
        _ => Err(ConfigError::InvalidBuilder {
            builder: cfg.name.clone(),
            message: format!("map builders take exactly one {role} collection"),
        }),
    }
}
