// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Instrumented builder used by engine tests and demos.
//!
//! Items are plain JSON numbers; the transform adds 10 (the reference
//! scenario: inputs 0-9 become 10-19). The stub records every interaction so
//! tests can assert invocation counts, peak transform concurrency, commit
//! batch contents, and cross-builder ordering through a shared event log.

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::{CommitError, SourceError, TransformError};
use crate::traits::{Builder, Item, ItemStream};

/// Shared event log for ordering assertions across builders.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub struct StubBuilder {
    name: String,
    sources: Vec<String>,
    targets: Vec<String>,
    chunk_size: usize,
    items: Vec<Item>,
    delays: HashMap<i64, u64>,
    failing: HashSet<i64>,
    panicking: HashSet<i64>,
    fail_source: bool,
    fail_commit: bool,
    processed: AtomicUsize,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
    commits: Mutex<Vec<Vec<Item>>>,
    events: Option<EventLog>,
}

impl StubBuilder {
    pub fn new(
        name: &str,
        sources: &[&str],
        targets: &[&str],
        chunk_size: usize,
        items: Vec<Item>,
    ) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            targets: targets.iter().map(|s| s.to_string()).collect(),
            chunk_size,
            items,
            delays: HashMap::new(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            fail_source: false,
            fail_commit: false,
            processed: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            commits: Mutex::new(Vec::new()),
            events: None,
        }
    }

    /// Builder over the numbers `0..count` with one source and one target.
    pub fn numbers(name: &str, count: i64, chunk_size: usize) -> Self {
        let items = (0..count).map(|v| json!(v)).collect();
        Self::new(name, &["source"], &["target"], chunk_size, items)
    }

    /// Sleep for `millis` inside the transform of the given item value.
    pub fn with_delay_for(mut self, value: i64, millis: u64) -> Self {
        self.delays.insert(value, millis);
        self
    }

    /// Fail the transform of the given item values.
    pub fn with_failing_values(mut self, values: &[i64]) -> Self {
        self.failing.extend(values.iter().copied());
        self
    }

    /// Panic inside the transform of the given item values.
    pub fn with_panicking_values(mut self, values: &[i64]) -> Self {
        self.panicking.extend(values.iter().copied());
        self
    }

    pub fn with_failing_source(mut self) -> Self {
        self.fail_source = true;
        self
    }

    pub fn with_failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Peak number of transforms observed running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    /// Every committed batch, in commit order.
    pub fn commits(&self) -> Vec<Vec<Item>> {
        self.commits.lock().unwrap().clone()
    }

    fn log_event(&self, event: String) {
        if let Some(events) = &self.events {
            events.lock().unwrap().push(event);
        }
    }
}

/// Decrements the running-transform counter on drop, so a panicking
/// transform still releases its slot in the accounting.
struct TransformGuard<'a> {
    concurrent: &'a AtomicUsize,
    processed: &'a AtomicUsize,
}

impl Drop for TransformGuard<'_> {
    fn drop(&mut self) {
        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Builder for StubBuilder {
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
        self.log_event(format!("{}:get_items", self.name));
        if self.fail_source {
            return Err(SourceError::new("stub source failure"));
        }
        Ok(stream::iter(self.items.clone()).boxed())
    }

    fn process_item(&self, item: Item) -> Result<Item, TransformError> {
        let running = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);
        let _guard = TransformGuard {
            concurrent: &self.concurrent,
            processed: &self.processed,
        };

        let value = item
            .as_i64()
            .ok_or_else(|| TransformError::Failed(format!("not a number: {item}")))?;
        if let Some(&millis) = self.delays.get(&value) {
            std::thread::sleep(Duration::from_millis(millis));
        }
        if self.panicking.contains(&value) {
            panic!("stub transform panic on value {value}");
        }
        if self.failing.contains(&value) {
            return Err(TransformError::Failed(format!("value {value} rejected")));
        }
        self.log_event(format!("{}:processed:{}", self.name, value));
        Ok(json!(value + 10))
    }

    async fn update_targets(&self, batch: Vec<Item>) -> Result<(), CommitError> {
        self.log_event(format!("{}:commit", self.name));
        if self.fail_commit {
            return Err(CommitError::new("stub commit failure"));
        }
        self.commits.lock().unwrap().push(batch);
        Ok(())
    }
}
