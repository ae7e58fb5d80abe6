// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Builder dependency graph derived from source/target collection overlap.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::traits::Builder;

/// Newtype wrapper mapping a builder index to the indices it depends on.
///
/// An edge `i -> j` exists iff `sources(i)` intersects `targets(j)` and
/// `i != j`. Only builders with at least one dependency appear as keys. The
/// graph is built once per run and immutable thereafter; it is keyed on
/// direct overlap only, with no transitive closure and no cycle-breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph(pub HashMap<usize, Vec<usize>>);

impl DependencyGraph {
    /// Derive the graph from an ordered list of builders. Pure; no side
    /// effects. Cycles are not detected here but at traversal time.
    pub fn from_builders(builders: &[Arc<dyn Builder>]) -> Self {
        let mut graph = HashMap::new();
        for (i, builder) in builders.iter().enumerate() {
            let sources: HashSet<&String> = builder.sources().iter().collect();
            let mut dependencies = Vec::new();
            for (j, other) in builders.iter().enumerate() {
                if i == j {
                    continue;
                }
                if other.targets().iter().any(|target| sources.contains(target)) {
                    dependencies.push(j);
                }
            }
            if !dependencies.is_empty() {
                graph.insert(i, dependencies);
            }
        }
        Self(graph)
    }

    /// Direct dependencies of a builder, empty if it has none.
    pub fn dependencies(&self, index: usize) -> &[usize] {
        self.0.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compute a deterministic execution order using Kahn's algorithm.
    ///
    /// Builders with no dependencies come first, in declaration order; ties
    /// are broken by index. A cycle is a fatal configuration error reported
    /// as [`ExecutionError::CycleDetected`] naming the builders stuck in it.
    pub fn topological_order(
        &self,
        builders: &[Arc<dyn Builder>],
    ) -> Result<Vec<usize>, ExecutionError> {
        let n = builders.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (&index, dependencies) in &self.0 {
            in_degree[index] = dependencies.len();
            for &dependency in dependencies {
                dependents[dependency].push(index);
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != n {
            let ordered: HashSet<usize> = order.iter().copied().collect();
            let remaining = (0..n)
                .filter(|i| !ordered.contains(i))
                .map(|i| builders[i].name().to_string())
                .collect();
            return Err(ExecutionError::CycleDetected { remaining });
        }

        Ok(order)
    }
}
