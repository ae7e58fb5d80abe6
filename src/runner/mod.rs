// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Top-level orchestration: run a set of builders in dependency order.
//!
//! The runner derives the dependency graph from source/target overlap,
//! computes a topological order, and drives each builder through the
//! configured processor strategy. A builder failure does not stop the run;
//! its transitive dependents are skipped and every other builder still
//! executes. Only a dependency cycle is fatal, and it is detected before any
//! builder runs.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ExecutionOptions;
use crate::engine::ProcessorFactory;
use crate::errors::ExecutionError;
use crate::graph::DependencyGraph;
use crate::observability::{BuildEvent, LogReporter, Reporter};
use crate::traits::Builder;

/// Terminal state of one builder within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Completed,
    Failed,
    /// Not executed because a dependency (direct or transitive) failed.
    Skipped,
}

/// Per-builder outcome recorded in the [`RunReport`].
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub builder: String,
    pub state: BuildState,
    pub items: usize,
    pub commits: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of a whole run, one summary per builder in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub builds: Vec<BuildSummary>,
}

impl RunReport {
    /// True when any builder failed or was skipped.
    pub fn failed(&self) -> bool {
        self.builds
            .iter()
            .any(|build| build.state != BuildState::Completed)
    }

    pub fn summary(&self, builder: &str) -> Option<&BuildSummary> {
        self.builds.iter().find(|build| build.builder == builder)
    }
}

/// Drives a set of builders to completion in dependency order.
pub struct Runner {
    builders: Vec<Arc<dyn Builder>>,
    options: ExecutionOptions,
    reporter: Arc<dyn Reporter>,
}

impl Runner {
    pub fn new(builders: Vec<Arc<dyn Builder>>, options: ExecutionOptions) -> Self {
        Self {
            builders,
            options,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Execute every builder. Returns `Err` only for a dependency cycle;
    /// individual builder failures are recorded in the report instead.
    pub async fn run(&self) -> Result<RunReport, ExecutionError> {
        let graph = DependencyGraph::from_builders(&self.builders);
        let order = graph.topological_order(&self.builders)?;

        info!(builders = self.builders.len(), "starting run");

        let mut failed: HashSet<usize> = HashSet::new();
        let mut summaries: Vec<Option<BuildSummary>> = vec![None; self.builders.len()];
        for index in order {
            let builder = Arc::clone(&self.builders[index]);
            let name = builder.name().to_string();

            if let Some(&dependency) = graph
                .dependencies(index)
                .iter()
                .find(|dependency| failed.contains(*dependency))
            {
                let dependency = self.builders[dependency].name();
                warn!(builder = %name, dependency = %dependency, "skipping builder, dependency failed");
                failed.insert(index);
                summaries[index] = Some(BuildSummary {
                    builder: name,
                    state: BuildState::Skipped,
                    items: 0,
                    commits: 0,
                    errors: vec![format!("dependency '{dependency}' failed")],
                    warnings: Vec::new(),
                });
                continue;
            }

            self.reporter.report(&BuildEvent::Started {
                builder: name.clone(),
                sources: builder.sources().to_vec(),
                targets: builder.targets().to_vec(),
            });

            let processor = ProcessorFactory::from_options(&self.options);
            let summary = match processor.process(builder, Arc::clone(&self.reporter)).await {
                Ok(report) => {
                    self.reporter.report(&BuildEvent::Ended {
                        builder: name.clone(),
                        errors: 0,
                        warnings: report.warnings.len(),
                    });
                    BuildSummary {
                        builder: name,
                        state: BuildState::Completed,
                        items: report.items,
                        commits: report.commits,
                        errors: Vec::new(),
                        warnings: report.warnings,
                    }
                }
                Err(err) => {
                    warn!(builder = %name, error = %err, "builder failed");
                    self.reporter.report(&BuildEvent::Ended {
                        builder: name.clone(),
                        errors: 1,
                        warnings: 0,
                    });
                    failed.insert(index);
                    BuildSummary {
                        builder: name,
                        state: BuildState::Failed,
                        items: 0,
                        commits: 0,
                        errors: vec![err.to_string()],
                        warnings: Vec::new(),
                    }
                }
            };
            summaries[index] = Some(summary);
        }

        Ok(RunReport {
            builds: summaries.into_iter().flatten().collect(),
        })
    }
}
