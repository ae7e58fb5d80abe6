// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::{ConfigError, ErrorPolicy};

/// Complete configuration for one engine run, typically loaded from a YAML
/// file.
///
/// # Example
/// ```yaml
/// execution:
///   strategy: worker_pool
///   num_workers: 4
///   in_flight_multiplier: 2
///   error_policy: skip_failed
/// builders:
///   - name: "normalize"
///     kind: map
///     sources: ["raw"]
///     targets: ["normalized"]
///     chunk_size: 500
///     params:
///       increment: 10
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub execution: ExecutionOptions,
    pub builders: Vec<BuilderConfig>,
}

/// Parallel strategy used when the effective worker count is above 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Semaphore-bounded worker pool with a dedicated flush consumer.
    WorkerPool,
    /// Cooperative backpressure-gated pipeline, single coordinating flow.
    Pipeline,
}

/// Options controlling how each builder's item pipeline executes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    pub strategy: Strategy,
    /// Worker count; 0 or 1 selects the serial model. Unset defaults to the
    /// number of available CPU cores.
    pub num_workers: Option<usize>,
    /// In-flight capacity is `num_workers * in_flight_multiplier`.
    pub in_flight_multiplier: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::WorkerPool,
            num_workers: None,
            in_flight_multiplier: 2,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ExecutionOptions {
    /// Configured worker count, or the number of available CPU cores when
    /// unset (falling back to 4 if detection fails).
    pub fn effective_workers(&self) -> usize {
        self.num_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

/// Declaration of one builder: a kind resolved through the
/// [`crate::config::BuilderRegistry`] plus the contract fields every builder
/// carries.
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Kind-specific parameters, passed through to the factory untouched.
    #[serde(default)]
    pub params: serde_yaml::Value,
}

fn default_chunk_size() -> usize {
    1000
}

/// Load and validate a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    let config: Config = serde_yaml::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for builder in &config.builders {
        if builder.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize {
                builder: builder.name.clone(),
            });
        }
        if !seen.insert(builder.name.as_str()) {
            return Err(ConfigError::DuplicateName(builder.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"
execution:
  strategy: pipeline
  num_workers: 4
  in_flight_multiplier: 3
  error_policy: abort_chunk
builders:
  - name: "normalize"
    kind: map
    sources: ["raw"]
    targets: ["normalized"]
    chunk_size: 500
    params:
      increment: 10
"#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.execution.strategy, Strategy::Pipeline);
        assert_eq!(config.execution.num_workers, Some(4));
        assert_eq!(config.execution.in_flight_multiplier, 3);
        assert_eq!(config.execution.error_policy, ErrorPolicy::AbortChunk);
        assert_eq!(config.builders.len(), 1);
        assert_eq!(config.builders[0].name, "normalize");
        assert_eq!(config.builders[0].sources, vec!["raw"]);
        assert_eq!(config.builders[0].chunk_size, 500);
    }

    #[test]
    fn execution_section_is_optional() {
        let file = write_config(
            r#"
builders:
  - name: "copy"
    kind: map
    sources: ["a"]
    targets: ["b"]
"#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.execution.strategy, Strategy::WorkerPool);
        assert_eq!(config.execution.in_flight_multiplier, 2);
        assert_eq!(config.builders[0].chunk_size, 1000);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let file = write_config(
            r#"
builders:
  - name: "broken"
    kind: map
    chunk_size: 0
"#,
        );

        let result = load_config(file.path());

        assert!(matches!(result, Err(ConfigError::ZeroChunkSize { .. })));
    }

    #[test]
    fn duplicate_builder_names_are_rejected() {
        let file = write_config(
            r#"
builders:
  - name: "twice"
    kind: map
  - name: "twice"
    kind: map
"#,
        );

        let result = load_config(file.path());

        assert!(matches!(result, Err(ConfigError::DuplicateName(name)) if name == "twice"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_config("builders: [unclosed");

        let result = load_config(file.path());

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
