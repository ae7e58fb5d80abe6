// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{BuilderConfig, Config};
use crate::errors::ConfigError;
use crate::traits::Builder;

type BuilderFactory =
    Box<dyn Fn(&BuilderConfig) -> Result<Arc<dyn Builder>, ConfigError> + Send + Sync>;

/// Maps declared builder kinds to concrete constructors.
///
/// Configuration names a `kind` per builder; construction happens at load
/// time by looking the kind up here, so the engine itself never needs to
/// know which builder implementations exist.
#[derive(Default)]
pub struct BuilderRegistry {
    factories: HashMap<String, BuilderFactory>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a constructor for a builder kind. A later registration for
    /// the same kind replaces the earlier one.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&BuilderConfig) -> Result<Arc<dyn Builder>, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Construct every builder declared in the configuration, in declaration
    /// order.
    pub fn build(&self, config: &Config) -> Result<Vec<Arc<dyn Builder>>, ConfigError> {
        config
            .builders
            .iter()
            .map(|declared| {
                let factory =
                    self.factories
                        .get(&declared.kind)
                        .ok_or_else(|| ConfigError::UnknownKind {
                            builder: declared.name.clone(),
                            kind: declared.kind.clone(),
                        })?;
                factory(declared)
            })
            .collect()
    }
}
