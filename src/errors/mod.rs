// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod config;
mod execution;

pub use build::{CommitError, SourceError, TransformError};
pub use config::ConfigError;
pub use execution::{ErrorPolicy, ExecutionError};
