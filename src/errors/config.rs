// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can occur while loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("builder '{builder}': chunk_size must be at least 1")]
    ZeroChunkSize { builder: String },

    #[error("duplicate builder name '{0}'")]
    DuplicateName(String),

    #[error("unknown builder kind '{kind}' for builder '{builder}'")]
    UnknownKind { builder: String, kind: String },

    #[error("builder '{builder}': {message}")]
    InvalidBuilder { builder: String, message: String },
}
