// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in builders and stores
pub mod config;     // config + registry
pub mod engine;     // build processors
pub mod errors;     // error handling
pub mod graph;      // builder dependency graph
pub mod observability;
pub mod runner;     // top-level orchestration
pub mod traits;     // unified abstractions
