// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod builder;
pub mod processor;

pub use builder::{Builder, Item, ItemStream};
pub use processor::{BuildProcessor, BuildReport};
