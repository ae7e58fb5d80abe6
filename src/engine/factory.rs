// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{ExecutionOptions, Strategy};
use crate::engine::pipeline::PipelineProcessor;
use crate::engine::serial::SerialProcessor;
use crate::engine::worker_pool::WorkerPoolProcessor;
use crate::traits::BuildProcessor;

/// Factory for creating build processors from execution options.
pub struct ProcessorFactory;

impl ProcessorFactory {
    /// Select a processor for the configured worker count and strategy.
    ///
    /// An effective worker count of 0 or 1 always yields the serial model;
    /// anything above that yields the configured parallel strategy.
    pub fn from_options(options: &ExecutionOptions) -> Box<dyn BuildProcessor> {
        let workers = options.effective_workers();
        if workers <= 1 {
            return Box::new(SerialProcessor::new(options.error_policy));
        }
        match options.strategy {
            Strategy::WorkerPool => Box::new(WorkerPoolProcessor::new(
                workers,
                options.in_flight_multiplier,
                options.error_policy,
            )),
            Strategy::Pipeline => Box::new(PipelineProcessor::new(
                workers,
                options.in_flight_multiplier,
                options.error_policy,
            )),
        }
    }
}
