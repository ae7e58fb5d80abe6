// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Result;
use serde_json::json;
use std::env;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use conveyor::backends::memory::{register_map_builder, MemoryStore};
use conveyor::config::{load_config, BuilderRegistry, Config};
use conveyor::runner::{BuildState, Runner};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let store = MemoryStore::new();
    let config = match args.get(1) {
        Some(path) => load_config(path)?,
        None => {
            // No config supplied: run the built-in demo over a seeded store.
            store
                .update(
                    "raw",
                    (0..10).map(|i| json!({"key": i, "value": i})).collect(),
                )
                .await;
            demo_config()?
        }
    };

    let mut registry = BuilderRegistry::new();
    register_map_builder(&mut registry, store.clone());
    let builders = registry.build(&config)?;

    println!("Conveyor build run");
    println!("==================");
    println!("Strategy: {:?}", config.execution.strategy);
    println!("Workers:  {}", config.execution.effective_workers());
    println!("Builders: {}", builders.len());
    println!();

    let start = Instant::now();
    let report = Runner::new(builders, config.execution.clone()).run().await?;
    let elapsed = start.elapsed();

    println!("Results:");
    for build in &report.builds {
        let state = match build.state {
            BuildState::Completed => "completed",
            BuildState::Failed => "FAILED",
            BuildState::Skipped => "skipped",
        };
        println!(
            "  {} [{}] items={} commits={} warnings={}",
            build.builder,
            state,
            build.items,
            build.commits,
            build.warnings.len()
        );
        for error in &build.errors {
            println!("    error: {}", error);
        }
    }
    println!();
    println!("Final collection size: {}", store.count("final").await);
    println!("Elapsed: {:?}", elapsed);

    if report.failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Two chained map builders over the seeded `raw` collection.
fn demo_config() -> Result<Config> {
    let config: Config = serde_yaml::from_str(
        r#"
execution:
  strategy: worker_pool
  num_workers: 4
builders:
  - name: "normalize"
    kind: map
    sources: ["raw"]
    targets: ["normalized"]
    chunk_size: 4
    params:
      increment: 10
  - name: "enrich"
    kind: map
    sources: ["normalized"]
    targets: ["final"]
    chunk_size: 4
    params:
      increment: 100
"#,
    )?;
    Ok(config)
}
