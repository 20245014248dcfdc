//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了周期状态查询命令的实现。

use crate::cli::ConfigArgs;
use crate::store::{KvStore, RedisStore};
use crate::sync::{CycleMarker, CycleStatus};
use anyhow::{Context, Result};

pub async fn execute(args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;
    let store = RedisStore::connect(&config.store)
        .await
        .context("Failed to connect to store")?;

    match CycleMarker::read(&store as &dyn KvStore).await? {
        Some(marker) => print_marker(&marker),
        None => println!("No synchronization cycle has been recorded."),
    }
    Ok(())
}

fn print_marker(marker: &CycleMarker) {
    let status = match marker.status {
        CycleStatus::Running => "🔄 RUNNING",
        CycleStatus::Success => "✅ SUCCESS",
        CycleStatus::PartialFailure => "⚠️ PARTIAL_FAILURE",
    };

    println!("=== Cache Sync Status ===\n");
    println!("Status:    {}", status);
    println!("Timestamp: {}", marker.timestamp);
    match marker.version {
        Some(version) => println!("Version:   {}", version),
        None => println!("Version:   -"),
    }
}
