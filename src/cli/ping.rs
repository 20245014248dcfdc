//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了连通性检查命令的实现。

use crate::cli::ConfigArgs;
use crate::manager::SyncManager;
use anyhow::Result;

pub async fn execute(args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;
    // init 内部已完成存活检查
    let manager = SyncManager::init(config).await?;

    println!("Source: ✅ reachable");
    println!(
        "Store:  ✅ reachable ({:?} mode)",
        manager.config().store.mode
    );
    Ok(())
}
