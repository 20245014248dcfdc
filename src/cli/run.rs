//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步周期命令的实现。

use crate::cli::RunArgs;
use crate::manager::SyncManager;
use crate::metrics::get_metrics_string;
use anyhow::{bail, Result};
use tracing::{error, info};

pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let fail_on_partial = config.sync.fail_on_partial_failure;

    let manager = SyncManager::init(config).await?;
    let summary = match manager.run_once().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Cache sync failed: {}", e);
            return Err(e.into());
        }
    };

    if args.metrics {
        println!("{}", get_metrics_string());
    }

    if fail_on_partial && !summary.is_success() {
        bail!(
            "{} of {} units failed",
            summary.failed_count(),
            summary.results.len()
        );
    }

    info!("Cache sync finished with status {}", summary.status);
    Ok(())
}
