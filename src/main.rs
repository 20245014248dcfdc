//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块是缓存同步服务的入口点。

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cachesync::cli::run().await
}
