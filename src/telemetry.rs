//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志初始化功能。

use tracing_subscriber::EnvFilter;

/// 默认日志级别
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// 初始化全局日志订阅器
///
/// 此函数应该在程序启动时调用一次。`RUST_LOG` 优先于 `default_level`。
/// 重复调用不会报错，后续调用被忽略。
///
/// # 参数
///
/// * `default_level` - 未设置 `RUST_LOG` 时使用的过滤规则
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
