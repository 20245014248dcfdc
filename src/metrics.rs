//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎的指标收集功能。

use crate::sync::{CycleStatus, SyncResult};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{span, Level};

/// 指标收集器
///
/// 用于收集和存储同步引擎的运行时指标
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 单元最近一次发布的记录数
    /// key: 单元名称
    pub unit_records: Arc<Mutex<HashMap<String, u64>>>,
    /// 单元执行次数统计
    /// key: "unit:result"，result 为 success/failure
    pub unit_runs_total: Arc<Mutex<HashMap<String, u64>>>,
    /// 单元耗时（累积时间和次数，用于计算平均值）
    /// key: 单元名称 -> (total_duration_secs, count)
    pub unit_duration: Arc<Mutex<HashMap<String, (f64, u64)>>>,
    /// 周期次数统计，key: 周期状态
    pub cycles_total: Arc<Mutex<HashMap<String, u64>>>,
    /// 最近一个周期的耗时（秒）
    pub last_cycle_seconds: Arc<Mutex<f64>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Metrics {
    /// 记录单元执行结果
    ///
    /// # 参数
    ///
    /// * `result` - 单元的同步结果
    pub fn record_unit(&self, result: &SyncResult) {
        let outcome = if result.success { "success" } else { "failure" };
        let span = span!(Level::DEBUG, "sync_unit", unit = %result.name, outcome);
        let _enter = span.enter();

        *lock(&self.unit_runs_total)
            .entry(format!("{}:{}", result.name, outcome))
            .or_insert(0) += 1;

        if result.success {
            lock(&self.unit_records).insert(result.name.clone(), result.record_count);
        }

        let mut durations = lock(&self.unit_duration);
        let entry = durations.entry(result.name.clone()).or_insert((0.0, 0));
        entry.0 += result.elapsed.as_secs_f64();
        entry.1 += 1;
    }

    /// 记录周期完成
    pub fn record_cycle(&self, status: CycleStatus, duration_secs: f64) {
        *lock(&self.cycles_total)
            .entry(status.as_str().to_string())
            .or_insert(0) += 1;
        *lock(&self.last_cycle_seconds) = duration_secs;
    }

    /// 记录因超时或调度失败而中止的周期
    pub fn record_aborted_cycle(&self) {
        *lock(&self.cycles_total)
            .entry("ABORTED".to_string())
            .or_insert(0) += 1;
    }

    /// 清空所有指标
    pub fn reset(&self) {
        lock(&self.unit_records).clear();
        lock(&self.unit_runs_total).clear();
        lock(&self.unit_duration).clear();
        lock(&self.cycles_total).clear();
        *lock(&self.last_cycle_seconds) = 0.0;
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为文本返回，用于监控系统采集
///
/// # 返回值
///
/// 返回包含所有指标的字符串
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;
    let records = lock(&metrics.unit_records);
    let runs = lock(&metrics.unit_runs_total);
    let dur = lock(&metrics.unit_duration);
    let cycles = lock(&metrics.cycles_total);
    let last = *lock(&metrics.last_cycle_seconds);

    let mut output = String::new();
    for (k, v) in sorted(&records) {
        output.push_str(&format!("cachesync_unit_records{{unit=\"{}\"}} {}\n", k, v));
    }
    for (k, v) in sorted(&runs) {
        if let Some((unit, result)) = k.rsplit_once(':') {
            output.push_str(&format!(
                "cachesync_unit_runs_total{{unit=\"{}\", result=\"{}\"}} {}\n",
                unit, result, v
            ));
        }
    }
    for (k, (total, count)) in sorted(&dur) {
        output.push_str(&format!(
            "cachesync_unit_duration_seconds_sum{{unit=\"{}\"}} {}\n",
            k, total
        ));
        output.push_str(&format!(
            "cachesync_unit_duration_seconds_count{{unit=\"{}\"}} {}\n",
            k, count
        ));
    }
    for (k, v) in sorted(&cycles) {
        output.push_str(&format!("cachesync_cycles_total{{status=\"{}\"}} {}\n", k, v));
    }
    output.push_str(&format!("cachesync_last_cycle_seconds {}\n", last));
    output
}

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
