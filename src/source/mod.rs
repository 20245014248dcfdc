//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 关系型数据源访问层
//!
//! 数据源只通过一个窄接口被使用：执行查询 Q，得到包含列 C 的行。

pub mod sql;

use crate::error::Result;
use async_trait::async_trait;
use std::borrow::Cow;
use std::collections::HashMap;

pub use sql::SeaOrmSource;

/// 列的读取类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
}

/// 查询声明的列
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Int,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
        }
    }
}

/// 只读查询：SQL文本及其结果列
#[derive(Debug, Clone, Copy)]
pub struct Query {
    /// 用于日志和指标的短名称
    pub name: &'static str,
    pub sql: &'static str,
    pub columns: &'static [Column],
}

/// 单元格值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Null,
}

/// 结果行，按列名访问
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<&'static str, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以列名/值对构造行，主要用于测试和内存数据源
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, column: &'static str, value: Value) {
        self.values.insert(column, value);
    }

    /// 读取整数列，NULL或缺失时为0
    pub fn int(&self, column: &str) -> i64 {
        match self.values.get(column) {
            Some(Value::Int(v)) => *v,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// 读取文本列，NULL或缺失时为None
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.values.get(column) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 读取文本列用于拼接键，NULL渲染为 `null`
    pub fn text_or_null(&self, column: &str) -> Cow<'_, str> {
        match self.values.get(column) {
            Some(Value::Text(s)) => Cow::Borrowed(s.as_str()),
            Some(Value::Int(v)) => Cow::Owned(v.to_string()),
            _ => Cow::Borrowed("null"),
        }
    }
}

/// 数据源读取器
///
/// 不跨周期持有任何状态；实现必须允许并发调用。
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// 执行只读查询并返回全部行
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>>;

    /// 存活检查
    async fn ping(&self) -> Result<()>;
}
