//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 发布数据集：字符串到字符串的哈希，或字符串集合。

use crate::error::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// 缓存单元的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Hash,
    Set,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Hash => write!(f, "hash"),
            Shape::Set => write!(f, "set"),
        }
    }
}

/// 一次同步产生的完整数据集
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataset {
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

impl Dataset {
    /// 由任意可显示的键值对构建哈希数据集
    pub fn hash<K, V, I>(entries: I) -> Self
    where
        K: Display,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        Dataset::Hash(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// 由任意可显示的成员构建集合数据集
    pub fn set<T, I>(members: I) -> Self
    where
        T: Display,
        I: IntoIterator<Item = T>,
    {
        Dataset::Set(members.into_iter().map(|m| m.to_string()).collect())
    }

    /// 哈希值为对象的JSON文本
    pub fn json_values<'a, T, I>(entries: I) -> Result<Self>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a String, &'a T)>,
    {
        let mut map = HashMap::new();
        for (key, value) in entries {
            map.insert(key.clone(), serde_json::to_string(value)?);
        }
        Ok(Dataset::Hash(map))
    }

    /// 哈希值为列表的JSON数组，数组元素是每个对象的JSON文本
    ///
    /// 即 `["{\"name\":\"a\"}", ...]`，下游按此格式解析。
    pub fn json_lists<'a, T, I>(entries: I) -> Result<Self>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a String, &'a Vec<T>)>,
    {
        let mut map = HashMap::new();
        for (key, items) in entries {
            let encoded = items
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            map.insert(key.clone(), serde_json::to_string(&encoded)?);
        }
        Ok(Dataset::Hash(map))
    }

    pub fn shape(&self) -> Shape {
        match self {
            Dataset::Hash(_) => Shape::Hash,
            Dataset::Set(_) => Shape::Set,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Hash(map) => map.len(),
            Dataset::Set(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
