//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 合并视图
//!
//! 每个视图由一次物理扫描构建，构建后只读，可被多个缓存单元并发读取。

use super::records::{VirtualAttrDef, VirtualPropDef};
use crate::source::Row;
use std::collections::{HashMap, HashSet};

/// 应用维度视图，来自 `company_app` 与 `tmp_transfer`
#[derive(Debug, Clone, Default)]
pub struct CompanyAppView {
    /// app_key → 应用id，仅有效且未迁移的应用
    pub app_key_app_id: HashMap<String, i64>,
    /// 应用id → 公司id，包含所有行
    pub cid_by_aid: HashMap<String, String>,
    /// 关闭自动建事件的有效应用
    pub none_auto_create: HashSet<i64>,
    pub valid_app_ids: HashSet<i64>,
}

impl CompanyAppView {
    pub fn from_rows(transferred: &[Row], rows: &[Row]) -> Self {
        let transferred: HashSet<i64> = transferred.iter().map(|r| r.int("id")).collect();
        let mut view = Self::default();

        for row in rows {
            let id = row.int("id");
            view.cid_by_aid
                .insert(id.to_string(), row.int("company_id").to_string());

            if row.int("is_delete") != 0 || row.int("stop") != 0 {
                continue;
            }
            view.valid_app_ids.insert(id);
            if let Some(app_key) = row.text("app_key") {
                if !transferred.contains(&id) {
                    view.app_key_app_id.insert(app_key.to_string(), id);
                }
            }
            if row.int("auto_event") == 0 {
                view.none_auto_create.insert(id);
            }
        }
        view
    }
}

/// 用户属性视图，来自 `user_prop_meta`
#[derive(Debug, Clone, Default)]
pub struct UserPropView {
    /// `{app_id}_{owner}_{UPPER(name)}` → 属性id
    pub prop_id: HashMap<String, i64>,
    /// `{app_id}_{owner}_{id}` → 原始大小写的属性名
    pub prop_id_original: HashMap<String, String>,
    pub black_props: HashSet<i64>,
    /// `{app_id}` → 虚拟属性定义
    pub virtual_props: HashMap<String, Vec<VirtualPropDef>>,
    pub virtual_prop_app_ids: HashSet<String>,
}

impl UserPropView {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut view = Self::default();

        for row in rows {
            let id = row.int("id");
            let app_id = row.int("app_id");
            let owner = row.text_or_null("owner");
            let name = row.text("name");
            let is_delete = row.int("is_delete");

            if let Some(name) = name {
                view.prop_id
                    .insert(format!("{}_{}_{}", app_id, owner, fold_case(name)), id);
                view.prop_id_original
                    .insert(format!("{}_{}_{}", app_id, owner, id), name.to_string());
            }

            if is_delete == 1 {
                view.black_props.insert(id);
            }

            if let (1, 0, Some(name)) = (row.int("attr_type"), is_delete, name) {
                view.virtual_prop_app_ids.insert(app_id.to_string());
                view.virtual_props
                    .entry(app_id.to_string())
                    .or_default()
                    .push(VirtualPropDef {
                        name: name.to_string(),
                        define: row.text("sql_json").map(str::to_string),
                        table_fields: row.text("table_fields").map(str::to_string),
                    });
            }
        }
        view
    }
}

/// 事件的基本信息，供属性视图关联
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub app_id: i64,
    pub event_name: Option<String>,
    pub owner: Option<String>,
    /// 未删除
    pub valid: bool,
}

/// 事件视图，来自 `event`
#[derive(Debug, Clone, Default)]
pub struct EventView {
    /// `{app_id}_{owner}_{event_name}` → 事件id，名称保留原始大小写
    pub event_id: HashMap<String, i64>,
    pub black_events: HashSet<i64>,
    pub event_info: HashMap<i64, EventInfo>,
}

impl EventView {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut view = Self::default();

        for row in rows {
            let id = row.int("id");
            let app_id = row.int("app_id");
            let is_delete = row.int("is_delete");
            let event_name = row.text("event_name");

            if let Some(name) = event_name {
                view.event_id.insert(
                    format!("{}_{}_{}", app_id, row.text_or_null("owner"), name),
                    id,
                );
            }
            if is_delete == 1 || row.int("is_stop") == 1 {
                view.black_events.insert(id);
            }
            view.event_info.insert(
                id,
                EventInfo {
                    app_id,
                    event_name: event_name.map(str::to_string),
                    owner: row.text("owner").map(str::to_string),
                    valid: is_delete == 0,
                },
            );
        }
        view
    }
}

/// 事件属性视图，来自 `event_attr`，依赖事件视图和应用视图
#[derive(Debug, Clone, Default)]
pub struct EventAttrView {
    /// `{app_id}_{event_id}_{owner}_{UPPER(attr_name)}` → 属性id
    pub attr_id: HashMap<String, i64>,
    /// 删除或停用的非虚拟属性
    pub black_attrs: HashSet<i64>,
    /// `{app_id}_{event_owner}_{event_name}_{attr_name}` → 别名
    pub attr_alias: HashMap<String, String>,
    /// `{event_id}_{attr_id}` → 列名
    pub attr_column: HashMap<String, String>,
    /// `{app_id}_eP_{event_name}` → 虚拟属性定义
    pub virtual_event_props: HashMap<String, Vec<VirtualAttrDef>>,
    pub virtual_attr_ids: HashSet<String>,
    pub virtual_prop_app_ids: HashSet<String>,
}

impl EventAttrView {
    pub fn from_rows(events: &EventView, apps: &CompanyAppView, rows: &[Row]) -> Self {
        let mut view = Self::default();

        for row in rows {
            let event_id = row.int("event_id");
            let Some(event) = events.event_info.get(&event_id) else {
                continue;
            };
            let app_id = event.app_id;
            let event_name = event.event_name.as_deref().unwrap_or("null");
            let attr_id = row.int("attr_id");
            let attr_name = row.text("attr_name");
            let attr_type = row.int("attr_type");
            let is_delete = row.int("is_delete");

            if let Some(column) = row.text("column_name") {
                view.attr_column
                    .insert(format!("{}_{}", event_id, attr_id), column.to_string());
            }

            if let Some(name) = attr_name {
                if apps.valid_app_ids.contains(&app_id) {
                    view.attr_id.insert(
                        format!(
                            "{}_{}_{}_{}",
                            app_id,
                            event_id,
                            row.text_or_null("owner"),
                            fold_case(name)
                        ),
                        attr_id,
                    );
                }
            }

            if (is_delete == 1 || row.int("is_stop") == 1) && attr_type != 1 {
                view.black_attrs.insert(attr_id);
            }

            if let Some(alias) = row.text("alias_name").filter(|a| !a.is_empty()) {
                if event.valid {
                    view.attr_alias.insert(
                        format!(
                            "{}_{}_{}_{}",
                            app_id,
                            event.owner.as_deref().unwrap_or("null"),
                            event_name,
                            attr_name.unwrap_or("null")
                        ),
                        alias.to_string(),
                    );
                }
            }

            if attr_type == 1 && is_delete == 0 {
                view.virtual_attr_ids.insert(attr_id.to_string());
                view.virtual_prop_app_ids.insert(app_id.to_string());
                view.virtual_event_props
                    .entry(format!("{}_eP_{}", app_id, event_name))
                    .or_default()
                    .push(VirtualAttrDef {
                        name: attr_name.map(str::to_string),
                        define: row.text("sql_json").map(str::to_string),
                    });
            }
        }
        view
    }
}

/// 名称大小写折叠，用于不区分大小写的查找键
pub fn fold_case(name: &str) -> String {
    name.to_uppercase()
}
