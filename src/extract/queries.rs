//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 提取层使用的只读查询

use crate::source::{Column, Query};

pub const COMPANY_APP: Query = Query {
    name: "company_app",
    sql: "SELECT id, app_key, company_id, is_delete, stop, auto_event FROM company_app",
    columns: &[
        Column::int("id"),
        Column::text("app_key"),
        Column::int("company_id"),
        Column::int("is_delete"),
        Column::int("stop"),
        Column::int("auto_event"),
    ],
};

pub const TRANSFERRED_APPS: Query = Query {
    name: "tmp_transfer",
    sql: "SELECT id FROM tmp_transfer WHERE status = 2",
    columns: &[Column::int("id")],
};

pub const USER_PROP_META: Query = Query {
    name: "user_prop_meta",
    sql: "SELECT id, app_id, owner, name, is_delete, attr_type, sql_json, table_fields FROM user_prop_meta",
    columns: &[
        Column::int("id"),
        Column::int("app_id"),
        Column::text("owner"),
        Column::text("name"),
        Column::int("is_delete"),
        Column::int("attr_type"),
        Column::text("sql_json"),
        Column::text("table_fields"),
    ],
};

pub const EVENT: Query = Query {
    name: "event",
    sql: "SELECT id, app_id, owner, event_name, is_delete, is_stop FROM event",
    columns: &[
        Column::int("id"),
        Column::int("app_id"),
        Column::text("owner"),
        Column::text("event_name"),
        Column::int("is_delete"),
        Column::int("is_stop"),
    ],
};

pub const EVENT_ATTR: Query = Query {
    name: "event_attr",
    sql: "SELECT event_id, attr_id, attr_name, owner, is_delete, is_stop, \
          attr_type, alias_name, column_name, sql_json FROM event_attr",
    columns: &[
        Column::int("event_id"),
        Column::int("attr_id"),
        Column::text("attr_name"),
        Column::text("owner"),
        Column::int("is_delete"),
        Column::int("is_stop"),
        Column::int("attr_type"),
        Column::text("alias_name"),
        Column::text("column_name"),
        Column::text("sql_json"),
    ],
};

pub const SDK_HAS_DATA: Query = Query {
    name: "app",
    sql: "SELECT main_id, sdk_platform, has_data FROM app",
    columns: &[
        Column::int("main_id"),
        Column::int("sdk_platform"),
        Column::int("has_data"),
    ],
};

pub const DEVICE_PROP: Query = Query {
    name: "device_prop",
    sql: "SELECT app_id, owner, name, id FROM device_prop",
    columns: &[
        Column::int("app_id"),
        Column::text("owner"),
        Column::text("name"),
        Column::int("id"),
    ],
};

pub const EVENT_QUOTA_REACHED: Query = Query {
    name: "event_quota",
    sql: "SELECT a.id FROM company_app a, event b \
          WHERE a.is_delete = 0 AND b.is_delete = 0 AND b.owner = 'zg' AND b.is_stop = 0 AND a.id = b.app_id \
          GROUP BY a.id HAVING COUNT(*) >= MAX(a.event_sum)",
    columns: &[Column::int("id")],
};

pub const ATTR_QUOTA_REACHED: Query = Query {
    name: "attr_quota",
    sql: "SELECT b.id FROM company_app a, event b, event_attr c \
          WHERE a.is_delete = 0 AND b.is_delete = 0 AND b.is_stop = 0 \
          AND a.id = b.app_id AND b.id = c.event_id AND c.is_stop = 0 \
          GROUP BY b.id HAVING COUNT(*) >= MAX(a.attr_sum)",
    columns: &[Column::int("id")],
};

pub const UPLOAD_DATA: Query = Query {
    name: "app_data",
    sql: "SELECT app_id FROM app_data",
    columns: &[Column::int("app_id")],
};

pub const EVENT_PLATFORM: Query = Query {
    name: "event_platform",
    sql: "SELECT event_id, platform FROM event_platform",
    columns: &[Column::int("event_id"), Column::int("platform")],
};

pub const EVENT_ATTR_PLATFORM: Query = Query {
    name: "event_attr_platform",
    sql: "SELECT event_attr_id, platform FROM event_attr_platform",
    columns: &[Column::int("event_attr_id"), Column::int("platform")],
};

pub const DEVICE_PROP_PLATFORM: Query = Query {
    name: "device_prop_platform",
    sql: "SELECT prop_id, platform FROM device_prop_platform",
    columns: &[Column::int("prop_id"), Column::int("platform")],
};

pub const ADVERTISING_APP: Query = Query {
    name: "advertising_app",
    sql: "SELECT a.app_key, a.id AS app_id FROM company_app a \
          JOIN advertising_app b ON a.app_key = b.app_key \
          WHERE a.is_delete = 0 AND b.is_delete = 0 AND b.stop = 0",
    columns: &[Column::text("app_key"), Column::int("app_id")],
};

pub const ADS_LINK_CHANNEL: Query = Query {
    name: "ads_link_channel",
    sql: "SELECT link_id, event_id, channel_event FROM ads_link_event WHERE is_delete = 0",
    columns: &[
        Column::int("link_id"),
        Column::int("event_id"),
        Column::text("channel_event"),
    ],
};

pub const ADS_LINK_EVENT_ID: Query = Query {
    name: "ads_link_event_id",
    sql: "SELECT link_id, event_id FROM ads_link_event WHERE is_delete = 0",
    columns: &[Column::int("link_id"), Column::int("event_id")],
};

pub const ADS_FREQUENCY: Query = Query {
    name: "ads_frequency_first",
    sql: "SELECT event_id, link_id, zg_id FROM ads_frequency_first",
    columns: &[
        Column::int("event_id"),
        Column::int("link_id"),
        Column::text("zg_id"),
    ],
};

pub const ADS_LINK_EVENT: Query = Query {
    name: "ads_link_event",
    sql: "SELECT link_id, event_id, event_ids, channel_event, match_json, frequency, windows_time \
          FROM ads_link_event WHERE is_delete = 0",
    columns: &[
        Column::int("link_id"),
        Column::int("event_id"),
        Column::text("event_ids"),
        Column::text("channel_event"),
        Column::text("match_json"),
        Column::int("frequency"),
        Column::int("windows_time"),
    ],
};

pub const VIRTUAL_EVENT: Query = Query {
    name: "virtual_event",
    sql: "SELECT event_name, alias_name, app_id, event_json FROM virtual_event \
          WHERE is_delete = 0 AND event_status = 0",
    columns: &[
        Column::text("event_name"),
        Column::text("alias_name"),
        Column::int("app_id"),
        Column::text("event_json"),
    ],
};

pub const VIRTUAL_EVENT_APP: Query = Query {
    name: "virtual_event_app",
    sql: "SELECT app_id FROM virtual_event WHERE is_delete = 0 AND event_status = 0 GROUP BY app_id",
    columns: &[Column::int("app_id")],
};

pub const KUDU_EXCHANGE: Query = Query {
    name: "kudu_exchange",
    sql: "SELECT base_name, current_name FROM kudu_exchange",
    columns: &[Column::text("base_name"), Column::text("current_name")],
};

pub const OPEN_CDP: Query = Query {
    name: "app_custom_config",
    sql: "SELECT app_id, app_config FROM app_custom_config \
          WHERE app_config_type = 'id_mapping' AND app_config = 'true'",
    columns: &[Column::int("app_id"), Column::text("app_config")],
};

pub const YEAR_WEEK: Query = Query {
    name: "etl_yearkweek",
    sql: "SELECT day, year_week FROM etl_yearkweek",
    columns: &[Column::int("day"), Column::int("year_week")],
};

pub const BUSINESS: Query = Query {
    name: "business",
    sql: "SELECT company_id, identifier FROM business WHERE del = 0 AND state = 1",
    columns: &[Column::int("company_id"), Column::text("identifier")],
};
