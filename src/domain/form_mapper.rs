//! # 表单值映射
//!
//! ## 业务说明
//! - 线上记录 → 会话：四个可空字符串的 `None` 映射为 `""`
//! - 会话 → 线上记录：去除空白后为空的字符串映射回 `None`
//! - 解析器子树映射：只提取 Easy Serial 解析器设置，供解析器测试使用，
//!   容忍填写了一半的行，从不失败
//!
//! 记录ID随映射一同传递：对可空字符串为 `None` 或非空白的记录，
//! `wire_to_session(r)` 得到 `(values, id)`，`session_to_wire(&values, id) == r`。

use serde_json::Value;

use crate::models::{
    EasySerialParserSettings, FormValues, LoggerRecord, ParsedFieldConfig, ParsedFieldKind,
};

/// 线上记录 → 会话值与记录ID
///
/// 记录ID不进入表单值，由编辑会话单独持有
pub fn wire_to_session(record: &LoggerRecord) -> (FormValues, Option<i64>) {
    let values = FormValues {
        name: record.name.clone(),
        autostart: record.autostart,
        enabled: record.enabled,
        db_user: record.db_user.clone().unwrap_or_default(),
        db_password: record.db_password.clone().unwrap_or_default(),
        table_name: record.table_name.clone().unwrap_or_default(),
        query_template: record.query_template.clone().unwrap_or_default(),
        config: record.config.clone(),
    };
    (values, record.id)
}

/// 会话值与记录ID → 线上记录
pub fn session_to_wire(values: &FormValues, id: Option<i64>) -> LoggerRecord {
    LoggerRecord {
        id,
        name: values.name.clone(),
        autostart: values.autostart,
        enabled: values.enabled,
        db_user: blank_to_none(&values.db_user),
        db_password: blank_to_none(&values.db_password),
        table_name: blank_to_none(&values.table_name),
        query_template: blank_to_none(&values.query_template),
        config: values.config.clone(),
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn coerce_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn string_setting(subtree: &Value, key: &str, default: String) -> String {
    subtree
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(default)
}

/// 从表单子树中提取解析器测试设置
///
/// - `index` 接受数字或数字字符串，无法转换的行被跳过
/// - 缺少名称的行名称为 `""`
/// - 空的 `format` 映射为 `None`
/// - 缺失的标量设置使用默认值
pub fn parser_settings_for_test(subtree: &Value) -> EasySerialParserSettings {
    let defaults = EasySerialParserSettings::default();

    let preamble = match subtree.get("preamble") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => defaults.preamble,
    };

    let fields = subtree
        .get("fields")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .enumerate()
                .filter_map(|(row, field)| {
                    let index = match field.get("index").and_then(coerce_index) {
                        Some(index) => index,
                        None => {
                            log::debug!("解析器测试跳过第 {} 行：字段下标无法转换为整数", row);
                            return None;
                        }
                    };
                    let kind = field
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse::<ParsedFieldKind>().ok())
                        .unwrap_or_default();
                    let format = field
                        .get("format")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);

                    Some(ParsedFieldConfig {
                        index,
                        name: field.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                        kind,
                        format,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    EasySerialParserSettings {
        preamble,
        terminator: string_setting(subtree, "terminator", defaults.terminator),
        separator: string_setting(subtree, "separator", defaults.separator),
        encoding: string_setting(subtree, "encoding", defaults.encoding),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::build_default_record;
    use crate::models::{LoggerType, TypeConfig};
    use serde_json::json;

    fn round_trip(record: &LoggerRecord) -> LoggerRecord {
        let (values, id) = wire_to_session(record);
        session_to_wire(&values, id)
    }

    #[test]
    fn test_round_trip_for_every_default_record() {
        for t in LoggerType::ALL {
            let record = build_default_record(t).unwrap();
            let (values, id) = wire_to_session(&record);
            assert_eq!(values.db_user, "");
            assert_eq!(id, None);
            assert_eq!(session_to_wire(&values, id), record);
        }
    }

    #[test]
    fn test_round_trip_keeps_persisted_id_and_filled_strings() {
        for t in LoggerType::ALL {
            let mut record = build_default_record(t).unwrap();
            record.id = Some(7);
            record.name = "Scale 7".to_string();
            record.enabled = true;
            record.db_user = Some("writer".to_string());
            record.db_password = Some("secret".to_string());
            record.table_name = Some("weights".to_string());
            record.query_template = Some("INSERT INTO t VALUES ({sn})".to_string());

            let (values, id) = wire_to_session(&record);
            assert_eq!(id, Some(7));
            assert_eq!(values.db_user, "writer");
            assert_eq!(round_trip(&record), record);
        }
    }

    #[test]
    fn test_blank_strings_become_none() {
        let (mut values, _) = wire_to_session(&build_default_record(LoggerType::Mbox).unwrap());
        values.db_user = "   ".to_string();
        values.table_name = "weights".to_string();
        values.query_template = String::new();

        let record = session_to_wire(&values, Some(3));
        assert_eq!(record.id, Some(3));
        assert_eq!(record.db_user, None);
        assert_eq!(record.table_name.as_deref(), Some("weights"));
        assert_eq!(record.query_template, None);

        // 归一化是幂等的
        assert_eq!(round_trip(&record), record);
    }

    #[test]
    fn test_parser_subtree_tolerates_half_filled_rows() {
        let settings = parser_settings_for_test(&json!({
            "separator": ",",
            "fields": [
                {"index": "2", "name": "weight", "type": "float", "format": ""},
                {"index": "", "name": "broken"},
                {"index": 4},
                {"index": 1.0, "name": "ts", "type": "datetime", "format": "%Y-%m-%d"}
            ]
        }));

        assert_eq!(settings.separator, ",");
        assert_eq!(settings.terminator, "\n");
        assert_eq!(settings.encoding, "utf-8");
        assert_eq!(settings.fields.len(), 3);
        assert_eq!(settings.fields[0].index, 2);
        assert_eq!(settings.fields[0].format, None);
        assert_eq!(settings.fields[1].name, "");
        assert_eq!(settings.fields[1].kind, ParsedFieldKind::String);
        assert_eq!(settings.fields[2].index, 1);
        assert_eq!(settings.fields[2].format.as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_parser_subtree_from_session() {
        let (mut values, _) = wire_to_session(&build_default_record(LoggerType::EasySerial).unwrap());
        if let TypeConfig::EasySerial(cfg) = &mut values.config {
            cfg.parser.preamble = Some("$".to_string());
            cfg.parser.fields.push(ParsedFieldConfig {
                index: 0,
                name: "sn".to_string(),
                kind: ParsedFieldKind::String,
                format: None,
            });
        }

        let settings = parser_settings_for_test(&values.parser_subtree());
        assert_eq!(settings, values.config.as_easy_serial().unwrap().parser);
        assert_eq!(parser_settings_for_test(&Value::Null), EasySerialParserSettings::default());
    }
}
