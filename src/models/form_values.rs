//! # 编辑会话模型
//!
//! `FormValues` 是编辑界面绑定的值模型。与线上记录的区别只有一点：
//! 四个可空字符串字段在会话中总是字符串，空串作为"未填写"的占位。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::LoggerType;
use super::logger_record::TypeConfig;

/// 表单值
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub name: String,
    pub autostart: bool,
    pub enabled: bool,
    pub db_user: String,
    pub db_password: String,
    pub table_name: String,
    pub query_template: String,
    pub config: TypeConfig,
}

impl FormValues {
    pub fn logger_type(&self) -> LoggerType {
        self.config.logger_type()
    }

    /// 解析器测试使用的设置子树
    ///
    /// 非 Easy Serial 类型返回 `Value::Null`
    pub fn parser_subtree(&self) -> serde_json::Value {
        match self.config.as_easy_serial() {
            Some(cfg) => serde_json::to_value(&cfg.parser).unwrap_or(serde_json::Value::Null),
            None => serde_json::Value::Null,
        }
    }
}

/// 字段错误表：字段路径 → 错误消息
pub type FieldErrors = BTreeMap<String, String>;

/// 编辑会话快照（草稿存储的内容）
#[derive(Debug, Clone, PartialEq)]
pub struct EditSessionSnapshot {
    pub values: FormValues,
    pub errors: FieldErrors,
    /// 正在编辑的已保存记录ID，新建时为 None
    pub editing_id: Option<i64>,
    pub dirty: bool,
}

impl EditSessionSnapshot {
    /// 会话是否有效（没有任何字段错误）
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 解析器测试结果中的单个字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFieldValue {
    pub name: String,
    pub value: serde_json::Value,
}

/// 解析器测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParserTestOutcome {
    pub fields: Vec<ParsedFieldValue>,
}
