//! # 编辑会话
//!
//! 同一时刻只有一个规范的编辑会话。会话持有表单值、字段错误、脏标记、
//! 正在编辑的记录ID，以及计数器协调产生的合成"使用中"选项。

use crate::domain::form_mapper::{session_to_wire, wire_to_session};
use crate::domain::registry::LoggerTypeRegistry;
use crate::domain::validation::validate_form;
use crate::models::{
    CounterOption, EditSessionSnapshot, FieldErrors, FormValues, LoggerRecord, LoggerType,
};
use crate::utils::error::AppResult;

/// 类型切换时保留的公共字段
pub const PRESERVED_ON_TYPE_SWITCH: [&str; 6] =
    ["name", "db_user", "db_password", "table_name", "autostart", "enabled"];

/// 编辑会话
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub values: FormValues,
    pub errors: FieldErrors,
    pub editing_id: Option<i64>,
    pub dirty: bool,
    /// 本会话专属的合成计数器选项
    pub counter_synthetic: Option<CounterOption>,
}

impl EditSession {
    /// 某类型的全新会话
    pub fn fresh(registry: &LoggerTypeRegistry, logger_type: LoggerType) -> AppResult<Self> {
        let (values, _) = wire_to_session(&registry.build_default_record(logger_type)?);
        Ok(Self {
            values,
            errors: FieldErrors::new(),
            editing_id: None,
            dirty: false,
            counter_synthetic: None,
        })
    }

    /// 从已保存记录加载
    pub fn from_record(record: &LoggerRecord) -> Self {
        let (values, editing_id) = wire_to_session(record);
        Self {
            values,
            errors: FieldErrors::new(),
            editing_id,
            dirty: false,
            counter_synthetic: None,
        }
    }

    /// 从草稿快照恢复
    pub fn from_snapshot(snapshot: EditSessionSnapshot) -> Self {
        Self {
            values: snapshot.values,
            errors: snapshot.errors,
            editing_id: snapshot.editing_id,
            dirty: snapshot.dirty,
            counter_synthetic: None,
        }
    }

    /// 草稿快照
    pub fn snapshot(&self) -> EditSessionSnapshot {
        EditSessionSnapshot {
            values: self.values.clone(),
            errors: self.errors.clone(),
            editing_id: self.editing_id,
            dirty: self.dirty,
        }
    }

    pub fn logger_type(&self) -> LoggerType {
        self.values.logger_type()
    }

    /// 重新计算字段错误
    pub fn revalidate(&mut self, registry: &LoggerTypeRegistry) -> AppResult<()> {
        self.errors = validate_form(&self.values, registry)?;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 会话对应的线上记录
    pub fn to_record(&self) -> LoggerRecord {
        session_to_wire(&self.values, self.editing_id)
    }

    /// 切换类型
    ///
    /// 以新类型的默认值整体替换会话，只保留名称、数据库凭据、表名、
    /// 自动启动和写库开关；查询模板取新类型的预置值。编辑中的记录ID保持不变。
    pub fn switch_type(&mut self, registry: &LoggerTypeRegistry, logger_type: LoggerType) -> AppResult<()> {
        let (defaults, _) = wire_to_session(&registry.build_default_record(logger_type)?);
        let previous = &self.values;

        let values = FormValues {
            name: previous.name.clone(),
            db_user: previous.db_user.clone(),
            db_password: previous.db_password.clone(),
            table_name: previous.table_name.clone(),
            autostart: previous.autostart,
            enabled: previous.enabled,
            ..defaults
        };

        *self = Self {
            values,
            errors: FieldErrors::new(),
            editing_id: self.editing_id,
            dirty: true,
            counter_synthetic: None,
        };
        self.revalidate(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::MBOX_QUERY_TEMPLATE;
    use crate::models::TypeConfig;

    #[test]
    fn test_switch_type_preserves_common_subset() {
        let registry = LoggerTypeRegistry::global();
        let mut session = EditSession::fresh(registry, LoggerType::EasySerial).unwrap();
        session.editing_id = Some(3);
        session.values.name = "Line 1".to_string();
        session.values.db_user = "writer".to_string();
        session.values.db_password = "pw".to_string();
        session.values.table_name = "weights".to_string();
        session.values.autostart = true;
        session.values.enabled = true;
        if let TypeConfig::EasySerial(cfg) = &mut session.values.config {
            cfg.port.port = "COM9".to_string();
        }

        for target in [LoggerType::Mbox, LoggerType::ModbusTcp, LoggerType::EasySerial] {
            session.switch_type(registry, target).unwrap();
            let v = &session.values;
            assert_eq!(v.name, "Line 1");
            assert_eq!(v.db_user, "writer");
            assert_eq!(v.db_password, "pw");
            assert_eq!(v.table_name, "weights");
            assert!(v.autostart);
            assert!(v.enabled);
            assert_eq!(v.logger_type(), target);
            assert_eq!(session.editing_id, Some(3));
            assert!(session.dirty);
        }

        // 切回原类型后设备配置为默认值
        assert_eq!(session.values.config.serial_port().unwrap().port, "");
    }

    #[test]
    fn test_switch_type_applies_query_template_rule() {
        let registry = LoggerTypeRegistry::global();
        let mut session = EditSession::fresh(registry, LoggerType::EasySerial).unwrap();
        session.values.query_template = "INSERT INTO t VALUES ({a})".to_string();

        session.switch_type(registry, LoggerType::Mbox).unwrap();
        assert_eq!(session.values.query_template, MBOX_QUERY_TEMPLATE);

        session.switch_type(registry, LoggerType::MboxCounter).unwrap();
        assert_eq!(session.values.query_template, "");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let registry = LoggerTypeRegistry::global();
        let mut session = EditSession::fresh(registry, LoggerType::Mbox).unwrap();
        session.values.name = "Scale".to_string();
        session.revalidate(registry).unwrap();

        let restored = EditSession::from_snapshot(session.snapshot());
        assert_eq!(restored.values, session.values);
        assert_eq!(restored.errors, session.errors);
    }
}
