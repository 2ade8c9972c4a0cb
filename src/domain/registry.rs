//! # 日志器类型注册表
//!
//! ## 业务说明
//! 注册表是所有受支持日志器类型的唯一来源。每个类型对应一个描述符，包含：
//! - 类型标识与显示名称
//! - 默认配置块工厂
//! - 关联的编辑器种类
//! - 类型专属的校验规则工厂
//! - 可选的预置查询模板（目前只有 MBox 有）
//!
//! 新增一种类型只需定义其配置结构并添加一个描述符，其他类型的代码无需改动。
//!
//! ## 默认记录
//! [`build_default_record`] 生成的记录：公共字段取默认值，
//! 只有所选类型的配置块存在。

use once_cell::sync::Lazy;

use crate::domain::validation::{rules, FieldRule};
use crate::models::{
    EasySerialConfig, LoggerRecord, LoggerType, MboxConfig, MboxCounterConfig, ModbusRtuConfig,
    ModbusTcpConfig, TypeConfig,
};
use crate::utils::error::{AppError, AppResult};

/// MBox 写库的预置查询模板
pub const MBOX_QUERY_TEMPLATE: &str = "INSERT INTO storehouse_view VALUES (DEFAULT, DEFAULT, DEFAULT, {mbox_id}, {on_error}, NULL, \
{created_at}, {fish_name}, {fish_grade}, {lot}, {n_weight}, {r_weight}, {sn}, {error_info}, {tare})";

/// 类型关联的编辑器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// 串口文本解析器编辑器
    SerialParser,
    /// 称重设备编辑器（含外部计数器配对）
    WeighingScale,
    /// 计数器总线设备列表编辑器
    CounterBus,
    /// Modbus 从站/寄存器编辑器（RTU 与 TCP 共用）
    ModbusRegisters,
}

/// 类型描述符
#[derive(Clone)]
pub struct LoggerTypeDescriptor {
    pub logger_type: LoggerType,
    pub label: &'static str,
    pub editor: EditorKind,
    pub default_config: fn() -> TypeConfig,
    pub rules: fn() -> Vec<FieldRule>,
    /// 新建该类型记录时预置的查询模板
    pub default_query_template: Option<&'static str>,
}

impl std::fmt::Debug for LoggerTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerTypeDescriptor")
            .field("logger_type", &self.logger_type)
            .field("label", &self.label)
            .field("editor", &self.editor)
            .finish()
    }
}

/// 日志器类型注册表
#[derive(Debug, Clone)]
pub struct LoggerTypeRegistry {
    descriptors: Vec<LoggerTypeDescriptor>,
}

static GLOBAL_REGISTRY: Lazy<LoggerTypeRegistry> = Lazy::new(LoggerTypeRegistry::builtin);

impl LoggerTypeRegistry {
    /// 使用给定描述符创建注册表
    pub fn new(descriptors: Vec<LoggerTypeDescriptor>) -> Self {
        Self { descriptors }
    }

    /// 内置的五种类型
    pub fn builtin() -> Self {
        Self::new(vec![
            LoggerTypeDescriptor {
                logger_type: LoggerType::EasySerial,
                label: "Easy Serial",
                editor: EditorKind::SerialParser,
                default_config: || TypeConfig::EasySerial(EasySerialConfig::default()),
                rules: rules::easy_serial_rules,
                default_query_template: None,
            },
            LoggerTypeDescriptor {
                logger_type: LoggerType::Mbox,
                label: "MBox",
                editor: EditorKind::WeighingScale,
                default_config: || TypeConfig::Mbox(MboxConfig::default()),
                rules: rules::mbox_rules,
                default_query_template: Some(MBOX_QUERY_TEMPLATE),
            },
            LoggerTypeDescriptor {
                logger_type: LoggerType::MboxCounter,
                label: "MBox 计数器",
                editor: EditorKind::CounterBus,
                default_config: || TypeConfig::MboxCounter(MboxCounterConfig::default()),
                rules: rules::mbox_counter_rules,
                default_query_template: None,
            },
            LoggerTypeDescriptor {
                logger_type: LoggerType::ModbusRtu,
                label: "Modbus RTU",
                editor: EditorKind::ModbusRegisters,
                default_config: || TypeConfig::ModbusRtu(ModbusRtuConfig::default()),
                rules: rules::modbus_rtu_rules,
                default_query_template: None,
            },
            LoggerTypeDescriptor {
                logger_type: LoggerType::ModbusTcp,
                label: "Modbus TCP",
                editor: EditorKind::ModbusRegisters,
                default_config: || TypeConfig::ModbusTcp(ModbusTcpConfig::default()),
                rules: rules::modbus_tcp_rules,
                default_query_template: None,
            },
        ])
    }

    /// 进程级共享注册表
    pub fn global() -> &'static LoggerTypeRegistry {
        &GLOBAL_REGISTRY
    }

    /// 按注册顺序返回所有描述符
    pub fn descriptors(&self) -> &[LoggerTypeDescriptor] {
        &self.descriptors
    }

    /// 查询类型描述符，未注册时返回结构性错误
    pub fn descriptor(&self, logger_type: LoggerType) -> AppResult<&LoggerTypeDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.logger_type == logger_type)
            .ok_or_else(|| {
                log::error!("查询了未注册的日志器类型: {}", logger_type);
                AppError::structural_error(format!("日志器类型未注册: {}", logger_type))
            })
    }

    /// 按类型标识字符串查询
    pub fn descriptor_by_id(&self, type_id: &str) -> AppResult<&LoggerTypeDescriptor> {
        let logger_type: LoggerType = type_id.parse()?;
        self.descriptor(logger_type)
    }

    /// 构建某类型的默认记录
    pub fn build_default_record(&self, logger_type: LoggerType) -> AppResult<LoggerRecord> {
        let descriptor = self.descriptor(logger_type)?;
        Ok(LoggerRecord {
            id: None,
            name: String::new(),
            autostart: false,
            enabled: false,
            db_user: None,
            db_password: None,
            table_name: None,
            query_template: descriptor.default_query_template.map(str::to_string),
            config: (descriptor.default_config)(),
        })
    }
}

/// 使用共享注册表构建默认记录
pub fn build_default_record(logger_type: LoggerType) -> AppResult<LoggerRecord> {
    LoggerTypeRegistry::global().build_default_record(logger_type)
}
