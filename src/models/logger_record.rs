//! # 日志器记录模型
//!
//! ## 业务说明
//! 一条日志器记录由公共字段和恰好一个设备专属配置块组成。
//! 内存中配置块是一个带标签的枚举 [`TypeConfig`]，记录的类型由激活的变体决定，
//! 因此"多个配置块同时存在"或"配置块与类型不一致"在类型层面无法表示。
//!
//! ## 线上格式
//! 后端JSON保持扁平结构：`type` 字段加上全部五个配置块键，未激活的块为 `null`。
//! 反序列化时零个块、多个块或块与 `type` 不匹配都会返回序列化错误。

use serde::{Deserialize, Serialize};

use super::enums::LoggerType;
use super::structs::{
    EasySerialConfig, MboxConfig, MboxCounterConfig, ModbusRtuConfig, ModbusTcpConfig,
    SerialPortSettings,
};
use crate::utils::error::AppError;

/// 设备专属配置块
#[derive(Debug, Clone, PartialEq)]
pub enum TypeConfig {
    EasySerial(EasySerialConfig),
    Mbox(MboxConfig),
    MboxCounter(MboxCounterConfig),
    ModbusRtu(ModbusRtuConfig),
    ModbusTcp(ModbusTcpConfig),
}

impl TypeConfig {
    /// 激活变体对应的日志器类型
    pub fn logger_type(&self) -> LoggerType {
        match self {
            TypeConfig::EasySerial(_) => LoggerType::EasySerial,
            TypeConfig::Mbox(_) => LoggerType::Mbox,
            TypeConfig::MboxCounter(_) => LoggerType::MboxCounter,
            TypeConfig::ModbusRtu(_) => LoggerType::ModbusRtu,
            TypeConfig::ModbusTcp(_) => LoggerType::ModbusTcp,
        }
    }

    pub fn as_mbox(&self) -> Option<&MboxConfig> {
        match self {
            TypeConfig::Mbox(cfg) => Some(cfg),
            _ => None,
        }
    }

    pub fn as_mbox_mut(&mut self) -> Option<&mut MboxConfig> {
        match self {
            TypeConfig::Mbox(cfg) => Some(cfg),
            _ => None,
        }
    }

    pub fn as_mbox_counter(&self) -> Option<&MboxCounterConfig> {
        match self {
            TypeConfig::MboxCounter(cfg) => Some(cfg),
            _ => None,
        }
    }

    pub fn as_easy_serial(&self) -> Option<&EasySerialConfig> {
        match self {
            TypeConfig::EasySerial(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// 串口类日志器的串口参数（Modbus TCP 没有串口）
    pub fn serial_port(&self) -> Option<&SerialPortSettings> {
        match self {
            TypeConfig::EasySerial(cfg) => Some(&cfg.port),
            TypeConfig::Mbox(cfg) => Some(&cfg.port),
            TypeConfig::MboxCounter(cfg) => Some(&cfg.port),
            TypeConfig::ModbusRtu(cfg) => Some(&cfg.port),
            TypeConfig::ModbusTcp(_) => None,
        }
    }

    pub fn serial_port_mut(&mut self) -> Option<&mut SerialPortSettings> {
        match self {
            TypeConfig::EasySerial(cfg) => Some(&mut cfg.port),
            TypeConfig::Mbox(cfg) => Some(&mut cfg.port),
            TypeConfig::MboxCounter(cfg) => Some(&mut cfg.port),
            TypeConfig::ModbusRtu(cfg) => Some(&mut cfg.port),
            TypeConfig::ModbusTcp(_) => None,
        }
    }
}

/// 日志器记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "LoggerRecordWire", try_from = "LoggerRecordWire")]
pub struct LoggerRecord {
    /// 后端分配的ID，新建时为 None
    pub id: Option<i64>,
    pub name: String,
    pub autostart: bool,
    /// 数据库写入开关，打开后数据库凭据变为必填
    pub enabled: bool,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub table_name: Option<String>,
    pub query_template: Option<String>,
    pub config: TypeConfig,
}

impl LoggerRecord {
    pub fn logger_type(&self) -> LoggerType {
        self.config.logger_type()
    }
}

/// 后端JSON中的扁平记录结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerRecordWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub logger_type: LoggerType,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub db_password: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub query_template: Option<String>,
    #[serde(default)]
    pub easy_serial: Option<EasySerialConfig>,
    #[serde(default)]
    pub mbox: Option<MboxConfig>,
    #[serde(default)]
    pub mbox_counter: Option<MboxCounterConfig>,
    #[serde(default)]
    pub modbus_rtu: Option<ModbusRtuConfig>,
    #[serde(default)]
    pub modbus_tcp: Option<ModbusTcpConfig>,
}

impl From<LoggerRecord> for LoggerRecordWire {
    fn from(record: LoggerRecord) -> Self {
        let logger_type = record.logger_type();
        let mut wire = LoggerRecordWire {
            id: record.id,
            name: record.name,
            logger_type,
            autostart: record.autostart,
            enabled: record.enabled,
            db_user: record.db_user,
            db_password: record.db_password,
            table_name: record.table_name,
            query_template: record.query_template,
            easy_serial: None,
            mbox: None,
            mbox_counter: None,
            modbus_rtu: None,
            modbus_tcp: None,
        };
        match record.config {
            TypeConfig::EasySerial(cfg) => wire.easy_serial = Some(cfg),
            TypeConfig::Mbox(cfg) => wire.mbox = Some(cfg),
            TypeConfig::MboxCounter(cfg) => wire.mbox_counter = Some(cfg),
            TypeConfig::ModbusRtu(cfg) => wire.modbus_rtu = Some(cfg),
            TypeConfig::ModbusTcp(cfg) => wire.modbus_tcp = Some(cfg),
        }
        wire
    }
}

impl TryFrom<LoggerRecordWire> for LoggerRecord {
    type Error = AppError;

    fn try_from(wire: LoggerRecordWire) -> Result<Self, Self::Error> {
        let present: Vec<LoggerType> = [
            (LoggerType::EasySerial, wire.easy_serial.is_some()),
            (LoggerType::Mbox, wire.mbox.is_some()),
            (LoggerType::MboxCounter, wire.mbox_counter.is_some()),
            (LoggerType::ModbusRtu, wire.modbus_rtu.is_some()),
            (LoggerType::ModbusTcp, wire.modbus_tcp.is_some()),
        ]
        .into_iter()
        .filter_map(|(t, is_present)| is_present.then_some(t))
        .collect();

        if present.len() != 1 {
            return Err(AppError::serialization_error(format!(
                "记录 '{}' 必须恰好包含一个配置块，实际包含 {} 个",
                wire.name,
                present.len()
            )));
        }
        if present[0] != wire.logger_type {
            return Err(AppError::serialization_error(format!(
                "记录 '{}' 的类型为 {}，但配置块为 {}",
                wire.name, wire.logger_type, present[0]
            )));
        }

        let config = match (wire.easy_serial, wire.mbox, wire.mbox_counter, wire.modbus_rtu, wire.modbus_tcp) {
            (Some(cfg), _, _, _, _) => TypeConfig::EasySerial(cfg),
            (_, Some(cfg), _, _, _) => TypeConfig::Mbox(cfg),
            (_, _, Some(cfg), _, _) => TypeConfig::MboxCounter(cfg),
            (_, _, _, Some(cfg), _) => TypeConfig::ModbusRtu(cfg),
            (_, _, _, _, Some(cfg)) => TypeConfig::ModbusTcp(cfg),
            _ => return Err(AppError::serialization_error("缺少配置块")),
        };

        Ok(LoggerRecord {
            id: wire.id,
            name: wire.name,
            autostart: wire.autostart,
            enabled: wire.enabled,
            db_user: wire.db_user,
            db_password: wire.db_password,
            table_name: wire.table_name,
            query_template: wire.query_template,
            config,
        })
    }
}
