//! # 模型枚举类型模块
//!
//! ## 业务作用
//! 本模块定义了日志器配置中使用的各种枚举类型，包括：
//! - **日志器类型**: 决定哪一个设备专属配置块处于激活状态
//! - **串口参数枚举**: 校验位、流控
//! - **MBox业务枚举**: 漏包处理策略
//! - **解析器/寄存器枚举**: Easy Serial 字段类型、Modbus 数值编码
//!
//! ## 设计原则
//! - **类型安全**: 使用强类型枚举避免魔法字符串
//! - **序列化支持**: 序列化结果与后端JSON中的取值保持一致
//! - **字符串转换**: 提供与字符串的双向转换能力

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::utils::error::AppError;

/// 日志器类型
///
/// **业务作用**: 每条日志器记录恰好有一个与之匹配的设备配置块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerType {
    /// 通用串口文本协议
    EasySerial,
    /// MBox 称重设备（支持外部计数器联动）
    Mbox,
    /// MBox 计数器总线
    MboxCounter,
    /// Modbus RTU 轮询
    ModbusRtu,
    /// Modbus TCP 轮询
    ModbusTcp,
}

impl LoggerType {
    /// 所有受支持的类型，顺序即注册表顺序
    pub const ALL: [LoggerType; 5] = [
        LoggerType::EasySerial,
        LoggerType::Mbox,
        LoggerType::MboxCounter,
        LoggerType::ModbusRtu,
        LoggerType::ModbusTcp,
    ];

    /// 后端使用的类型标识
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerType::EasySerial => "easy_serial",
            LoggerType::Mbox => "mbox",
            LoggerType::MboxCounter => "mbox_counter",
            LoggerType::ModbusRtu => "modbus_rtu",
            LoggerType::ModbusTcp => "modbus_tcp",
        }
    }
}

impl Display for LoggerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerType {
    type Err = AppError;

    /// 未知的类型标识属于装配缺陷，返回结构性错误
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoggerType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::structural_error(format!("未知的日志器类型: {}", s)))
    }
}

/// 串口校验位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SerialParity {
    #[default]
    None,
    Even,
    Odd,
    Mark,
    Space,
}

/// 串口流控
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlowControl {
    #[default]
    None,
    #[serde(rename = "RTS/CTS")]
    RtsCts,
    #[serde(rename = "XON/XOFF")]
    XonXoff,
}

/// 漏包处理策略
///
/// - `Last`: 复用最近一次有效数据
/// - `Default`: 使用 miss_default 中配置的值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissStrategy {
    #[default]
    Last,
    Default,
}

impl MissStrategy {
    /// 允许的取值
    pub const VALUES: [&'static str; 2] = ["last", "default"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissStrategy::Last => "last",
            MissStrategy::Default => "default",
        }
    }
}

/// Easy Serial 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParsedFieldKind {
    #[default]
    String,
    Int,
    Float,
    Datetime,
    Date,
    Time,
}

impl ParsedFieldKind {
    /// 日期时间类字段必须配置格式串
    pub fn requires_format(&self) -> bool {
        matches!(self, ParsedFieldKind::Datetime | ParsedFieldKind::Date | ParsedFieldKind::Time)
    }
}

impl FromStr for ParsedFieldKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "string" => Ok(ParsedFieldKind::String),
            "int" => Ok(ParsedFieldKind::Int),
            "float" => Ok(ParsedFieldKind::Float),
            "datetime" => Ok(ParsedFieldKind::Datetime),
            "date" => Ok(ParsedFieldKind::Date),
            "time" => Ok(ParsedFieldKind::Time),
            other => Err(AppError::validation_error(format!("未知的字段类型: {}", other))),
        }
    }
}

/// Modbus 寄存器数值编码
///
/// **字节序**:
/// - ABCD: 大端寄存器顺序
/// - CDAB: 交换寄存器顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModbusValueEncoding {
    #[default]
    U16,
    S16,
    U16Scaled,
    S16Scaled,
    U32Abcd,
    U32Cdab,
    S32Abcd,
    S32Cdab,
    U32ScaledAbcd,
    U32ScaledCdab,
    S32ScaledAbcd,
    S32ScaledCdab,
    F32Abcd,
    F32Cdab,
    F32ScaledAbcd,
    F32ScaledCdab,
}
