//! 日志配置模块
//!
//! 基于 env_logger 初始化全局日志，并提供敏感信息脱敏

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use chrono::Local;

use crate::utils::config::LoggingConfig;
use crate::utils::error::{AppError, AppResult};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(AppError::configuration_error(format!("无效的日志级别: {}", other))),
        }
    }
}

/// 核心问题日志分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreLogCategory {
    /// 与后端协作服务交互失败
    CommunicationFailure,
    /// 草稿存储事件
    DraftPersistence,
    /// 用户配置和连接操作信息
    UserOperations,
    /// 配置警告
    ConfigWarning,
}

impl std::fmt::Display for CoreLogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let category_name = match self {
            CoreLogCategory::CommunicationFailure => "通讯失败",
            CoreLogCategory::DraftPersistence => "草稿存储",
            CoreLogCategory::UserOperations => "用户操作",
            CoreLogCategory::ConfigWarning => "配置警告",
        };
        write!(f, "{}", category_name)
    }
}

/// 初始化全局日志
///
/// 重复初始化（例如多个测试）不会报错，只保留第一次的设置
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let level: LogLevel = config.log_level.parse()?;

    let mut builder = env_logger::Builder::from_default_env();
    builder
        .filter_level(level.into())
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    if !config.console_output {
        builder.target(env_logger::Target::Pipe(Box::new(std::io::sink())));
    }

    if builder.try_init().is_err() {
        log::debug!("日志系统已初始化，跳过重复初始化");
    }
    Ok(())
}

/// 对日志中的敏感值进行脱敏
///
/// 空值原样返回，其他值只保留首字符
pub fn mask_secret(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => format!("{}{}", first, "*".repeat(chars.count().max(3))),
    }
}
