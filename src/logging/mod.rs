//! # 日志记录模块 (Logging Module)
//!
//! ## 业务说明
//! 记录编辑会话中的用户操作、草稿写入、与后端协作服务的交互失败等信息
//!
//! ## 日志策略
//! - **用户操作**: 类型切换、保存、删除等
//! - **通讯失败**: 记录存储、计数器列表、解析测试等协作服务出错
//! - **草稿存储**: 防抖写入与丢弃
//! - **配置警告**: 与装配或配置相关的可疑情况

pub mod logger_config;

pub use logger_config::*;

/// 记录通讯失败日志
#[macro_export]
macro_rules! log_communication_failure {
    ($msg:expr) => {
        log::error!("[{}] {}", $crate::logging::CoreLogCategory::CommunicationFailure, $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::error!("[{}] {}", $crate::logging::CoreLogCategory::CommunicationFailure, format!($msg, $($arg)*));
    };
}

/// 记录用户操作日志
#[macro_export]
macro_rules! log_user_operation {
    ($msg:expr) => {
        log::info!("[{}] {}", $crate::logging::CoreLogCategory::UserOperations, $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::info!("[{}] {}", $crate::logging::CoreLogCategory::UserOperations, format!($msg, $($arg)*));
    };
}

/// 记录草稿存储日志
#[macro_export]
macro_rules! log_draft_event {
    ($msg:expr) => {
        log::debug!("[{}] {}", $crate::logging::CoreLogCategory::DraftPersistence, $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::debug!("[{}] {}", $crate::logging::CoreLogCategory::DraftPersistence, format!($msg, $($arg)*));
    };
}

/// 记录用户配置操作警告
#[macro_export]
macro_rules! log_config_warning {
    ($msg:expr) => {
        log::warn!("[{}] {}", $crate::logging::CoreLogCategory::ConfigWarning, $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::warn!("[{}] {}", $crate::logging::CoreLogCategory::ConfigWarning, format!($msg, $($arg)*));
    };
}

// 重新导出宏
pub use crate::log_communication_failure;
pub use crate::log_user_operation;
pub use crate::log_draft_event;
pub use crate::log_config_warning;
