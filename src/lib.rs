//! 日志器连接配置编辑器 - 核心库
//!
//! 分层结构：
//! - `models`: 线上记录、表单值、计数器等数据模型
//! - `domain`: 类型注册表、表单映射、校验规则、计数器协调以及协作者接口
//! - `application`: 编辑会话、草稿存储与会话控制器
//! - `infrastructure`: JSON文件记录存储与本地可用计数器来源

pub mod utils;
pub mod error;
pub mod logging;
pub mod models;
pub mod domain;
pub mod application;
pub mod infrastructure;

// 重新导出常用类型，方便使用
pub use models::*;
pub use utils::{AppError, AppResult, AppConfig};
pub use application::{DraftStore, EditSession, EditSessionController, LoadingFlags, PendingDelete, SessionControllerDeps};
pub use domain::{build_default_record, EditorKind, LoggerTypeRegistry};
pub use infrastructure::{JsonRecordStore, LocalCounterAvailability};
