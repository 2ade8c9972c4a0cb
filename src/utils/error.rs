use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序统一错误类型
/// 用于封装编辑会话、配置校验和外部协作服务中可能出现的各种错误
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AppError {
    /// 通用错误，包含错误消息
    #[error("通用错误: {message}")]
    Generic { message: String },

    /// 输入/输出错误
    #[error("IO错误: {message} (Kind: {kind})")]
    IoError { message: String, kind: String },

    /// 记录存储相关错误
    #[error("持久化错误: {message}")]
    PersistenceError { message: String },

    /// 数据序列化/反序列化错误
    #[error("序列化错误: {message}")]
    SerializationError { message: String },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    ConfigurationError { message: String },

    /// 验证错误（表单字段校验失败）
    ///
    /// **业务含义**: 字段级别的本地错误，只阻止保存，不会作为全局通知弹出
    #[error("验证错误: {message}")]
    ValidationError { message: String },

    /// 资源未找到错误
    #[error("资源未找到: {resource_type} - {message}")]
    NotFoundError {
        resource_type: String,
        message: String,
    },

    /// 网络/传输相关错误
    #[error("网络错误: {message}")]
    NetworkError { message: String },

    /// 业务逻辑错误（后端拒绝了请求）
    #[error("业务逻辑错误: {message}")]
    BusinessLogicError { message: String },

    /// 冲突错误（例如连接名称重复）
    #[error("冲突: {message}")]
    ConflictError { message: String },

    /// 用户主动取消的操作
    ///
    /// **处理规则**: 静默忽略，不弹通知，不改变校验状态
    #[error("操作已取消: {operation}")]
    Cancelled { operation: String },

    /// 结构性错误（未注册的类型、缺失的必要上下文）
    ///
    /// **业务含义**: 表示装配缺陷而不是可恢复的运行时状况，调用方应视为致命错误
    #[error("结构性错误: {message}")]
    StructuralError { message: String },

    /// JSON序列化/反序列化错误
    #[error("JSON序列化/反序列化错误: {message}")]
    JsonError { message: String },

    /// Mock错误（仅用于测试）
    #[error("Mock错误: {0}")]
    MockError(String),
}

impl AppError {
    /// 创建通用错误
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// 创建IO错误
    pub fn io_error(message: impl Into<String>, kind_str: impl Into<String>) -> Self {
        Self::IoError {
            message: message.into(),
            kind: kind_str.into(),
        }
    }

    /// 创建持久化错误
    pub fn persistence_error(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    /// 创建序列化错误
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found_error(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// 创建网络错误
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// 创建业务逻辑错误
    pub fn business_logic_error(message: impl Into<String>) -> Self {
        Self::BusinessLogicError {
            message: message.into(),
        }
    }

    /// 创建冲突错误
    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    /// 创建取消错误
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// 创建结构性错误
    ///
    /// **使用场景**:
    /// - 查询未注册的日志器类型
    /// - 控制器缺少必要的上下文（例如未挂载就调用操作）
    pub fn structural_error(message: impl Into<String>) -> Self {
        Self::StructuralError {
            message: message.into(),
        }
    }

    /// 创建JSON序列化错误
    pub fn json_error(message: impl Into<String>) -> Self {
        Self::JsonError {
            message: message.into(),
        }
    }

    /// 是否为用户取消
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled { .. })
    }

    /// 是否为致命的结构性错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::StructuralError { .. })
    }

    /// 是否为字段校验错误（不需要全局通知）
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError { .. })
    }

    /// 获取错误的简短描述
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Generic { .. } => "GENERIC",
            AppError::IoError { .. } => "IO_ERROR",
            AppError::PersistenceError { .. } => "PERSISTENCE_ERROR",
            AppError::SerializationError { .. } => "SERIALIZATION_ERROR",
            AppError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::NotFoundError { .. } => "NOT_FOUND_ERROR",
            AppError::NetworkError { .. } => "NETWORK_ERROR",
            AppError::BusinessLogicError { .. } => "BUSINESS_LOGIC_ERROR",
            AppError::ConflictError { .. } => "CONFLICT_ERROR",
            AppError::Cancelled { .. } => "CANCELLED",
            AppError::StructuralError { .. } => "STRUCTURAL_ERROR",
            AppError::JsonError { .. } => "JSON_ERROR",
            AppError::MockError(..) => "MOCK_ERROR",
        }
    }
}

/// 标准 I/O 错误到 AppError 的转换
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError { message: err.to_string(), kind: format!("{:?}", err.kind()) }
    }
}

/// serde_json 错误到 AppError 的转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError { message: err.to_string() }
    }
}

/// config crate 错误到 AppError 的转换
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigurationError { message: err.to_string() }
    }
}

/// 字符串错误到 AppError 的转换（通用错误）
impl From<String> for AppError {
    fn from(err_msg: String) -> Self {
        Self::Generic { message: err_msg }
    }
}

/// &str 错误到 AppError 的转换（通用错误）
impl From<&str> for AppError {
    fn from(err_msg: &str) -> Self {
        Self::Generic { message: err_msg.to_string() }
    }
}

/// 应用程序结果类型别名
/// 简化错误处理的类型定义
pub type AppResult<T> = Result<T, AppError>;
