/// 错误处理模块
///
/// 业务说明：
/// 本模块是应用程序错误处理的统一入口点
/// 通过重新导出utils::error中的所有错误类型，简化了错误类型的导入路径
///
/// 使用示例：
/// ```rust
/// use logger_editor_lib::error::{AppError, AppResult};
///
/// fn some_function() -> AppResult<String> {
///     Ok("success".to_string())
/// }
/// ```
pub use crate::utils::error::*;
