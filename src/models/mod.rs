/// 核心枚举定义模块
pub mod enums;
/// 设备专属配置块模块
pub mod structs;
/// 日志器记录（线上格式转换）模块
pub mod logger_record;
/// 编辑会话值模型模块
pub mod form_values;
/// 计数器与串口选项模块
pub mod counters;

// 重新导出所有类型，方便其他模块使用
pub use counters::*;
pub use enums::*;
pub use form_values::*;
pub use logger_record::*;
pub use structs::*;
