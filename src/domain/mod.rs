//! 领域层模块
//!
//! 包含日志器类型注册表、表单映射、校验规则引擎、计数器配对协调
//! 以及外部协作者的服务接口定义。除服务接口外均为纯函数，不依赖运行时。

pub mod counter_reconciler;
pub mod form_mapper;
pub mod port_options;
pub mod query_template;
pub mod registry;
pub mod services;
pub mod validation;

// 重新导出常用入口
pub use form_mapper::{parser_settings_for_test, session_to_wire, wire_to_session};
pub use registry::{build_default_record, EditorKind, LoggerTypeDescriptor, LoggerTypeRegistry};
pub use services::*;
