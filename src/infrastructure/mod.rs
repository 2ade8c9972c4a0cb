//! 基础设施层模块
//!
//! 包含领域服务接口的本地实现：JSON文件记录存储和基于记录存储的可用计数器来源

pub mod json_record_store;
pub mod local_counter_availability;

// 重新导出基础设施组件
pub use json_record_store::JsonRecordStore;
pub use local_counter_availability::LocalCounterAvailability;
