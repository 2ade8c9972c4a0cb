/// 领域服务接口定义模块
///
/// 业务说明：
/// 本模块定义了编辑会话所依赖的外部协作者的trait接口
/// 接口描述能力，不包含具体实现；实现位于基础设施层或由宿主程序提供
///
/// 架构设计：
/// - 接口定义在领域层，实现在基础设施层
/// - 控制器通过 `Arc<dyn Trait>` 注入具体实现
/// - 支持多种实现方式（JSON文件实现、Mock实现等）

/// 日志器记录存储
///
/// 业务说明：记录的列表、新建、更新、删除
pub mod record_store;

/// 可用计数器来源
///
/// 业务说明：列出可供 MBox 记录绑定的计数器设备
pub mod counter_availability;

/// 解析器测试
///
/// 业务说明：用当前解析器设置试解析一段原始文本
pub mod parser_tester;

/// 串口发现
pub mod serial_port_discovery;

/// 临时通知
pub mod notifier;

/// Mock实现（集成测试使用）
pub mod mocks;

pub use counter_availability::*;
pub use notifier::*;
pub use parser_tester::*;
pub use record_store::*;
pub use serial_port_discovery::*;

use crate::utils::error::AppResult;
use async_trait::async_trait;

/// 基础服务trait，基础设施服务实现
///
/// 业务说明：
/// 定义了服务的生命周期管理能力
/// 宿主程序在启动时初始化，退出前关闭
#[async_trait]
pub trait BaseService: Send + Sync {
    /// 服务名称，用于日志记录
    fn service_name(&self) -> &'static str;

    /// 初始化服务
    ///
    /// 业务说明：
    /// 在服务启动时调用，执行必要的准备工作（例如创建数据目录）
    async fn initialize(&mut self) -> AppResult<()>;

    /// 关闭服务
    async fn shutdown(&mut self) -> AppResult<()>;

    /// 健康检查
    ///
    /// 业务说明：
    /// 检查服务当前是否可用，例如存储文件是否可读且格式正确
    async fn health_check(&self) -> AppResult<()>;
}
