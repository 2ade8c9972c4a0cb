use super::*;
use crate::models::LoggerRecord;

/// 日志器记录存储接口
///
/// 负责记录的列表、新建、更新和删除。
/// 编辑会话控制器会缓存 `list()` 的结果，协调器用它判断计数器配对是否属于当前记录。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IRecordStore: Send + Sync {
    /// 列出所有记录（保持存储顺序）
    async fn list(&self) -> AppResult<Vec<LoggerRecord>>;

    /// 新建记录
    ///
    /// # 返回
    /// * `LoggerRecord` - 已分配ID的记录
    async fn create(&self, record: LoggerRecord) -> AppResult<LoggerRecord>;

    /// 更新记录
    ///
    /// # 参数
    /// * `id` - 记录ID
    /// * `record` - 新的记录内容
    async fn update(&self, id: i64, record: LoggerRecord) -> AppResult<LoggerRecord>;

    /// 删除记录
    async fn delete(&self, id: i64) -> AppResult<()>;
}
