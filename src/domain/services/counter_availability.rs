use super::*;
use crate::models::AvailableCounter;

/// 可用计数器来源接口
///
/// 返回尚未被任何 MBox 记录绑定的计数器设备，顺序由服务端决定
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ICounterAvailabilitySource: Send + Sync {
    async fn list_available(&self) -> AppResult<Vec<AvailableCounter>>;
}
